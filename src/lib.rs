pub mod config;
pub mod model;
pub mod moderation;
pub mod validator;
