use std::process::ExitCode;

use chat_moderator::{config::AppConfig, validator};
use clap::Parser;

/// Checks which Gemini model the configured GOOGLE_API_KEY can reach.
#[derive(Debug, Parser)]
#[command(name = "validate_key")]
struct Args {}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _args = Args::parse();

    let config = AppConfig::from_env();
    let Some(api_key) = config.google_api_key else {
        println!("GOOGLE_API_KEY environment variable not set");
        println!("Usage: GOOGLE_API_KEY=your_key validate_key");
        return ExitCode::FAILURE;
    };

    println!(
        "Testing API key: {}...",
        validator::truncate_chars(&api_key, 10)
    );

    match validator::find_working_model(&api_key, &config.candidate_models).await {
        Some(model) => {
            println!();
            println!("SUCCESS! Use model: {model}");
            println!("Set GEMINI_MODEL={model} to use it for moderation.");
        }
        None => {
            println!();
            println!("FAILED! Your API key is invalid or has no access to Gemini models");
            println!("Get a new API key from: https://aistudio.google.com/apikey");
        }
    }

    ExitCode::SUCCESS
}
