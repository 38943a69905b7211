use std::process::ExitCode;
use std::sync::Arc;

use chat_moderator::{
    config::AppConfig,
    model::GeminiProvider,
    moderation::{Action, ModerationResult, Moderator},
    validator::truncate_chars,
};
use clap::Parser;
use tracing::{error, info};

/// Classifies a chat message for personal information disclosure.
#[derive(Debug, Parser)]
#[command(name = "chat-moderator")]
struct Args {
    /// The message to moderate
    message: String,

    /// User ID for logging (optional)
    #[arg(long)]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!(
        message = %truncate_chars(&args.message, 50),
        user_id = ?args.user_id,
        "starting chat moderator"
    );

    let config = AppConfig::from_env();
    let Some(api_key) = config.google_api_key else {
        error!("GOOGLE_API_KEY environment variable not set");
        emit(&setup_failure(
            "API key missing",
            "GOOGLE_API_KEY environment variable not set",
            args.user_id,
        ));
        return ExitCode::FAILURE;
    };

    let provider = match GeminiProvider::new(api_key, config.model) {
        Ok(provider) => provider,
        Err(init_error) => {
            error!(error = %init_error, "failed to initialize Gemini client");
            emit(&setup_failure(
                "API initialization failed",
                &format!("Failed to initialize Gemini API: {init_error}"),
                args.user_id,
            ));
            return ExitCode::FAILURE;
        }
    };

    info!(model = provider.model(), "Gemini client initialized");

    let moderator = Moderator::new(Arc::new(provider));
    let result = moderator
        .moderate(&args.message, args.user_id.as_deref())
        .await;

    emit(&result);
    ExitCode::SUCCESS
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn setup_failure(reason: &str, error: &str, user_id: Option<String>) -> ModerationResult {
    ModerationResult {
        action: Action::Allow,
        reason: reason.to_owned(),
        message_length: None,
        user_id,
        error: Some(error.to_owned()),
    }
}

/// stdout carries exactly one JSON line per invocation; everything else
/// belongs on stderr.
fn emit(result: &ModerationResult) {
    match serde_json::to_string(result) {
        Ok(line) => println!("{line}"),
        Err(serialize_error) => error!(error = %serialize_error, "failed to serialize result"),
    }
}
