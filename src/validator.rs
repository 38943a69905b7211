use crate::model::{GeminiProvider, ModelProvider, ModelRequest};

const PROBE_PROMPT: &str = "Say 'Hello'";

/// Tries each candidate model in order against the given key and returns the
/// first one that answers. Progress goes to stdout; this is a diagnostic for
/// humans, not part of the moderation path.
pub async fn find_working_model(api_key: &str, candidates: &[String]) -> Option<String> {
    for model in candidates {
        println!("Trying model: {model}");
        match probe_model(api_key, model).await {
            Ok(reply) => {
                println!("Model {model} works! Response: {}", truncate_chars(&reply, 100));
                return Some(model.clone());
            }
            Err(error) => {
                println!(
                    "Model {model} failed: {}...",
                    truncate_chars(&error.to_string(), 100)
                );
            }
        }
    }

    println!("No models worked with this API key");
    None
}

async fn probe_model(api_key: &str, model: &str) -> anyhow::Result<String> {
    let provider = GeminiProvider::new(api_key.to_owned(), model.to_owned())?;
    provider
        .complete(ModelRequest {
            prompt: PROBE_PROMPT.to_owned(),
        })
        .await
}

/// Truncates on a character boundary so multi-byte input cannot panic.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
