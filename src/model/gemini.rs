use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ModelProvider, ModelRequest};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 2;

/// Client for Google's Gemini generateContent endpoint.
///
/// Authentication is a `?key=` query parameter rather than a bearer header,
/// and content lives in a `contents[]` array with nested `parts`. Requests
/// are sent with temperature 0 and no output-token cap; transient failures
/// (transport errors, 429, 5xx) are retried up to [`MAX_RETRIES`] times.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: None,
            },
        };

        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if let Err(error) = response.error_for_status_ref() {
            if retryable_status(status) {
                // Keep the typed reqwest error so the retry loop can
                // classify it by status.
                return Err(error.into());
            }
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            anyhow::bail!("Gemini API error ({status}): {message}");
        }

        let response = response.json::<GenerateContentResponse>().await?;
        extract_text(response)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidate text"))
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn complete(&self, request: ModelRequest) -> anyhow::Result<String> {
        let mut attempt = 0;
        loop {
            match self.generate(&request.prompt).await {
                Ok(text) => {
                    debug!(model = %self.model, chars = text.len(), "Gemini response received");
                    return Ok(text);
                }
                Err(error) if attempt < MAX_RETRIES && is_transient(&error) => {
                    attempt += 1;
                    warn!(attempt, %error, "transient Gemini failure, retrying");
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .and_then(|part| part.text)
}

fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(error: &anyhow::Error) -> bool {
    let Some(error) = error.downcast_ref::<reqwest::Error>() else {
        return false;
    };
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    error.status().is_some_and(retryable_status)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}
