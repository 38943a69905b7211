use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{ModelProvider, ModelRequest};

/// Moderation decision for a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Allow,
    Warn,
    Stop,
}

impl Action {
    /// Coerces raw model output into an action. The response is trimmed and
    /// upper-cased first; anything outside the three-token vocabulary falls
    /// back to ALLOW so that ambiguous output never blocks a message.
    pub fn from_model_output(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "STOP" => Action::Stop,
            "WARN" => Action::Warn,
            "ALLOW" => Action::Allow,
            other => {
                warn!(output = %other, "invalid action from model, defaulting to ALLOW");
                Action::Allow
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Warn => "WARN",
            Action::Stop => "STOP",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Action::Stop => "Personal information detected in message",
            Action::Warn => "Request for personal information detected",
            Action::Allow => "Message is appropriate",
        }
    }
}

/// The single JSON object the moderator prints on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub action: Action,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Moderator {
    model: Arc<dyn ModelProvider>,
}

impl Moderator {
    pub fn new(model: Arc<dyn ModelProvider>) -> Self {
        Self { model }
    }

    /// Classifies one message. Never returns an error: any failure in the
    /// classification call is absorbed into an ALLOW result, with the error
    /// text carried in `reason` and `error`.
    pub async fn moderate(&self, message: &str, user_id: Option<&str>) -> ModerationResult {
        let mut result = match self.classify(message).await {
            Ok(action) => {
                info!(action = action.as_str(), "moderation complete");
                ModerationResult {
                    action,
                    reason: action.reason().to_owned(),
                    message_length: Some(message.chars().count()),
                    user_id: None,
                    error: None,
                }
            }
            Err(error) => {
                warn!(%error, "moderation failed, allowing message");
                ModerationResult {
                    action: Action::Allow,
                    reason: format!("Moderation failed: {error}"),
                    message_length: None,
                    user_id: None,
                    error: Some(error.to_string()),
                }
            }
        };

        result.user_id = user_id.map(str::to_owned);
        result
    }

    async fn classify(&self, message: &str) -> anyhow::Result<Action> {
        let prompt = render_prompt(message);
        debug!(message_chars = message.chars().count(), "calling classification model");
        let raw = self.model.complete(ModelRequest { prompt }).await?;
        debug!(raw = %raw, "raw model response");
        Ok(Action::from_model_output(&raw))
    }
}

/// Renders the fixed classification prompt with the message embedded
/// verbatim. The wording and the ten worked examples define the policy; the
/// examples carry more weight with the model than the instruction text, so
/// edits here change classification behavior.
fn render_prompt(message: &str) -> String {
    format!(
        r#"
You are a chatbot moderator identifying if a message contains personal information or a request for it.
If a message contains information like a name, phone number, address, or specific location, return "STOP".
If it contains a request asking for any personal information, including things like "Where should I deliver the package?" or "What's your address?", return "WARN".
Otherwise, return "ALLOW".

Message: "{message}"

Example Responses:
1. Message: "My address is 123 Maple St." -> STOP
2. Message: "Can I have your phone number?" -> WARN
3. Message: "Where should I deliver the package?" -> WARN
4. Message: "The meeting is at the office." -> ALLOW
5. Message: "What's your email?" -> WARN
6. Message: "My phone is 555-1234" -> STOP
7. Message: "I live on Main Street" -> STOP
8. Message: "Let's meet at the coffee shop" -> ALLOW
9. Message: "Can you send me your home address?" -> WARN
10. Message: "I'm John Smith" -> STOP

Respond with only: ALLOW, WARN, or STOP
"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::model::{MockModelProvider, ModelProvider, ModelRequest};

    use super::{Action, ModerationResult, Moderator, render_prompt};

    struct FailingModelProvider;

    #[async_trait]
    impl ModelProvider for FailingModelProvider {
        async fn complete(&self, _request: ModelRequest) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("connection reset by peer"))
        }
    }

    fn moderator_replying(reply: &str) -> Moderator {
        Moderator::new(Arc::new(MockModelProvider::replying(reply)))
    }

    #[tokio::test]
    async fn maps_stop_reply_to_stop_result() {
        let result = moderator_replying("STOP")
            .moderate("My phone number is 555-1234", None)
            .await;

        assert_eq!(result.action, Action::Stop);
        assert_eq!(result.reason, "Personal information detected in message");
        assert_eq!(result.message_length, Some(27));
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn normalizes_whitespace_and_case() {
        let result = moderator_replying(" stop \n").moderate("msg", None).await;
        assert_eq!(result.action, Action::Stop);

        let result = moderator_replying("warn").moderate("msg", None).await;
        assert_eq!(result.action, Action::Warn);
    }

    #[tokio::test]
    async fn out_of_vocabulary_reply_coerces_to_allow() {
        for reply in ["", "MAYBE", "STOP.", "I think this is ALLOW", "stop warn"] {
            let result = moderator_replying(reply).moderate("msg", None).await;
            assert_eq!(result.action, Action::Allow, "reply {reply:?}");
            assert_eq!(result.reason, "Message is appropriate");
        }
    }

    #[tokio::test]
    async fn provider_error_fails_open() {
        let moderator = Moderator::new(Arc::new(FailingModelProvider));
        let result = moderator.moderate("My address is 123 Main St", None).await;

        assert_eq!(result.action, Action::Allow);
        assert_eq!(result.reason, "Moderation failed: connection reset by peer");
        assert_eq!(result.error.as_deref(), Some("connection reset by peer"));
        assert_eq!(result.message_length, None);
    }

    #[tokio::test]
    async fn echoes_user_id_when_supplied() {
        let result = moderator_replying("ALLOW")
            .moderate("hello", Some("user-42"))
            .await;
        assert_eq!(result.user_id.as_deref(), Some("user-42"));

        let result = moderator_replying("ALLOW").moderate("hello", None).await;
        assert_eq!(result.user_id, None);
    }

    #[tokio::test]
    async fn message_length_counts_characters_not_bytes() {
        let result = moderator_replying("ALLOW").moderate("héllo", None).await;
        assert_eq!(result.message_length, Some(5));
    }

    #[test]
    fn serialized_result_skips_absent_fields() {
        let result = ModerationResult {
            action: Action::Warn,
            reason: "Request for personal information detected".to_owned(),
            message_length: Some(5),
            user_id: None,
            error: None,
        };

        let json = serde_json::to_string(&result).expect("result should serialize");
        assert!(json.contains("\"action\":\"WARN\""));
        assert!(json.contains("\"message_length\":5"));
        assert!(!json.contains("user_id"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn deserializes_minimal_result() {
        let result: ModerationResult =
            serde_json::from_str(r#"{"action":"ALLOW","reason":"Message is appropriate"}"#)
                .expect("minimal result should parse");
        assert_eq!(result.action, Action::Allow);
        assert_eq!(result.message_length, None);
    }

    #[test]
    fn prompt_embeds_message_and_policy() {
        let prompt = render_prompt("Can I have your phone number?");
        assert!(prompt.contains("Message: \"Can I have your phone number?\""));
        assert!(prompt.contains("Respond with only: ALLOW, WARN, or STOP"));
        // The ten worked examples are the policy.
        assert_eq!(prompt.matches("-> STOP").count(), 4);
        assert_eq!(prompt.matches("-> WARN").count(), 4);
        assert_eq!(prompt.matches("-> ALLOW").count(), 2);
    }
}
