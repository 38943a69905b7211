use async_trait::async_trait;

use super::{ModelProvider, ModelRequest};

/// Scripted stand-in for the Gemini backend, used in tests.
#[derive(Debug, Default)]
pub struct MockModelProvider {
    reply: String,
}

impl MockModelProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn complete(&self, _request: ModelRequest) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }
}
