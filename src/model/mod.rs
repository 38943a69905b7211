mod gemini;
mod mock;

use async_trait::async_trait;

pub use gemini::GeminiProvider;
pub use mock::MockModelProvider;

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn complete(&self, request: ModelRequest) -> anyhow::Result<String>;
}
