use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiProvider;

/// What the upstream API sent back, untouched. The proxy decides how to relay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("upstream request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Forward `body` verbatim to the generative API using `api_key`.
    async fn generate(&self, api_key: &str, body: &Value) -> Result<UpstreamReply, ProviderError>;

    fn model_name(&self) -> &str;
}

pub type DynProvider = std::sync::Arc<dyn Provider>;
