use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{Provider, ProviderError, UpstreamReply};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

/// Google Generative Language `generateContent` client.
pub struct GeminiProvider {
    model: String,
    api_base: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(model: String, api_base: String, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { model, api_base, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, api_key: &str, body: &Value) -> Result<UpstreamReply, ProviderError> {
        let url = self.endpoint();
        tracing::debug!(%url, model = %self.model, "forwarding generateContent");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        tracing::debug!(status, bytes = text.len(), "gemini replied");
        Ok(UpstreamReply { status, body: text })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_model_and_trims_base() {
        let p = GeminiProvider::new("gemini-x".into(), "http://localhost:9000/".into(), None).unwrap();
        assert_eq!(p.endpoint(), "http://localhost:9000/v1beta/models/gemini-x:generateContent");
        assert_eq!(p.model_name(), "gemini-x");
    }
}
