use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{ClientError, ValidationError};
use crate::prompt::{build_request, GenerationOptions};
use crate::response;
use crate::wire::{GenerateRequest, Recommendation};
use crate::wizard::{transition, Step, WizardState};

/// Status and raw body of a proxy reply; interpretation happens in [`response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, req: &GenerateRequest) -> Result<ProxyReply, ClientError>;
}

pub struct ProxyClient {
    url: String,
    client: Client,
}

impl ProxyClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { url: url.into(), client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for ProxyClient {
    async fn post(&self, req: &GenerateRequest) -> Result<ProxyReply, ClientError> {
        let resp = self
            .client
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(ProxyReply { status, body })
    }
}

/// Owns the wizard state and the visible step for one session.
#[derive(Debug, Clone)]
pub struct Controller {
    pub state: WizardState,
    step: Step,
    results: Vec<Recommendation>,
    last_error: Option<ClientError>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(WizardState::default())
    }
}

impl Controller {
    pub fn new(state: WizardState) -> Self {
        Self {
            state,
            step: Step::Basics,
            results: Vec::new(),
            last_error: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn results(&self) -> &[Recommendation] {
        &self.results
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    pub fn go_to_step(&mut self, target: Step) -> Result<(), ValidationError> {
        let t = transition(&self.state, self.step, target);
        self.step = t.step;
        t.outcome
    }

    /// Run one recommendation attempt. The step flips to `Loading` before the
    /// request goes out; failures land back on `Details` with state untouched.
    /// Nothing stops a second call while an attempt is showing `Loading`.
    pub async fn submit<T>(&mut self, transport: &T, opts: &GenerationOptions) -> Result<&[Recommendation], ClientError>
    where
        T: Transport + ?Sized,
    {
        self.step = Step::Loading;
        let attempt = Uuid::new_v4();
        let req = build_request(&self.state, opts);
        tracing::debug!(%attempt, request = %serde_json::to_string(&req).unwrap_or_default(), "sending recommendation request");

        let outcome = match transport.post(&req).await {
            Ok(reply) => {
                tracing::debug!(%attempt, status = reply.status, body = %reply.body, "proxy replied");
                response::interpret(reply.status, &reply.body)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(items) => {
                tracing::info!(%attempt, count = items.len(), "recommendations received");
                self.results = items;
                self.last_error = None;
                self.step = Step::Results;
                Ok(self.results.as_slice())
            }
            Err(e) => {
                tracing::warn!(%attempt, error = %e, "recommendation attempt failed");
                self.last_error = Some(e.clone());
                self.step = Step::Details;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FormatError;
    use crate::wizard::Field;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<ProxyReply, ClientError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl Scripted {
        fn new(reply: Result<ProxyReply, ClientError>) -> Self {
            Self { reply, calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) }
        }

        fn ok(status: u16, body: serde_json::Value) -> Self {
            Self::new(Ok(ProxyReply { status, body: body.to_string() }))
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn post(&self, req: &GenerateRequest) -> Result<ProxyReply, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(req.clone());
            self.reply.clone()
        }
    }

    fn ready() -> Controller {
        let mut c = Controller::default();
        c.state.select(Field::Relation, "연인");
        c.state.select(Field::Gender, "남성");
        c.state.select(Field::Occasion, "기념일");
        c.go_to_step(Step::Details).unwrap();
        c
    }

    fn native(text: &str) -> serde_json::Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn go_to_step_keeps_view_on_validation_failure() {
        let mut c = Controller::default();
        c.state.select(Field::Relation, "친구");
        let err = c.go_to_step(Step::Details).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["gender", "occasion"]));
        assert_eq!(c.step(), Step::Basics);
    }

    #[tokio::test]
    async fn success_renders_items_in_order() {
        let mut c = ready();
        let text = json!({ "recommendations": [
            { "product_name": "A", "search_keyword": "a" },
            { "product_name": "B", "search_keyword": "b" },
            { "product_name": "C", "search_keyword": "c" }
        ]})
        .to_string();
        let t = Scripted::ok(200, native(&text));

        let names: Vec<String> = c
            .submit(&t, &GenerationOptions::default())
            .await
            .unwrap()
            .iter()
            .map(|r| r.product_name.clone())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(c.step(), Step::Results);
        assert!(c.last_error().is_none());
    }

    #[tokio::test]
    async fn request_is_built_from_current_state() {
        let mut c = ready();
        c.state.toggle_interest("게임");
        let t = Scripted::ok(200, json!({ "recommendations": [] }));
        c.submit(&t, &GenerationOptions { expect_json: true, grounding: false }).await.unwrap();

        let seen = t.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].tools.is_empty());
        assert!(seen[0].contents[0].parts[0].text.contains("- 관심사: 게임"));
    }

    #[tokio::test]
    async fn unknown_shape_returns_to_details_with_state_intact() {
        let mut c = ready();
        c.state.set_budget(200_000);
        let before = c.state.clone();
        let t = Scripted::ok(200, json!({ "usageMetadata": {} }));

        let err = c.submit(&t, &GenerationOptions::default()).await.unwrap_err();
        assert_eq!(err, ClientError::Format(FormatError::UnrecognizedShape));
        assert_eq!(c.step(), Step::Details);
        assert_eq!(c.state, before);
        assert_eq!(c.last_error(), Some(&err));
    }

    #[tokio::test]
    async fn upstream_error_message_is_surfaced() {
        let mut c = ready();
        let t = Scripted::ok(500, json!({ "error": "Server Configuration Error: API Key missing" }));
        let err = c.submit(&t, &GenerationOptions::default()).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Upstream {
                status: 500,
                message: "Server Configuration Error: API Key missing".into()
            }
        );
        assert!(err.alert_text().ends_with("[상세 에러]: Server Configuration Error: API Key missing"));
        assert_eq!(c.step(), Step::Details);
    }

    #[tokio::test]
    async fn transport_failure_returns_to_details() {
        let mut c = ready();
        let t = Scripted::new(Err(ClientError::Transport("connection refused".into())));
        let err = c.submit(&t, &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(c.step(), Step::Details);
    }

    #[tokio::test]
    async fn failed_retry_keeps_previous_results_hidden_behind_details() {
        let mut c = ready();
        let ok = Scripted::ok(200, json!({ "recommendations": [{ "product_name": "A" }] }));
        c.submit(&ok, &GenerationOptions::default()).await.unwrap();

        c.go_to_step(Step::Details).unwrap();
        let bad = Scripted::ok(200, native("no json here"));
        let err = c.submit(&bad, &GenerationOptions::default()).await.unwrap_err();
        assert_eq!(err, ClientError::Format(FormatError::NoJsonObject));
        assert_eq!(c.step(), Step::Details);
    }

    #[tokio::test]
    async fn submitting_while_loading_is_not_guarded() {
        let mut c = ready();
        c.go_to_step(Step::Loading).unwrap();
        let t = Scripted::ok(200, json!({ "recommendations": [] }));
        c.submit(&t, &GenerationOptions::default()).await.unwrap();
        c.go_to_step(Step::Loading).unwrap();
        c.submit(&t, &GenerationOptions::default()).await.unwrap();
        assert_eq!(t.calls.load(Ordering::SeqCst), 2);
    }
}
