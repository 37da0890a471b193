//! The `/recommend` endpoint: attach the server-held key, forward the body to
//! the generative API and relay the answer according to [`RelayPolicy`].

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{MatchedPath, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

use crate::provider::{DynProvider, ProviderError, UpstreamReply};
use crate::wire::ErrorEnvelope;

/// How an upstream status/body pair maps onto our reply.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayPolicy {
    /// Failures become `{error, details}` with the upstream status; successes are re-sent as 200.
    #[default]
    Strict,
    /// Upstream status and JSON body are passed through unchanged.
    Transparent,
}

#[derive(Clone)]
pub struct AppState {
    pub provider: DynProvider,
    pub api_key: Option<Arc<str>>,
    pub relay: RelayPolicy,
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Server Configuration Error: API Key missing")]
    MissingCredential,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Upstream(#[from] ProviderError),
    #[error("upstream returned non-JSON body: {0}")]
    UpstreamBody(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let envelope = match &self {
            ProxyError::MissingCredential => ErrorEnvelope::new(self.to_string()),
            ProxyError::InvalidBody(_) | ProxyError::Upstream(_) | ProxyError::UpstreamBody(_) => {
                ErrorEnvelope::with_details("Internal Server Error", self.to_string())
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/recommend", post(recommend).fallback(method_not_allowed))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());
                    tracing::info_span!(
                        "http_request",
                        id = %Uuid::new_v4(),
                        method = %request.method(),
                        path = %path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(status, latency_ms = %latency.as_millis(), "request failed with server error");
                    } else {
                        tracing::info!(status, latency_ms = %latency.as_millis(), "request completed");
                    }
                }),
        )
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorEnvelope::new("Method Not Allowed")),
    )
        .into_response()
}

async fn recommend(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let api_key = state.api_key.as_deref().ok_or(ProxyError::MissingCredential)?;

    // Buffering failures (e.g. over the body limit) still answer with an envelope.
    let body = body.map_err(|e| ProxyError::InvalidBody(e.body_text()))?;

    let request: Value =
        serde_json::from_slice(&body).map_err(|e| ProxyError::InvalidBody(e.to_string()))?;

    let reply = state.provider.generate(api_key, &request).await?;
    tracing::debug!(status = reply.status, model = state.provider.model_name(), "upstream answered");

    relay(state.relay, reply)
}

fn relay(policy: RelayPolicy, reply: UpstreamReply) -> Result<Response, ProxyError> {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);

    match policy {
        RelayPolicy::Strict if !reply.is_success() => {
            tracing::warn!(status = reply.status, "gemini returned an error");
            Ok((status, Json(ErrorEnvelope::with_details("Google API Error", reply.body))).into_response())
        }
        RelayPolicy::Strict => Ok((StatusCode::OK, Json(parse_upstream(&reply.body)?)).into_response()),
        RelayPolicy::Transparent => Ok((status, Json(parse_upstream(&reply.body)?)).into_response()),
    }
}

fn parse_upstream(body: &str) -> Result<Value, ProxyError> {
    serde_json::from_str(body).map_err(|e| ProxyError::UpstreamBody(e.to_string()))
}
