//! Turning a proxy reply into recommendations.
//!
//! The body is either Gemini's native envelope, whose first candidate carries
//! the model text (JSON, possibly wrapped in prose or a markdown fence), or an
//! already unwrapped `{"recommendations": [...]}` object.

use serde_json::Value;

use crate::errors::{ClientError, FormatError};
use crate::wire::Recommendation;

/// Slice from the first `{` to the last `}` inclusive.
pub fn extract_json_object(text: &str) -> Result<&str, FormatError> {
    let start = text.find('{').ok_or(FormatError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(FormatError::NoJsonObject)?;
    if end < start {
        return Err(FormatError::NoJsonObject);
    }
    Ok(&text[start..=end])
}

/// Parse the text a model produced into recommendation items.
pub fn parse_model_text(text: &str) -> Result<Vec<Recommendation>, FormatError> {
    let obj = extract_json_object(text)?;
    let value: Value =
        serde_json::from_str(obj).map_err(|e| FormatError::InvalidJson(e.to_string()))?;
    recommendations_from(&value)
}

fn recommendations_from(value: &Value) -> Result<Vec<Recommendation>, FormatError> {
    let items = value
        .get("recommendations")
        .ok_or(FormatError::MissingRecommendations)?;
    serde_json::from_value(items.clone()).map_err(|e| FormatError::InvalidItems(e.to_string()))
}

fn candidate_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Locate the recommendation payload in a 2xx body.
pub fn parse_success_body(body: &str) -> Result<Vec<Recommendation>, FormatError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FormatError::InvalidJson(e.to_string()))?;

    if let Some(text) = candidate_text(&value) {
        return parse_model_text(text);
    }
    if value.get("recommendations").is_some() {
        return recommendations_from(&value);
    }
    Err(FormatError::UnrecognizedShape)
}

/// Human-readable message for a non-2xx reply. Accepts `{error: {message}}`
/// (Gemini relayed as-is), `{error: "..."}` (proxy envelope) or anything else.
pub fn error_message(status: u16, body: &str) -> String {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let error = value.get("error");

    if let Some(msg) = error.and_then(|e| e.get("message")).and_then(Value::as_str) {
        return msg.to_string();
    }
    if let Some(msg) = error.and_then(Value::as_str) {
        return msg.to_string();
    }
    format!("서버 에러 ({status})")
}

pub fn interpret(status: u16, body: &str) -> Result<Vec<Recommendation>, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Upstream {
            status,
            message: error_message(status, body),
        });
    }
    Ok(parse_success_body(body)?)
}
