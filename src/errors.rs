use thiserror::Error;

/// The model (or proxy) answered 2xx but the body is not something we can render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model text contains no JSON object")]
    NoJsonObject,
    #[error("model JSON has no `recommendations` field")]
    MissingRecommendations,
    #[error("unrecognized response shape (safety filter or empty candidate)")]
    UnrecognizedShape,
    #[error("recommendation items are malformed: {0}")]
    InvalidItems(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("could not reach the recommendation proxy: {0}")]
    Transport(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ClientError {
    /// Alert text shown when an attempt fails and the wizard falls back to step 2.
    pub fn alert_text(&self) -> String {
        format!("문제가 발생했습니다. 잠시 후 다시 시도해주세요.\n\n[상세 에러]: {self}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("관계, 성별, 상황을 모두 선택해주세요!")]
    MissingFields(Vec<&'static str>),
}
