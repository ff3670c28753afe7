use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid JSON at byte {0}")]
    Invalid(usize),
    #[error("unbalanced structure: input ended inside an object at byte {0}")]
    Unbalanced(usize),
    #[error("objects nested deeper than {limit} levels at byte {0}", limit = crate::MAX_DEPTH)]
    TooDeep(usize),
    #[error("invalid UTF-8 in JSON string")]
    InvalidUtf8,
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
