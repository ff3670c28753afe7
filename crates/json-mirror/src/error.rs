use json_mirror_tokens::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// Object boundaries do not balance: input ended inside an object, an
    /// object end had nothing to close, or tokens followed the root value.
    #[error("unbalanced structure at token {position}")]
    UnbalancedStructure { position: usize },
    #[error("objects nested too deeply at token {position}")]
    NestingTooDeep { position: usize },
    #[error("unexpected {found} at token {position}")]
    UnexpectedToken { position: usize, found: &'static str },
    #[error("token stream failed: {0}")]
    Token(#[from] TokenError),
    #[error("invalid stream event: {0}")]
    InvalidEvent(String),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(String),
}
