//! Error types for the script matcher

use thiserror::Error;

/// Result type alias for matcher operations
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Everything that can go wrong while evaluating a navigation.
///
/// None of these are fatal: callers log them and leave the page alone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatcherError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("Injection error: {0}")]
    Injection(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_wasm_bindgen::Error> for MatcherError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        MatcherError::Serialization(err.to_string())
    }
}
