//! Error types for the SDK.
//!
//! These are internal: the capture pipeline itself is fail-silent and never
//! surfaces an error to the host. Only explicit constructors such as
//! [`crate::Client::new`] return them.

/// Result type alias using [`SdkError`].
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors that can occur while constructing SDK components.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SdkError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
