//! Error types for the ad overlay widget

use thiserror::Error;

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating an ad session.
///
/// None of these reach the host page: the controller absorbs them at its
/// boundary, logs them and degrades to content-only playback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The ad-session request failed, synchronously or asynchronously
    #[error("Ad request failed: {0}")]
    RequestError(String),

    /// `AdSession::start` failed after the session loaded
    #[error("Ad session could not be started: {0}")]
    StartError(String),

    /// The ad failed after the session loaded
    #[error("Ad playback failed: {0}")]
    PlaybackError(String),

    /// A second ad-session request during the same page view
    #[error("Ad session already requested for this page view")]
    DuplicateRequest,

    /// A lifecycle callback arrived after the controller reached a terminal state
    #[error("Late callback ignored: {0}")]
    LateCallback(String),

    /// The ad engine did not answer within the configured load timeout
    #[error("Ad load timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
