//! Error types for the panel boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel request timed out")]
    Timeout,

    #[error("panel authentication failed: {0}")]
    Auth(String),

    #[error("panel http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected panel response: {0}")]
    Protocol(String),

    #[error("unknown instance: {0}")]
    UnknownInstance(String),
}

impl PanelError {
    /// Collapse reqwest's timeout flavor into the explicit variant so the
    /// engine can count it like any other transient poll failure.
    #[must_use]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}
