//! Failure taxonomy for the research assistant.
//!
//! Three distinct failure domains with different blast radii:
//!
//! - [`DataLoadError`] is fatal for the session. No partial dataset is
//!   usable, so the coordinator renders a blocking error view and the only
//!   recovery is an external reload.
//! - [`SearchError`] and [`SummaryError`] are recoverable and scoped to
//!   their own views; the user retries by resubmitting or regenerating.
//!
//! The search and summary errors always render the same user-facing message
//! regardless of the underlying cause; the cause is kept for logs only.

use thiserror::Error;

/// The dataset could not be fetched or parsed at startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// Connection to the dataset store failed
    #[error("failed to reach the dataset store: {0}")]
    Network(String),

    /// The store answered with a non-success status
    #[error("dataset store error: {0}")]
    Api(String),

    /// Rows did not match the expected record shape
    #[error("failed to parse dataset rows: {0}")]
    Parse(String),
}

/// The relevance search call failed at the transport or parse layer.
#[derive(Debug, Error)]
#[error("Failed to get a response from the AI. Please try again.")]
pub struct SearchError {
    cause: String,
}

impl SearchError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// Underlying cause, for logging. Never shown to the user.
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

/// The summary generation call failed at the transport layer.
#[derive(Debug, Error)]
#[error("Failed to generate AI summary. Please try again.")]
pub struct SummaryError {
    cause: String,
}

impl SummaryError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// Underlying cause, for logging. Never shown to the user.
    pub fn cause(&self) -> &str {
        &self.cause
    }
}
