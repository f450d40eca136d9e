//! Crate-wide error type.

use thiserror::Error;

/// Errors raised by the search engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A position or assignment does not lie on the declared search space.
    #[error("out of domain for '{parameter}': {detail}")]
    OutOfDomain { parameter: String, detail: String },

    /// The external objective failed (or returned NaN) for a position.
    ///
    /// Fatal for the run: failed calls are never retried.
    #[error("objective failed at {position}: {message}")]
    ObjectiveFailure { position: String, message: String },

    /// Invalid run or strategy configuration, detected before any evaluation.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub(crate) fn out_of_domain(parameter: impl Into<String>, detail: impl Into<String>) -> Self {
        SearchError::OutOfDomain {
            parameter: parameter.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        SearchError::Configuration(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
