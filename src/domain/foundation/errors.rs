//! Error types for the domain layer.

use thiserror::Error;

/// Rejected state change on a domain value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        ValidationError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}
