//! Classifier Port - Interface for the intent/entity extraction service.
//!
//! The classifier reads one inbound reply (plus a little conversation
//! context) and reports an intent label and the entities it found. The
//! engine never trusts it to be available: every error is replaced with
//! `Classification::neutral()` by the caller.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct Always;
//!
//! #[async_trait]
//! impl Classifier for Always {
//!     async fn classify(&self, _: &ClassificationRequest) -> Result<Classification, ClassifierError> {
//!         Ok(Classification::neutral())
//!     }
//!     async fn health(&self) -> Result<(), ClassifierError> {
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::classification::Classification;
use crate::domain::foundation::StepId;
use crate::domain::session::UserData;

/// Port for reply classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies one reply.
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError` on transport failures, non-success status
    /// codes, and payloads that cannot be decoded.
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassifierError>;

    /// Checks that the service is reachable and healthy.
    async fn health(&self) -> Result<(), ClassifierError>;
}

/// What is sent to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRequest {
    pub message: String,
    pub context: ClassificationContext,
}

/// Conversation context accompanying a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationContext {
    pub current_step: StepId,
    pub previous_step: Option<StepId>,
    pub user_data: UserData,
}

impl ClassificationRequest {
    pub fn new(message: impl Into<String>, context: ClassificationContext) -> Self {
        Self {
            message: message.into(),
            context,
        }
    }
}

/// Classifier errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    /// Could not reach the service.
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success status.
    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// No answer within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Service reports itself unhealthy.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl ClassifierError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout { .. } | Self::Unavailable(_)
        ) || matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_context() {
        let request = ClassificationRequest::new(
            "I live in Lyon",
            ClassificationContext {
                current_step: StepId::new("ask_city"),
                previous_step: Some(StepId::new("greet")),
                user_data: UserData::default(),
            },
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "I live in Lyon");
        assert_eq!(json["context"]["currentStep"], "ask_city");
        assert_eq!(json["context"]["previousStep"], "greet");
    }

    #[test]
    fn retryable_errors() {
        assert!(ClassifierError::network("refused").is_retryable());
        assert!(ClassifierError::timeout(500).is_retryable());
        assert!(ClassifierError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ClassifierError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ClassifierError::parse("bad json").is_retryable());
        assert!(!ClassifierError::AuthenticationFailed.is_retryable());
    }
}
