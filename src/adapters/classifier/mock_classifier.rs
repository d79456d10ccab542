//! Mock Classifier for testing.
//!
//! Provides a configurable mock implementation of the Classifier port,
//! allowing tests to run without the analysis service.
//!
//! # Features
//!
//! - Pre-configured classifications (consumed in order)
//! - Simulated delays for timeout testing
//! - Error injection for fallback testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let classifier = MockClassifier::new()
//!     .with_location("Lyon")
//!     .with_error(MockError::Network { message: "refused".into() });
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::classification::{Classification, Intent};
use crate::ports::{ClassificationRequest, Classifier, ClassifierError};

/// Mock classifier for testing.
#[derive(Debug, Clone, Default)]
pub struct MockClassifier {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Answer for health probes.
    healthy: bool,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ClassificationRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(Classification),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate a refused connection.
    Network { message: String },
    /// Simulate a non-success status.
    Status { status: u16 },
    /// Simulate a malformed payload.
    Malformed,
    /// Simulate a timeout.
    Timeout { timeout_ms: u64 },
}

impl From<MockError> for ClassifierError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::Network { message } => ClassifierError::network(message),
            MockError::Status { status } => ClassifierError::Status {
                status,
                body: "mock failure".to_string(),
            },
            MockError::Malformed => ClassifierError::parse("mock malformed payload"),
            MockError::Timeout { timeout_ms } => ClassifierError::timeout(timeout_ms),
        }
    }
}

impl MockClassifier {
    /// Creates a healthy mock that answers `Classification::neutral()` once
    /// its queue is empty.
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Adds a classification to the queue.
    pub fn with_classification(self, classification: Classification) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Success(classification));
        self
    }

    /// Adds a classification reporting a location.
    pub fn with_location(self, name: impl Into<String>) -> Self {
        self.with_classification(Classification {
            intent: Intent::Location,
            contains_location: true,
            location_name: Some(name.into()),
            ..Classification::neutral()
        })
    }

    /// Adds a classification reporting an age.
    pub fn with_age(self, age: u32) -> Self {
        self.with_classification(Classification {
            intent: Intent::Age,
            contains_age: true,
            age_value: Some(age),
            ..Classification::neutral()
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes health probes fail.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Returns the number of calls made to this classifier.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ClassificationRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(Classification::neutral()))
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassifierError> {
        self.calls.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success(classification) => Ok(classification),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    async fn health(&self) -> Result<(), ClassifierError> {
        if self.healthy {
            Ok(())
        } else {
            Err(ClassifierError::Unavailable("mock unhealthy".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StepId;
    use crate::domain::session::UserData;
    use crate::ports::ClassificationContext;

    fn request(text: &str) -> ClassificationRequest {
        ClassificationRequest::new(
            text,
            ClassificationContext {
                current_step: StepId::new("s"),
                previous_step: None,
                user_data: UserData::default(),
            },
        )
    }

    #[tokio::test]
    async fn returns_configured_responses_in_order() {
        let mock = MockClassifier::new()
            .with_location("Lyon")
            .with_error(MockError::Malformed)
            .with_age(30);

        let first = mock.classify(&request("a")).await.unwrap();
        assert_eq!(first.location(), Some("Lyon"));
        assert!(matches!(
            mock.classify(&request("b")).await,
            Err(ClassifierError::Parse(_))
        ));
        assert_eq!(mock.classify(&request("c")).await.unwrap().age(), Some(30));
    }

    #[tokio::test]
    async fn falls_back_to_neutral_when_empty() {
        let mock = MockClassifier::new();
        let c = mock.classify(&request("x")).await.unwrap();
        assert_eq!(c, Classification::neutral());
    }

    #[tokio::test]
    async fn records_calls() {
        let mock = MockClassifier::new();
        mock.classify(&request("one")).await.unwrap();
        mock.classify(&request("two")).await.unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.get_calls()[1].message, "two");
    }

    #[tokio::test]
    async fn health_follows_configuration() {
        assert!(MockClassifier::new().health().await.is_ok());
        assert!(MockClassifier::new().unhealthy().health().await.is_err());
    }
}
