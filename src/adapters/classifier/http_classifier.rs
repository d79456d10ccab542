//! HTTP Classifier - Implementation of Classifier for the analysis service.
//!
//! Posts `{ message, context }` to `{base_url}/api/analyze` and decodes the
//! classification from the JSON answer. `{base_url}/api/health` reports
//! `{ "status": "ok" }` when the service and its model are up.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpClassifierConfig::new("http://localhost:5000")
//!     .with_api_key("secret")
//!     .with_timeout(Duration::from_secs(5));
//!
//! let classifier = HttpClassifier::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::classification::Classification;
use crate::ports::{ClassificationRequest, Classifier, ClassifierError};

/// Configuration for the HTTP classifier.
#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token.
    api_key: Option<Secret<String>>,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpClassifierConfig {
    /// Creates a configuration for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// Classifier backed by the HTTP analysis service.
pub struct HttpClassifier {
    config: HttpClassifierConfig,
    client: Client,
}

impl HttpClassifier {
    /// Creates the classifier.
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError::Network` if the HTTP client cannot be built.
    pub fn new(config: HttpClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifierError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn analyze_url(&self) -> String {
        format!("{}/api/analyze", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/api/health", self.config.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key() {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::timeout(self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ClassifierError::network(format!("Connection failed: {}", e))
        } else {
            ClassifierError::network(e.to_string())
        }
    }

    /// Passes successful responses through; turns the rest into errors.
    async fn check_status(response: Response) -> Result<Response, ClassifierError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), body))
    }
}

/// Maps a non-success status code to an error.
fn status_error(status: u16, body: String) -> ClassifierError {
    match status {
        401 | 403 => ClassifierError::AuthenticationFailed,
        503 => ClassifierError::Unavailable(body),
        _ => ClassifierError::Status { status, body },
    }
}

/// Decodes an analysis payload.
fn parse_classification(body: &str) -> Result<Classification, ClassifierError> {
    serde_json::from_str(body)
        .map_err(|e| ClassifierError::parse(format!("Failed to parse classification: {}", e)))
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassifierError> {
        let response = self
            .authorize(self.client.post(self.analyze_url()))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::network(format!("Failed to read body: {}", e)))?;

        parse_classification(&body)
    }

    async fn health(&self) -> Result<(), ClassifierError> {
        let response = self
            .authorize(self.client.get(self.health_url()))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let health: HealthResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClassifierError::parse(format!("Failed to parse health: {}", e)))?;

        if health.status.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(ClassifierError::Unavailable(format!(
                "service reports status '{}'",
                health.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::Intent;
    use crate::domain::foundation::StepId;
    use crate::domain::session::UserData;
    use crate::ports::ClassificationContext;

    #[test]
    fn config_builder_works() {
        let config = HttpClassifierConfig::new("http://localhost:5000/")
            .with_api_key("test-key")
            .with_timeout(Duration::from_secs(3));

        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.api_key(), Some("test-key"));
    }

    #[test]
    fn config_debug_hides_key() {
        let config = HttpClassifierConfig::new("http://x").with_api_key("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn endpoints_are_built_from_base_url() {
        let classifier = HttpClassifier::new(HttpClassifierConfig::new("http://nlp:5000")).unwrap();
        assert_eq!(classifier.analyze_url(), "http://nlp:5000/api/analyze");
        assert_eq!(classifier.health_url(), "http://nlp:5000/api/health");
    }

    #[test]
    fn status_errors_are_classified() {
        assert_eq!(status_error(401, String::new()), ClassifierError::AuthenticationFailed);
        assert!(matches!(status_error(503, "down".into()), ClassifierError::Unavailable(_)));
        assert!(matches!(
            status_error(500, "boom".into()),
            ClassifierError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn parses_service_payload() {
        let body = r#"{
            "intent": "age",
            "contains_location": false,
            "location_name": null,
            "contains_age": true,
            "age_value": "24",
            "service_type": "none",
            "scheduling_info": null
        }"#;
        let c = parse_classification(body).unwrap();
        assert_eq!(c.intent, Intent::Age);
        assert_eq!(c.age(), Some(24));
    }

    #[test]
    fn malformed_payload_is_parse_error() {
        assert!(matches!(
            parse_classification("<html>oops</html>"),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let config = HttpClassifierConfig::new("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        let classifier = HttpClassifier::new(config).unwrap();
        let request = ClassificationRequest::new(
            "hello",
            ClassificationContext {
                current_step: StepId::new("greet"),
                previous_step: None,
                user_data: UserData::default(),
            },
        );

        let err = classifier.classify(&request).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(classifier.health().await.is_err());
    }
}
