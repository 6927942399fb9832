//! JSON gateway detector
//!
//! Talks to an HTTP gateway that fronts a vendor detection API (request
//! signing lives in the gateway). The request body is `{"text": "..."}`; the
//! provider-native code is read from a configurable, dot-separated field of
//! the JSON response.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::RemoteDetector;
use crate::config::HttpEndpointConfig;
use crate::language::catalog;
use crate::types::{
    ArbiterError, DetectError, DetectionResult, DetectionSourceKind, ErrorCategory,
    ErrorClassifier, Result,
};

/// Remote detector backed by a JSON HTTP endpoint
pub struct HttpDetector {
    kind: DetectionSourceKind,
    endpoint: url::Url,
    /// Never exposed in logs or debug output
    api_key: Option<SecretString>,
    language_field: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDetector")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("language_field", &self.language_field)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
}

impl HttpDetector {
    pub fn new(
        kind: DetectionSourceKind,
        config: &HttpEndpointConfig,
        request_timeout: Duration,
    ) -> Result<Self> {
        let raw_endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ArbiterError::config(format!("remote.{}.endpoint is required when enabled", kind))
        })?;
        let endpoint = url::Url::parse(raw_endpoint).map_err(|e| {
            ArbiterError::config(format!("remote.{}.endpoint is not a URL: {}", kind, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ArbiterError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            kind,
            endpoint,
            api_key: config.api_key.clone().map(SecretString::from),
            language_field: config.language_field.clone(),
            client,
        })
    }

    /// Read the provider-native code at `language_field`
    fn extract_code(&self, body: &Value) -> Option<String> {
        let mut current = body;
        for segment in self.language_field.split('.') {
            current = current.get(segment)?;
        }
        current.as_str().map(|s| s.trim().to_string())
    }
}

#[async_trait]
impl RemoteDetector for HttpDetector {
    fn kind(&self) -> DetectionSourceKind {
        self.kind
    }

    async fn detect(&self, text: &str) -> std::result::Result<DetectionResult, DetectError> {
        let start = Instant::now();

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&DetectRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_reqwest(&e, self.kind))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("{} gateway error ({}): {}", self.kind, status, body),
                self.kind,
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_reqwest(&e, self.kind))?;

        let raw = self.extract_code(&body).ok_or_else(|| {
            DetectError::new(
                self.kind,
                ErrorCategory::ParseError,
                format!("response has no string at '{}'", self.language_field),
            )
        })?;
        let language = catalog::normalize(self.kind, &raw).unwrap_or_default();

        debug!(
            source = %self.kind,
            raw = %raw,
            language = %language,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Remote detection answered"
        );

        Ok(DetectionResult::new(self.kind, raw, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>, field: &str) -> HttpEndpointConfig {
        HttpEndpointConfig {
            enabled: true,
            endpoint: endpoint.map(String::from),
            api_key: Some("secret-key".to_string()),
            language_field: field.to_string(),
        }
    }

    #[test]
    fn test_requires_endpoint() {
        let err = HttpDetector::new(
            DetectionSourceKind::Tencent,
            &config(None, "language"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("remote.tencent.endpoint"));

        assert!(
            HttpDetector::new(
                DetectionSourceKind::Tencent,
                &config(Some("not a url"), "language"),
                Duration::from_secs(1),
            )
            .is_err()
        );
    }

    #[test]
    fn test_extract_nested_field() {
        let detector = HttpDetector::new(
            DetectionSourceKind::Baidu,
            &config(Some("http://127.0.0.1:9/detect"), "data.src"),
            Duration::from_secs(1),
        )
        .unwrap();

        let body = serde_json::json!({"error_code": 0, "data": {"src": " jp "}});
        assert_eq!(detector.extract_code(&body), Some("jp".to_string()));
        assert_eq!(detector.extract_code(&serde_json::json!({"data": {}})), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let detector = HttpDetector::new(
            DetectionSourceKind::Baidu,
            &config(Some("http://127.0.0.1:9/detect"), "language"),
            Duration::from_secs(1),
        )
        .unwrap();
        let debug = format!("{:?}", detector);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-key"));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_typed_error() {
        let detector = HttpDetector::new(
            DetectionSourceKind::Tencent,
            &config(Some("http://127.0.0.1:9/detect"), "language"),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = detector.detect("hello").await.unwrap_err();
        assert_eq!(err.source_kind, DetectionSourceKind::Tencent);
    }
}
