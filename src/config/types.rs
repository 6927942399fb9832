//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/langarbiter/) and project (.langarbiter/) level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{apple, arbitration, corroboration};
use crate::detect::remote::CircuitBreakerConfig;
use crate::language::{Preferences, is_valid_language_id};
use crate::types::{ArbiterError, DetectionSourceKind, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Arbitration thresholds and time budget
    pub detection: DetectionConfig,

    /// Preferred languages, in display order
    pub preferences: PreferencesConfig,

    /// Remembered remote results
    pub corroboration: CorroborationConfig,

    /// Remote detection services
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            detection: DetectionConfig::default(),
            preferences: PreferencesConfig::default(),
            corroboration: CorroborationConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ArbiterError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        for (name, value) in [
            ("confirmed_confidence", detection.confirmed_confidence),
            ("low_confidence", detection.low_confidence),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ArbiterError::config(format!(
                    "detection.{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        if detection.low_confidence >= detection.confirmed_confidence {
            return Err(ArbiterError::config(format!(
                "detection.low_confidence ({}) must be below confirmed_confidence ({})",
                detection.low_confidence, detection.confirmed_confidence
            )));
        }

        if detection.fallback_timeout_ms == 0 {
            return Err(ArbiterError::config(
                "detection.fallback_timeout_ms must be greater than 0",
            ));
        }

        if self.remote.request_timeout_ms == 0 {
            return Err(ArbiterError::config(
                "remote.request_timeout_ms must be greater than 0",
            ));
        }

        if self.corroboration.capacity == 0 {
            return Err(ArbiterError::config(
                "corroboration.capacity must be greater than 0",
            ));
        }

        if let Some(unknown) = self
            .preferences
            .languages
            .iter()
            .find(|l| !is_valid_language_id(l))
        {
            return Err(ArbiterError::config(format!(
                "preferences.languages contains unknown language '{}' (see `langarbiter languages`)",
                unknown
            )));
        }

        for kind in self.remote.enabled_kinds() {
            let Some(endpoint) = self.remote.http_endpoint(kind) else {
                continue;
            };
            match endpoint.endpoint.as_deref() {
                None => {
                    return Err(ArbiterError::config(format!(
                        "remote.{}.endpoint is required when enabled",
                        kind
                    )));
                }
                Some(raw) => {
                    url::Url::parse(raw).map_err(|e| {
                        ArbiterError::config(format!(
                            "remote.{}.endpoint '{}' is not a valid URL: {}",
                            kind, raw, e
                        ))
                    })?;
                }
            }
        }

        if self.remote.apple.enabled && self.remote.apple.program.trim().is_empty() {
            return Err(ArbiterError::config(
                "remote.apple.program must not be empty when enabled",
            ));
        }

        Ok(())
    }

    /// Preference oracle for the configured languages
    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.preferences.languages.iter().cloned())
    }
}

// =============================================================================
// Detection Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Local confidence above which a preferred language is final
    pub confirmed_confidence: f64,

    /// Local confidence above which a preferred candidate beats the top guess
    pub low_confidence: f64,

    /// Budget for remote consensus before the local baseline is delivered
    pub fallback_timeout_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confirmed_confidence: arbitration::CONFIRMED_CONFIDENCE,
            low_confidence: arbitration::LOW_CONFIDENCE,
            fallback_timeout_ms: arbitration::FALLBACK_TIMEOUT_MS,
        }
    }
}

impl DetectionConfig {
    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }
}

// =============================================================================
// Preferences
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// Normalized language tags, order preserved
    pub languages: Vec<String>,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            languages: Preferences::default().languages().to_vec(),
        }
    }
}

// =============================================================================
// Corroboration
// =============================================================================

/// Which remembered results may corroborate a new remote answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorroborationScope {
    /// Results from any earlier call count
    #[default]
    Global,
    /// Only results from the same call count
    Session,
}

impl std::fmt::Display for CorroborationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorroborationScope::Global => write!(f, "global"),
            CorroborationScope::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorroborationConfig {
    /// Maximum remembered results; oldest evicted first
    pub capacity: usize,

    /// Remembered results older than this are forgotten
    pub max_age_secs: u64,

    pub scope: CorroborationScope,
}

impl Default for CorroborationConfig {
    fn default() -> Self {
        Self {
            capacity: corroboration::DEFAULT_CAPACITY,
            max_age_secs: corroboration::DEFAULT_MAX_AGE_SECS,
            scope: CorroborationScope::Global,
        }
    }
}

impl CorroborationConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

// =============================================================================
// Remote Detectors
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Upper bound for one remote call
    pub request_timeout_ms: u64,

    pub tencent: HttpEndpointConfig,

    pub baidu: HttpEndpointConfig,

    pub apple: CommandConfig,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: arbitration::REQUEST_TIMEOUT_MS,
            tencent: HttpEndpointConfig::default(),
            baidu: HttpEndpointConfig::default(),
            apple: CommandConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RemoteConfig {
    /// Endpoint settings of an HTTP-backed source; `None` for every other kind
    pub fn http_endpoint(&self, kind: DetectionSourceKind) -> Option<&HttpEndpointConfig> {
        match kind {
            DetectionSourceKind::Tencent => Some(&self.tencent),
            DetectionSourceKind::Baidu => Some(&self.baidu),
            _ => None,
        }
    }

    /// Kinds enabled in this configuration
    pub fn enabled_kinds(&self) -> Vec<DetectionSourceKind> {
        let mut kinds = Vec::new();
        if self.tencent.enabled {
            kinds.push(DetectionSourceKind::Tencent);
        }
        if self.baidu.enabled {
            kinds.push(DetectionSourceKind::Baidu);
        }
        if self.apple.enabled {
            kinds.push(DetectionSourceKind::Apple);
        }
        kinds
    }
}

/// JSON gateway in front of a vendor detection API
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEndpointConfig {
    pub enabled: bool,

    /// Gateway URL receiving `{"text": ...}`
    pub endpoint: Option<String>,

    /// Bearer token; set via env, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Dot-separated path of the language code in the response
    pub language_field: String,
}

impl Default for HttpEndpointConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            language_field: "language".to_string(),
        }
    }
}

impl std::fmt::Debug for HttpEndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpointConfig")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("language_field", &self.language_field)
            .finish()
    }
}

/// Local command printing a language code for its last argument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub enabled: bool,
    pub program: String,
    /// Arguments placed before the text
    pub args: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: apple::PROGRAM.to_string(),
            args: vec![
                "-l".to_string(),
                "JavaScript".to_string(),
                "-e".to_string(),
                apple::NATURAL_LANGUAGE_SCRIPT.to_string(),
            ],
        }
    }
}
