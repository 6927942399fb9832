//! Remote Detector Pool
//!
//! Defines the `RemoteDetector` contract and the pool that launches every
//! enabled detector concurrently for one arbitration session.
//!
//! ## Modules
//!
//! - `http`: JSON gateway detector (Tencent, Baidu)
//! - `command`: local command detector (Apple NaturalLanguage via `osascript`)
//! - `circuit_breaker`: keeps failing sources out of the race

mod circuit_breaker;
mod command;
mod http;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use command::CommandDetector;
pub use http::HttpDetector;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::types::{DetectError, DetectionResult, DetectionSourceKind, Result};

// =============================================================================
// Remote Detector Trait
// =============================================================================

/// One external language detection service
///
/// Implementations perform a single attempt; there are no retries. A failure
/// is reported as a [`DetectError`] tagged with [`RemoteDetector::kind`].
#[async_trait]
pub trait RemoteDetector: Send + Sync {
    /// Source identity; at most one detector per kind joins a race
    fn kind(&self) -> DetectionSourceKind;

    /// Detect the language of already-normalized text
    async fn detect(&self, text: &str) -> std::result::Result<DetectionResult, DetectError>;
}

/// Shared detector for concurrent access across sessions.
pub type SharedDetector = Arc<dyn RemoteDetector>;

/// A settled remote call: its source and outcome
pub type Settlement = (
    DetectionSourceKind,
    std::result::Result<DetectionResult, DetectError>,
);

/// In-flight remote calls, yielding in completion order
pub type PendingCalls = FuturesUnordered<BoxFuture<'static, Settlement>>;

/// Remote calls launched for one session
pub struct RemoteRace {
    /// Sources that joined the race
    pub kinds: Vec<DetectionSourceKind>,
    pub calls: PendingCalls,
}

// =============================================================================
// Pool
// =============================================================================

/// Enabled remote detectors plus their circuit breakers
///
/// Breakers are shared across clones so every engine instance built from the
/// same pool sees the same source health.
#[derive(Clone)]
pub struct RemoteDetectorPool {
    detectors: Vec<SharedDetector>,
    request_timeout: Duration,
    breaker_config: CircuitBreakerConfig,
    breakers: Arc<DashMap<DetectionSourceKind, CircuitBreaker>>,
}

impl RemoteDetectorPool {
    pub fn new(request_timeout: Duration, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            detectors: Vec::new(),
            request_timeout,
            breaker_config,
            breakers: Arc::new(DashMap::new()),
        }
    }

    /// Pool without any remote detector: every call resolves locally
    pub fn empty() -> Self {
        Self::new(Duration::ZERO, CircuitBreakerConfig::default())
    }

    /// Add a detector. A later detector of the same kind replaces the earlier one.
    pub fn with_detector(mut self, detector: SharedDetector) -> Self {
        let kind = detector.kind();
        self.detectors.retain(|d| d.kind() != kind);
        self.detectors.push(detector);
        self.detectors.sort_by_key(|d| d.kind());
        self
    }

    /// Build the pool from the `[remote]` configuration section
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let mut pool = Self::new(request_timeout, config.circuit_breaker.clone());

        for kind in config.enabled_kinds() {
            let detector: SharedDetector = match config.http_endpoint(kind) {
                Some(endpoint) => Arc::new(HttpDetector::new(kind, endpoint, request_timeout)?),
                None => Arc::new(CommandDetector::new(kind, &config.apple, request_timeout)?),
            };
            pool = pool.with_detector(detector);
        }

        Ok(pool)
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Kinds of every configured detector
    pub fn kinds(&self) -> Vec<DetectionSourceKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    fn breaker_allows(&self, kind: DetectionSourceKind) -> bool {
        self.breakers
            .entry(kind)
            .or_insert_with(|| CircuitBreaker::new(kind, self.breaker_config.clone()))
            .allow_request()
    }

    /// Launch every admitted detector against `text`.
    ///
    /// The returned set yields settlements in completion order. Calls are
    /// bounded by the request timeout and report to their breaker when they
    /// settle, whether or not anyone is still waiting for them.
    pub fn launch(&self, text: &str) -> RemoteRace {
        let mut kinds = Vec::with_capacity(self.detectors.len());
        let calls = PendingCalls::new();

        for detector in &self.detectors {
            let kind = detector.kind();
            if !self.breaker_allows(kind) {
                debug!(source = %kind, "Skipping source (circuit open)");
                continue;
            }

            kinds.push(kind);
            let detector = Arc::clone(detector);
            let breakers = Arc::clone(&self.breakers);
            let request_timeout = self.request_timeout;
            let text = text.to_string();

            calls.push(Box::pin(async move {
                let outcome = match tokio::time::timeout(request_timeout, detector.detect(&text)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(DetectError::timeout(kind, request_timeout)),
                };

                // a parse error or rejected request still means the service answered
                if let Some(breaker) = breakers.get(&kind) {
                    match &outcome {
                        Err(err) if err.category.counts_as_outage() => breaker.record_failure(),
                        _ => breaker.record_success(),
                    }
                }

                if let Err(err) = &outcome {
                    warn!(source = %kind, error = %err, "Remote detection failed");
                }

                (kind, outcome)
            }) as BoxFuture<'static, Settlement>);
        }

        RemoteRace { kinds, calls }
    }

    /// Breaker snapshot for every source that has been raced at least once
    pub fn circuit_stats(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| entry.value().stats())
            .collect();
        stats.sort_by_key(|s| s.source);
        stats
    }
}
