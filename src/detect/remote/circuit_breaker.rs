//! Per-source circuit breaker
//!
//! A remote detector that keeps failing is left out of the race until its
//! recovery window has passed, so a dead service does not burn a request on
//! every call.
//!
//! ```text
//! Closed --[failure_threshold outages]--> Open
//! Open --[recovery elapsed]--> HalfOpen
//! HalfOpen --[success_threshold successes]--> Closed
//! HalfOpen --[outage]--> Open
//! ```
//!
//! Callers must settle every admitted request with either `record_success` or
//! `record_failure`; an unsettled half-open probe keeps its slot.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::circuit_breaker as cb_constants;
use crate::types::DetectionSourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive outages before the circuit opens
    pub failure_threshold: u32,
    /// Consecutive half-open successes before the circuit closes
    pub success_threshold: u32,
    /// Seconds to wait before probing an open circuit
    pub recovery_secs: u64,
    /// Probe requests admitted while half-open
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: cb_constants::FAILURE_THRESHOLD,
            success_threshold: cb_constants::SUCCESS_THRESHOLD,
            recovery_secs: cb_constants::RECOVERY_TIMEOUT_SECS,
            half_open_max_requests: cb_constants::HALF_OPEN_MAX_REQUESTS,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    probes: u32,
    opened_at: Option<Instant>,
    rejected: u64,
}

/// Circuit breaker guarding one remote detection source
pub struct CircuitBreaker {
    source: DetectionSourceKind,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(source: DetectionSourceKind, config: CircuitBreakerConfig) -> Self {
        Self {
            source,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                probes: 0,
                opened_at: None,
                rejected: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn recovery(&self) -> Duration {
        Duration::from_secs(self.config.recovery_secs)
    }

    /// Move an open circuit to half-open once its recovery window has passed
    fn refresh(&self, inner: &mut BreakerState) {
        if inner.state == CircuitState::Open
            && inner
                .opened_at
                .is_some_and(|opened| opened.elapsed() >= self.recovery())
        {
            inner.state = CircuitState::HalfOpen;
            inner.probes = 0;
            inner.successes = 0;
            info!(source = %self.source, "Circuit half-open, probing recovery");
        }
    }

    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Whether the source may join the next race
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        let allowed = match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.probes < self.config.half_open_max_requests {
                    inner.probes += 1;
                    true
                } else {
                    false
                }
            }
        };
        if !allowed {
            inner.rejected += 1;
        }
        allowed
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.failures = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.successes += 1;
            if inner.successes >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.successes = 0;
                inner.probes = 0;
                inner.opened_at = None;
                info!(source = %self.source, "Circuit closed, source recovered");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.successes = 0;
        match inner.state {
            CircuitState::Closed => {
                inner.failures += 1;
                if inner.failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        source = %self.source,
                        failures = inner.failures,
                        recovery_secs = self.config.recovery_secs,
                        "Circuit opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.failures = 0;
                warn!(source = %self.source, "Circuit re-opened during recovery probe");
            }
            CircuitState::Open => {}
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        CircuitBreakerStats {
            source: self.source,
            state: inner.state,
            failures: inner.failures,
            rejected: inner.rejected,
        }
    }
}

/// Snapshot of one breaker
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub source: DetectionSourceKind,
    pub state: CircuitState,
    pub failures: u32,
    pub rejected: u64,
}
