//! Corroboration Store
//!
//! Remembers preferred remote answers so that a later answer with the same
//! tag can confirm them. Shared between sessions and injected into the
//! engine. Bounded by capacity (oldest evicted first) and by age (expired
//! entries are dropped whenever the ledger is locked).
//!
//! Entries are never rewritten except to flip `confirmed` to `true`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::CorroborationConfig;
use crate::language::is_valid_language_id;
use crate::types::{DetectionResult, SessionId};

#[derive(Debug, Clone)]
struct Entry {
    result: DetectionResult,
    session: SessionId,
    recorded_at: Instant,
}

/// Locked view of the store. Hold it for a whole adjudication step.
#[derive(Debug)]
pub struct Ledger {
    entries: VecDeque<Entry>,
    capacity: usize,
    max_age: Duration,
}

impl Ledger {
    fn evict_expired(&mut self) {
        let max_age = self.max_age;
        let before = self.entries.len();
        self.entries.retain(|e| e.recorded_at.elapsed() < max_age);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Expired corroboration entries");
        }
    }

    /// Find the oldest remembered result tagged `language`, mark it confirmed
    /// and return a copy.
    ///
    /// With `session` set, only that session's results are considered.
    pub fn confirm_match(
        &mut self,
        language: &str,
        session: Option<&SessionId>,
    ) -> Option<DetectionResult> {
        if !is_valid_language_id(language) {
            return None;
        }
        let entry = self.entries.iter_mut().find(|e| {
            e.result.language == language && session.is_none_or(|s| &e.session == s)
        })?;
        entry.result.confirmed = true;
        Some(entry.result.clone())
    }

    /// Remember a remote result, evicting the oldest past capacity
    pub fn record(&mut self, result: DetectionResult, session: &SessionId) {
        self.entries.push_back(Entry {
            result,
            session: session.clone(),
            recorded_at: Instant::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, bounded memory of remote detection results
#[derive(Debug)]
pub struct CorroborationStore {
    inner: Mutex<Ledger>,
}

impl CorroborationStore {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            inner: Mutex::new(Ledger {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
                max_age,
            }),
        }
    }

    pub fn from_config(config: &CorroborationConfig) -> Self {
        Self::new(config.capacity, config.max_age())
    }

    /// Lock the ledger, dropping expired entries first
    pub fn lock(&self) -> MutexGuard<'_, Ledger> {
        let mut ledger = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ledger.evict_expired();
        ledger
    }

    /// Remembered results, oldest first
    pub fn snapshot(&self) -> Vec<DetectionResult> {
        self.lock().entries.iter().map(|e| e.result.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for CorroborationStore {
    fn default() -> Self {
        Self::from_config(&CorroborationConfig::default())
    }
}
