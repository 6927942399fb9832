//! Arbitration Session
//!
//! Per-call state machine. One driver owns the session and feeds it one
//! settlement at a time; each settlement is adjudicated in order:
//!
//! 1. preference gate (empty or non-preferred answers drop their source)
//! 2. consensus with a remembered answer (the earlier answer is confirmed)
//! 3. accumulate
//! 4. exhaustion once nothing is pending
//!
//! Delivery goes through a [`CompletionToken`]; after it is spent the
//! session only feeds late answers to the store.

use std::collections::BTreeSet;

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::local::LocalDetection;
use super::store::Ledger;
use crate::config::CorroborationScope;
use crate::language::Preferences;
use crate::types::{DetectError, DetectionResult, DetectionSourceKind, SessionId};

// =============================================================================
// Completion Token
// =============================================================================

/// One-shot delivery handle. Resolving a spent token is a no-op.
#[derive(Debug)]
pub struct CompletionToken {
    sender: Option<oneshot::Sender<DetectionResult>>,
}

impl CompletionToken {
    pub fn new() -> (Self, oneshot::Receiver<DetectionResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Deliver `result`. Returns `false` if the token was already spent.
    pub fn resolve(&mut self, result: DetectionResult) -> bool {
        match self.sender.take() {
            Some(sender) => {
                // a caller that stopped waiting is not an error
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.sender.is_none()
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct ArbitrationSession {
    id: SessionId,
    baseline: LocalDetection,
    pending: BTreeSet<DetectionSourceKind>,
    candidates: Vec<DetectionResult>,
    scope: CorroborationScope,
    token: CompletionToken,
}

impl ArbitrationSession {
    pub fn new(
        id: SessionId,
        baseline: LocalDetection,
        pending: impl IntoIterator<Item = DetectionSourceKind>,
        scope: CorroborationScope,
        token: CompletionToken,
    ) -> Self {
        Self {
            id,
            baseline,
            pending: pending.into_iter().collect(),
            candidates: Vec::new(),
            scope,
            token,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_complete(&self) -> bool {
        self.token.is_spent()
    }

    pub fn baseline(&self) -> &DetectionResult {
        &self.baseline.result
    }

    /// Remembered answers this session may be corroborated by
    fn scope_filter(&self) -> Option<&SessionId> {
        match self.scope {
            CorroborationScope::Global => None,
            CorroborationScope::Session => Some(&self.id),
        }
    }

    /// Deliver the verdict. Later calls are ignored.
    pub fn complete(&mut self, result: DetectionResult, reason: &str) -> bool {
        if self.token.is_spent() {
            return false;
        }
        info!(
            session = %self.id,
            language = %result.language,
            source = %result.source,
            confirmed = result.confirmed,
            reason,
            "Language verdict"
        );
        self.token.resolve(result)
    }

    /// Adjudicate one settled remote call.
    ///
    /// Returns the verdict once one is reached. The caller holds the ledger
    /// lock for the whole step.
    pub fn adjudicate(
        &mut self,
        ledger: &mut Ledger,
        preferences: &Preferences,
        kind: DetectionSourceKind,
        outcome: Result<DetectionResult, DetectError>,
    ) -> Option<DetectionResult> {
        self.pending.remove(&kind);
        let result = outcome.unwrap_or_else(|_| DetectionResult::empty(kind));

        if !preferences.is_preferred(&result.language) {
            debug!(
                session = %self.id,
                source = %kind,
                language = %result.language,
                remaining = self.pending.len(),
                "Dropped non-preferred remote answer"
            );
            return self.pending.is_empty().then(|| self.exhaust(ledger));
        }

        if let Some(earlier) = ledger.confirm_match(&result.language, self.scope_filter()) {
            debug!(
                session = %self.id,
                source = %kind,
                matched = %earlier.source,
                language = %earlier.language,
                "Remote answers agree"
            );
            return Some(earlier);
        }

        ledger.record(result.clone(), &self.id);
        self.candidates.push(result);
        debug!(
            session = %self.id,
            source = %kind,
            remaining = self.pending.len(),
            "Accumulated remote candidate"
        );

        self.pending.is_empty().then(|| self.exhaust(ledger))
    }

    /// Verdict once every source has answered without consensus
    fn exhaust(&self, ledger: &mut Ledger) -> DetectionResult {
        let filter = self.scope_filter();
        for (language, confidence) in &self.baseline.ranked {
            if *confidence <= 0.0 {
                continue;
            }
            if let Some(matched) = ledger.confirm_match(language, filter) {
                debug!(
                    session = %self.id,
                    source = %matched.source,
                    language = %language,
                    "Remote answer matches local ranking"
                );
                return matched;
            }
        }

        match self.candidates.last() {
            Some(latest) => {
                let mut latest = latest.clone();
                latest.confirmed = false;
                latest
            }
            None => self.baseline.result.clone(),
        }
    }

    /// Keep a late answer for future corroboration
    pub fn absorb_late(
        &self,
        ledger: &mut Ledger,
        preferences: &Preferences,
        kind: DetectionSourceKind,
        outcome: Result<DetectionResult, DetectError>,
    ) {
        let Ok(result) = outcome else {
            return;
        };
        if preferences.is_preferred(&result.language) {
            debug!(
                session = %self.id,
                source = %kind,
                language = %result.language,
                "Remembering late remote answer"
            );
            ledger.record(result, &self.id);
        }
    }
}
