pub mod detection;
pub mod error;

pub use detection::{DetectionResult, DetectionSourceKind, RankedCandidate};
pub use error::{ArbiterError, DetectError, ErrorCategory, ErrorClassifier, Result};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for arbitration session IDs
///
/// Equality uses the full id; `Display` shows an 8-character prefix, which
/// appears in every log line of a detection call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    const DISPLAY_LEN: usize = 8;

    /// Fresh random session id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self
            .0
            .char_indices()
            .nth(Self::DISPLAY_LEN)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end]);
        f.write_str(short)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
