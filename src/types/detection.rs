//! Detection result types shared by every detector and the arbitration engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::language::AUTO;

/// Identity of a detection source.
///
/// The declaration order is the stable ordering used when sources are
/// compared or listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSourceKind {
    /// Character-class heuristic
    Simple,
    /// Local n-gram scorer
    Statistical,
    /// Tencent language detection API
    Tencent,
    /// Baidu language detection API
    Baidu,
    /// Apple NaturalLanguage framework (macOS)
    Apple,
}

impl DetectionSourceKind {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Tencent | Self::Baidu | Self::Apple)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Statistical => "statistical",
            Self::Tencent => "tencent",
            Self::Baidu => "baidu",
            Self::Apple => "apple",
        }
    }
}

impl fmt::Display for DetectionSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DetectionSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "statistical" => Ok(Self::Statistical),
            "tencent" => Ok(Self::Tencent),
            "baidu" => Ok(Self::Baidu),
            "apple" => Ok(Self::Apple),
            _ => Err(format!(
                "Unknown detection source: {}. Valid values: simple, statistical, tencent, baidu, apple",
                s
            )),
        }
    }
}

/// A ranked `(normalized tag, confidence)` pair from the statistical scorer
pub type RankedCandidate = (String, f64);

/// Canonical unit passed between detectors and the arbitration engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Which detector produced this result
    pub source: DetectionSourceKind,
    /// Provider-native language code ("" on failure)
    pub raw_language: String,
    /// Normalized language tag ("" if unmapped)
    pub language: String,
    /// Certified final by the arbitration policy
    pub confirmed: bool,
    /// Ranked candidates, statistical detector only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranked_candidates: Option<Vec<RankedCandidate>>,
}

impl DetectionResult {
    pub fn new(
        source: DetectionSourceKind,
        raw_language: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            source,
            raw_language: raw_language.into(),
            language: language.into(),
            confirmed: false,
            ranked_candidates: None,
        }
    }

    /// Same-shape result standing in for a failed detector
    pub fn empty(source: DetectionSourceKind) -> Self {
        Self::new(source, "", "")
    }

    /// Terminal fallback: language undetermined
    pub fn auto() -> Self {
        Self::new(DetectionSourceKind::Simple, "", AUTO)
    }

    pub fn with_candidates(mut self, candidates: Vec<RankedCandidate>) -> Self {
        self.ranked_candidates = Some(candidates);
        self
    }

    /// Mark as confirmed. There is no way back.
    pub fn confirm(mut self) -> Self {
        self.confirmed = true;
        self
    }

    pub fn is_auto(&self) -> bool {
        self.language == AUTO
    }

    pub fn candidates(&self) -> &[RankedCandidate] {
        self.ranked_candidates.as_deref().unwrap_or(&[])
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} ({})",
            if self.language.is_empty() {
                "<none>"
            } else {
                &self.language
            },
            self.source,
            if self.confirmed {
                "confirmed"
            } else {
                "unconfirmed"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_ordering() {
        assert!(DetectionSourceKind::Simple < DetectionSourceKind::Statistical);
        assert!(DetectionSourceKind::Statistical < DetectionSourceKind::Tencent);
        assert!(DetectionSourceKind::Baidu < DetectionSourceKind::Apple);
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(
            "Baidu".parse::<DetectionSourceKind>().unwrap(),
            DetectionSourceKind::Baidu
        );
        assert!("google".parse::<DetectionSourceKind>().is_err());
        assert!(DetectionSourceKind::Apple.is_remote());
        assert!(!DetectionSourceKind::Statistical.is_remote());
    }

    #[test]
    fn test_result_constructors() {
        let empty = DetectionResult::empty(DetectionSourceKind::Tencent);
        assert!(empty.language.is_empty());
        assert!(!empty.confirmed);

        let auto = DetectionResult::auto();
        assert!(auto.is_auto());
        assert_eq!(auto.source, DetectionSourceKind::Simple);

        let confirmed = DetectionResult::new(DetectionSourceKind::Baidu, "jp", "ja").confirm();
        assert!(confirmed.confirmed);
        assert_eq!(confirmed.to_string(), "ja via baidu (confirmed)");
    }

    #[test]
    fn test_result_serialization_skips_missing_candidates() {
        let result = DetectionResult::new(DetectionSourceKind::Tencent, "fr", "fr");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "tencent");
        assert!(json.get("ranked_candidates").is_none());
    }
}
