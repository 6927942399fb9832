//! Local Detector Adapter
//!
//! Wraps a statistical language scorer and applies the local priority chain:
//!
//! 1. Top candidate above the confirmed threshold and preferred: confirmed
//! 2. First preferred candidate above the low threshold: unconfirmed
//! 3. Top candidate with a valid tag: unconfirmed
//! 4. Heuristic answer if preferred
//! 5. `auto`
//!
//! Each rule only applies when every rule above it produced nothing.

use std::sync::Arc;

use tracing::debug;
use whatlang::{Detector, Lang};

use crate::constants::scorer as scorer_constants;
use crate::language::{Preferences, catalog, heuristic};
use crate::types::{DetectionResult, DetectionSourceKind, RankedCandidate};

// =============================================================================
// Scorer Contract
// =============================================================================

/// Statistical language scorer
///
/// Returns normalized tags with confidences in `[0, 1]`, best first.
/// An empty list means no signal.
pub trait LanguageScorer: Send + Sync {
    fn score(&self, text: &str) -> Vec<RankedCandidate>;
}

/// Trigram scorer backed by `whatlang`
///
/// `whatlang` only reports its single best guess, so the ranking is built by
/// re-running detection with every previous winner removed from the allowlist,
/// then sorted by confidence. A text whose best guess is weaker than
/// [`scorer_constants::MIN_TOP_CONFIDENCE`] yields no candidates at all.
pub struct WhatlangScorer {
    allowlist: Vec<Lang>,
    max_candidates: usize,
    min_chars: usize,
    min_top_confidence: f64,
}

impl WhatlangScorer {
    pub fn new() -> Self {
        Self {
            allowlist: catalog::LANGUAGES
                .iter()
                .filter_map(|info| info.whatlang)
                .collect(),
            max_candidates: scorer_constants::MAX_CANDIDATES,
            min_chars: scorer_constants::MIN_TEXT_CHARS,
            min_top_confidence: scorer_constants::MIN_TOP_CONFIDENCE,
        }
    }
}

impl Default for WhatlangScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageScorer for WhatlangScorer {
    fn score(&self, text: &str) -> Vec<RankedCandidate> {
        if text.trim().chars().count() < self.min_chars {
            return Vec::new();
        }

        let mut remaining = self.allowlist.clone();
        let mut ranked = Vec::with_capacity(self.max_candidates);

        while ranked.len() < self.max_candidates && !remaining.is_empty() {
            let detector = Detector::with_allowlist(remaining.clone());
            let Some(info) = detector.detect(text) else {
                break;
            };
            if remaining.len() == self.allowlist.len()
                && info.confidence() < self.min_top_confidence
            {
                debug!(
                    lang = ?info.lang(),
                    confidence = info.confidence(),
                    "Statistical guess too weak, no candidates"
                );
                return Vec::new();
            }
            remaining.retain(|lang| *lang != info.lang());
            if let Some(tag) = catalog::from_whatlang(info.lang()) {
                ranked.push((tag.to_string(), info.confidence().clamp(0.0, 1.0)));
            }
        }

        // a re-run without the winner can report a higher confidence than the winner had
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

// =============================================================================
// Local Detector
// =============================================================================

/// Output of the local chain
#[derive(Debug, Clone)]
pub struct LocalDetection {
    /// The chain's verdict
    pub result: DetectionResult,
    /// Raw scorer ranking, kept for cross-checking remote answers
    pub ranked: Vec<RankedCandidate>,
}

/// Local detector applying the priority chain over a [`LanguageScorer`]
#[derive(Clone)]
pub struct LocalDetector {
    scorer: Arc<dyn LanguageScorer>,
    preferences: Arc<Preferences>,
    low_confidence: f64,
}

impl LocalDetector {
    pub fn new(
        scorer: Arc<dyn LanguageScorer>,
        preferences: Arc<Preferences>,
        low_confidence: f64,
    ) -> Self {
        Self {
            scorer,
            preferences,
            low_confidence,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Run the priority chain for `text`
    pub fn detect(&self, text: &str, confirmed_confidence: f64) -> LocalDetection {
        let ranked = self.scorer.score(text);
        let result = self.apply_chain(text, &ranked, confirmed_confidence);
        debug!(
            language = %result.language,
            source = %result.source,
            confirmed = result.confirmed,
            candidates = ranked.len(),
            "Local detection"
        );
        LocalDetection { result, ranked }
    }

    fn apply_chain(
        &self,
        text: &str,
        ranked: &[RankedCandidate],
        confirmed_confidence: f64,
    ) -> DetectionResult {
        if let Some((top_language, top_confidence)) = ranked.first() {
            let statistical =
                DetectionResult::new(DetectionSourceKind::Statistical, top_language, top_language)
                    .with_candidates(ranked.to_vec());

            if *top_confidence > confirmed_confidence
                && self.preferences.is_preferred(top_language)
            {
                return statistical.confirm();
            }

            if let Some((language, confidence)) = ranked
                .iter()
                .find(|(l, c)| *c > self.low_confidence && self.preferences.is_preferred(l))
            {
                debug!(
                    language = %language,
                    confidence,
                    "Preferred but unconfirmed statistical candidate"
                );
                return DetectionResult {
                    language: language.clone(),
                    ..statistical
                };
            }

            if catalog::is_valid_language_id(top_language) {
                return statistical;
            }
        }

        let simple = heuristic::detect(text, &self.preferences);
        if self.preferences.is_preferred(&simple.language) {
            return simple;
        }

        DetectionResult::auto()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Scorer returning a fixed ranking
    pub(crate) struct FixedScorer(pub Vec<RankedCandidate>);

    impl FixedScorer {
        pub(crate) fn new(ranked: &[(&str, f64)]) -> Self {
            Self(ranked.iter().map(|(l, c)| (l.to_string(), *c)).collect())
        }

        pub(crate) fn silent() -> Self {
            Self(Vec::new())
        }
    }

    impl LanguageScorer for FixedScorer {
        fn score(&self, _text: &str) -> Vec<RankedCandidate> {
            self.0.clone()
        }
    }

    fn detector(scorer: FixedScorer, preferred: &[&str]) -> LocalDetector {
        LocalDetector::new(
            Arc::new(scorer),
            Arc::new(Preferences::new(preferred.iter().copied())),
            0.2,
        )
    }

    #[test]
    fn test_confident_preferred_is_confirmed() {
        let local = detector(FixedScorer::new(&[("en", 0.95), ("fr", 0.1)]), &["en", "zh-CHS"]);
        let detection = local.detect("whatever", 0.8);
        assert!(detection.result.confirmed);
        assert_eq!(detection.result.language, "en");
        assert_eq!(detection.result.source, DetectionSourceKind::Statistical);
        assert_eq!(detection.ranked.len(), 2);
    }

    #[test]
    fn test_confident_non_preferred_is_not_confirmed() {
        let local = detector(FixedScorer::new(&[("fr", 0.95)]), &["en"]);
        let detection = local.detect("bonjour tout le monde", 0.8);
        assert!(!detection.result.confirmed);
        assert_eq!(detection.result.language, "fr");
    }

    #[test]
    fn test_low_confidence_preferred_candidate() {
        let local = detector(
            FixedScorer::new(&[("fr", 0.5), ("en", 0.3), ("de", 0.25)]),
            &["en", "de"],
        );
        let result = local.detect("text", 0.8).result;
        assert!(!result.confirmed);
        assert_eq!(result.language, "en");
        assert_eq!(result.raw_language, "fr");
        assert_eq!(result.candidates().len(), 3);
    }

    #[test]
    fn test_candidate_below_low_threshold_skipped() {
        let local = detector(FixedScorer::new(&[("xx", 0.9), ("en", 0.15)]), &["en"]);
        let result = local.detect("hello there", 0.8).result;
        // xx is not a valid tag, so the heuristic decides
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert_eq!(result.language, "en");
    }

    #[test]
    fn test_valid_top_candidate_used_unconfirmed() {
        let local = detector(FixedScorer::new(&[("it", 0.6)]), &["en"]);
        let result = local.detect("ciao a tutti", 0.8).result;
        assert_eq!(result.language, "it");
        assert!(!result.confirmed);
    }

    #[test]
    fn test_heuristic_fallback() {
        let local = detector(FixedScorer::silent(), &["en", "zh-CHS"]);
        let result = local.detect("hello world", 0.8).result;
        assert_eq!(result.language, "en");
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert!(!result.confirmed);

        let result = local.detect("你好", 0.8).result;
        assert_eq!(result.language, "zh-CHS");
        assert!(!result.confirmed);
    }

    #[test]
    fn test_auto_fallback() {
        let local = detector(FixedScorer::silent(), &["ja"]);
        let result = local.detect("hello world", 0.8).result;
        assert!(result.is_auto());
        assert!(!result.confirmed);
    }

    #[test]
    fn test_whatlang_scorer_short_text_is_silent() {
        let scorer = WhatlangScorer::new();
        assert!(scorer.score("hi").is_empty());
        assert!(scorer.score("你好").is_empty());
    }

    #[test]
    fn test_whatlang_scorer_ranks_english() {
        let scorer = WhatlangScorer::new();
        let ranked = scorer.score(
            "This is a fairly long English sentence that should be detected without any trouble at all.",
        );
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= scorer_constants::MAX_CANDIDATES);
        assert_eq!(ranked[0].0, "en");
        assert!(ranked.iter().all(|(_, c)| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn test_whatlang_scorer_weak_guess_is_silent() {
        let scorer = WhatlangScorer::new();
        for text in ["hello world", "Section Header"] {
            assert!(scorer.score(text).is_empty(), "{text} should carry no signal");
        }
    }

    #[test]
    fn test_whatlang_scorer_ranking_is_descending() {
        let scorer = WhatlangScorer::new();
        for text in [
            "This is a fairly long English sentence that should be detected without any trouble at all.",
            "Der schnelle braune Fuchs springt über den faulen Hund und läuft dann weiter in den Wald.",
            "Le renard brun rapide saute par-dessus le chien paresseux et court ensuite dans la forêt.",
        ] {
            let ranked = scorer.score(text);
            assert!(
                ranked.windows(2).all(|pair| pair[0].1 >= pair[1].1),
                "{text}: {ranked:?}"
            );
        }
    }

    #[test]
    fn test_short_english_falls_to_heuristic() {
        let local = LocalDetector::new(
            Arc::new(WhatlangScorer::new()),
            Arc::new(Preferences::new(["en", "zh-CHS"])),
            0.2,
        );
        let result = local.detect("hello world", 0.8).result;
        assert_eq!(result.language, "en");
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert!(!result.confirmed);
    }
}
