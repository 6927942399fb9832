//! Simple Heuristic Detector
//!
//! Character-class check used as the last rung of the local priority chain.
//! Never confirms anything.

use crate::constants::language::{AUTO, ENGLISH};
use crate::types::{DetectionResult, DetectionSourceKind};

use super::Preferences;

/// ASCII letters or digits, optionally mixed with whitespace and punctuation.
pub fn is_english_or_number(text: &str) -> bool {
    let mut has_alphanumeric = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            has_alphanumeric = true;
        } else if !(c.is_whitespace() || c.is_ascii_punctuation()) {
            return false;
        }
    }
    has_alphanumeric
}

/// Contains at least one CJK ideograph.
pub fn is_chinese(text: &str) -> bool {
    text.chars().any(is_cjk_ideograph)
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'     // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'   // Extension A
        | '\u{F900}'..='\u{FAFF}'   // Compatibility Ideographs
        | '\u{20000}'..='\u{2A6DF}' // Extension B
    )
}

/// Classify `text` as English, Chinese or `auto`.
///
/// English and Chinese are only reported when they are preferred.
pub fn detect(text: &str, preferences: &Preferences) -> DetectionResult {
    let language = if is_english_or_number(text) && preferences.contains_english() {
        ENGLISH
    } else if is_chinese(text)
        && let Some(variant) = preferences.chinese_variant()
    {
        variant
    } else {
        AUTO
    };

    tracing::debug!(language, "Simple heuristic detection");
    DetectionResult::new(DetectionSourceKind::Simple, language, language)
}
