//! Preference Oracle
//!
//! Read-only view of the user's preferred languages. The arbitration engine
//! uses it as an acceptance filter; the order is kept for downstream display.

use crate::constants::language::{CHINESE_SIMPLIFIED, CHINESE_TRADITIONAL, ENGLISH};

use super::catalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    languages: Vec<String>,
}

impl Preferences {
    /// Build from normalized tags, dropping duplicates and keeping first-seen order.
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for language in languages {
            let language = language.into();
            if !ordered.contains(&language) {
                ordered.push(language);
            }
        }
        Self { languages: ordered }
    }

    pub fn is_preferred(&self, language: &str) -> bool {
        !language.is_empty() && self.languages.iter().any(|l| l == language)
    }

    pub fn contains_english(&self) -> bool {
        self.is_preferred(ENGLISH)
    }

    pub fn contains_chinese(&self) -> bool {
        self.is_preferred(CHINESE_SIMPLIFIED) || self.is_preferred(CHINESE_TRADITIONAL)
    }

    /// Preferred Chinese variant, simplified first
    pub fn chinese_variant(&self) -> Option<&'static str> {
        if self.is_preferred(CHINESE_SIMPLIFIED) {
            Some(CHINESE_SIMPLIFIED)
        } else if self.is_preferred(CHINESE_TRADITIONAL) {
            Some(CHINESE_TRADITIONAL)
        } else {
            None
        }
    }

    /// Preferred languages in display order
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Entries that are not valid catalog tags
    pub fn unknown_languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(|l| !catalog::is_valid_language_id(l))
            .collect()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new([CHINESE_SIMPLIFIED, ENGLISH])
    }
}
