//! Language Knowledge
//!
//! Normalized taxonomy, user preferences and the character-class heuristic.

pub mod catalog;
pub mod heuristic;
mod preferences;

pub use catalog::{LanguageInfo, is_valid_language_id, language_name};
pub use preferences::Preferences;
