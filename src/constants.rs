//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Arbitration policy constants
pub mod arbitration {
    /// Local statistical confidence above which a preferred language is confirmed
    pub const CONFIRMED_CONFIDENCE: f64 = 0.8;

    /// Local statistical confidence above which a preferred language is used unconfirmed
    pub const LOW_CONFIDENCE: f64 = 0.2;

    /// Time budget for remote detection before falling back to the local result (milliseconds)
    pub const FALLBACK_TIMEOUT_MS: u64 = 2000;

    /// Upper bound for a single remote detector call (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 5000;
}

/// Corroboration store constants
pub mod corroboration {
    /// Maximum number of remote results kept for cross-session corroboration
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Maximum age of a remembered remote result (seconds)
    pub const DEFAULT_MAX_AGE_SECS: u64 = 600;
}

/// Local scorer constants
pub mod scorer {
    /// Number of ranked candidates produced by the statistical scorer
    pub const MAX_CANDIDATES: usize = 3;

    /// Texts shorter than this (in characters) carry no statistical signal
    pub const MIN_TEXT_CHARS: usize = 10;

    /// Best-guess confidence below which the scorer reports no candidates
    pub const MIN_TOP_CONFIDENCE: f64 = 0.3;
}

/// Circuit breaker constants
pub mod circuit_breaker {
    /// Number of failures before opening circuit
    pub const FAILURE_THRESHOLD: u32 = 3;

    /// Duration to wait before attempting recovery (seconds)
    pub const RECOVERY_TIMEOUT_SECS: u64 = 60;

    /// Maximum requests allowed in half-open state
    pub const HALF_OPEN_MAX_REQUESTS: u32 = 1;

    /// Success threshold to close circuit from half-open
    pub const SUCCESS_THRESHOLD: u32 = 1;
}

/// Language tags with special meaning
pub mod language {
    /// Undetermined language
    pub const AUTO: &str = "auto";

    /// English
    pub const ENGLISH: &str = "en";

    /// Simplified Chinese
    pub const CHINESE_SIMPLIFIED: &str = "zh-CHS";

    /// Traditional Chinese
    pub const CHINESE_TRADITIONAL: &str = "zh-CHT";
}

/// Apple NaturalLanguage detector defaults
pub mod apple {
    /// Program running the detection script
    pub const PROGRAM: &str = "osascript";

    /// JXA script printing the dominant language of `argv[0]` as a BCP-47 code
    pub const NATURAL_LANGUAGE_SCRIPT: &str = r#"ObjC.import('NaturalLanguage');
function run(argv) {
  const recognizer = $.NLLanguageRecognizer.alloc.init;
  recognizer.processString(argv[0]);
  const language = recognizer.dominantLanguage;
  return language.isNil() ? '' : ObjC.unwrap(language);
}"#;
}
