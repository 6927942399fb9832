//! langarbiter - Language Detection Arbiter
//!
//! Determines the language of a text fragment by racing a local statistical
//! detector against several remote detection services under a latency
//! budget, and resolving disagreements between them deterministically.
//!
//! ## Core Features
//!
//! - **Local-first**: a confident, preferred local answer is final; no network
//! - **Remote race**: enabled services run concurrently, first consensus wins
//! - **Corroboration**: two services agreeing confirms an answer, across calls if configured
//! - **Latency budget**: the local answer is delivered when remotes are too slow
//! - **Circuit breakers**: failing services sit out until they recover
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use langarbiter::{Arbiter, ConfigLoader, CorroborationStore};
//!
//! let config = ConfigLoader::load()?;
//! let store = Arc::new(CorroborationStore::from_config(&config.corroboration));
//! let engine = Arbiter::from_config(&config, store)?;
//!
//! let result = engine.detect("Bonjour tout le monde").await;
//! println!("{}", result);
//! ```
//!
//! ## Modules
//!
//! - [`detect`]: local detector, remote pool, corroboration store, arbitration engine
//! - [`language`]: language catalog, preferences, character heuristic
//! - [`config`]: layered configuration
//! - [`types`]: detection results and errors

pub mod cli;
pub mod config;
pub mod constants;
pub mod detect;
pub mod language;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, CorroborationScope};

// Error Types
pub use types::error::{ArbiterError, DetectError, ErrorCategory, Result};

// Detection
pub use detect::{
    Arbiter, ArbiterSettings, CorroborationStore, LanguageScorer, LocalDetector, RemoteDetector,
    RemoteDetectorPool, WhatlangScorer,
};
pub use language::Preferences;
pub use types::{DetectionResult, DetectionSourceKind};
