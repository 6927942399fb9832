//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/langarbiter/config.toml)
//! 3. Project config (.langarbiter/config.toml)
//! 4. Environment variables (LANGARBITER_*, highest priority)
//!
//! `--config <file>` loads the built-in defaults plus that one file, nothing else.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
