//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/langarbiter/config.toml)
//! 3. Project config (.langarbiter/config.toml)
//! 4. Environment variables (LANGARBITER_* prefix, `__` between sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{ArbiterError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // LANGARBITER_REMOTE__TENCENT__API_KEY -> remote.tencent.api_key
        figment = figment.merge(Env::prefixed("LANGARBITER_").split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| ArbiterError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/langarbiter/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("langarbiter"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".langarbiter")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths and whether they exist
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration. Secrets are never included.
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| ArbiterError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ArbiterError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::write_default(&Self::project_dir(), force)
    }

    /// Write the commented default config into `dir`, returning the file path
    pub fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Default config content (TOML)
    fn default_config() -> &'static str {
        r#"# langarbiter configuration
# Project settings in .langarbiter/config.toml override the global file.
# Secrets belong in the environment, e.g. LANGARBITER_REMOTE__TENCENT__API_KEY.

version = "1.0"

[detection]
confirmed_confidence = 0.8
low_confidence = 0.2
fallback_timeout_ms = 2000

[preferences]
# Normalized tags, see `langarbiter languages`
languages = ["zh-CHS", "en"]

[corroboration]
capacity = 64
max_age_secs = 600
# "global" lets earlier calls corroborate new ones; "session" keeps calls independent
scope = "global"

[remote]
request_timeout_ms = 5000

[remote.tencent]
enabled = false
# endpoint = "https://gateway.example/tencent/detect"
language_field = "language"

[remote.baidu]
enabled = false
# endpoint = "https://gateway.example/baidu/detect"
language_field = "language"

[remote.apple]
# macOS only: NaturalLanguage through osascript
enabled = false

[remote.circuit_breaker]
failure_threshold = 3
success_threshold = 1
recovery_secs = 60
half_open_max_requests = 1
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorroborationScope;
    use tempfile::TempDir;

    #[test]
    fn test_default_file_loads_as_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.detection.fallback_timeout_ms, 2000);
        assert_eq!(config.preferences.languages, vec!["zh-CHS", "en"]);
        assert_eq!(
            config.remote.apple.program,
            crate::constants::apple::PROGRAM
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[preferences]
languages = ["ja", "en"]

[corroboration]
scope = "session"

[remote.baidu]
enabled = true
endpoint = "http://localhost:8080/detect"
language_field = "data.src"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.preferences.languages, vec!["ja", "en"]);
        assert_eq!(config.corroboration.scope, CorroborationScope::Session);
        assert!(config.remote.baidu.enabled);
        assert_eq!(config.remote.baidu.language_field, "data.src");
        // untouched sections keep defaults
        assert_eq!(config.corroboration.capacity, 64);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[detection]\nconfirmed_confidence = 0.1\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ArbiterError::Config(_)));
    }

    #[test]
    fn test_write_default_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_default(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[detection]"));
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml_out = ConfigLoader::render(&config, false).unwrap();
        assert!(toml_out.contains("[detection]"));

        let json_out = ConfigLoader::render(&config, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_out).unwrap();
        assert_eq!(parsed["corroboration"]["scope"], "global");
    }
}
