//! Detect Command
//!
//! Usage:
//!   langarbiter detect <TEXT>... [-f json] [--no-remote]
//!   echo "text" | langarbiter detect -

use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::config::Config;
use crate::detect::{Arbiter, CorroborationStore};
use crate::detect::remote::CircuitBreakerStats;
use crate::language::language_name;
use crate::types::{DetectionResult, Result};

#[derive(Debug, Serialize)]
struct DetectReport<'a> {
    text: &'a str,
    name: &'static str,
    elapsed_ms: u64,
    #[serde(flatten)]
    result: &'a DetectionResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    circuits: Vec<CircuitBreakerStats>,
}

/// Join the words given on the command line, or read stdin for `-`
pub fn resolve_text(words: &[String]) -> Result<String> {
    if words.len() == 1 && words[0] == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text.trim_end_matches(['\r', '\n']).to_string());
    }
    Ok(words.join(" "))
}

pub async fn run(config: &Config, words: &[String], format: OutputFormat, no_remote: bool) -> Result<()> {
    let text = resolve_text(words)?;

    let store = Arc::new(CorroborationStore::from_config(&config.corroboration));
    let mut engine = Arbiter::from_config(config, store)?;
    if no_remote {
        engine = engine.local_only();
    }
    debug!(remotes = ?engine.pool().kinds(), "Engine ready");

    let start = Instant::now();
    let result = engine.detect(&text).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match format {
        OutputFormat::Json => {
            let report = DetectReport {
                text: &text,
                name: language_name(&result.language),
                elapsed_ms,
                result: &result,
                circuits: engine.pool().circuit_stats(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let output = Output::new();
            output.verdict(&result);
            if !result.confirmed && !engine.pool().is_empty() {
                output.info(&format!(
                    "no confirmation from {} remote source(s) within {} ms",
                    engine.pool().kinds().len(),
                    engine.settings().fallback_timeout.as_millis()
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_text_joins_words() {
        let words = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(resolve_text(&words).unwrap(), "hello world");
        assert_eq!(resolve_text(&[]).unwrap(), "");
    }

    #[test]
    fn test_report_flattens_result() {
        let result = DetectionResult::new(crate::types::DetectionSourceKind::Baidu, "fra", "fr").confirm();
        let report = DetectReport {
            text: "bonjour",
            name: language_name(&result.language),
            elapsed_ms: 12,
            result: &result,
            circuits: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["language"], "fr");
        assert_eq!(json["name"], "French");
        assert_eq!(json["source"], "baidu");
        assert_eq!(json["confirmed"], true);
        assert!(json.get("circuits").is_none());
    }
}
