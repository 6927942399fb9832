//! Local command detector
//!
//! Runs a configured program with the text as its last argument and reads
//! the provider-native language code from stdout. The default configuration
//! drives the macOS NaturalLanguage framework through `osascript`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::RemoteDetector;
use crate::config::CommandConfig;
use crate::language::catalog;
use crate::types::{
    ArbiterError, DetectError, DetectionResult, DetectionSourceKind, ErrorCategory,
    ErrorClassifier, Result,
};

#[derive(Debug)]
pub struct CommandDetector {
    kind: DetectionSourceKind,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDetector {
    pub fn new(kind: DetectionSourceKind, config: &CommandConfig, timeout: Duration) -> Result<Self> {
        if config.program.trim().is_empty() {
            return Err(ArbiterError::config(format!(
                "remote.{}.program must not be empty",
                kind
            )));
        }
        Ok(Self {
            kind,
            program: config.program.clone(),
            args: config.args.clone(),
            timeout,
        })
    }

    fn build(&self, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RemoteDetector for CommandDetector {
    fn kind(&self) -> DetectionSourceKind {
        self.kind
    }

    async fn detect(&self, text: &str) -> std::result::Result<DetectionResult, DetectError> {
        let child = self.build(text).spawn().map_err(|e| {
            DetectError::new(
                self.kind,
                ErrorCategory::Unavailable,
                format!("failed to spawn {}: {}", self.program, e),
            )
        })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DetectError::timeout(self.kind, self.timeout))?
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), self.kind))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(ErrorClassifier::classify(&message, self.kind));
        }

        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let language = catalog::normalize(self.kind, &raw).unwrap_or_default();
        debug!(source = %self.kind, raw = %raw, language = %language, "Command detection answered");

        Ok(DetectionResult::new(self.kind, raw, language))
    }
}
