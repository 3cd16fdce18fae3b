//! External-program analyzer.
//!
//! Runs a configured program with the CSV path as its last argument and
//! parses whatever it prints on stdout as JSON. This is how an existing
//! model script (for example a Python entry point) is plugged in:
//!
//! ```text
//! risklens serve --analyzer command \
//!     --analyzer-command python3 --analyzer-arg model.py
//! ```

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use super::ThreatAnalyzer;
use crate::error::AnalysisError;

/// Longest stderr excerpt carried in a [`AnalysisError::CommandFailed`].
const STDERR_EXCERPT_LIMIT: usize = 2048;

/// Analyzer backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAnalyzer {
    /// Create an analyzer that runs `program args... <csv_path>`.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(STDERR_EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[async_trait]
impl ThreatAnalyzer for CommandAnalyzer {
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError> {
        if !csv_path.exists() {
            return Err(AnalysisError::DatasetNotFound(csv_path.to_path_buf()));
        }

        let started = Instant::now();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(csv_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalysisError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AnalysisError::Timeout(self.timeout))?
            .map_err(|e| AnalysisError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = excerpt(&output.stderr);
            warn!(
                program = %self.program,
                status = %output.status,
                "Analyzer command failed"
            );
            return Err(AnalysisError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        debug!(
            program = %self.program,
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = output.stdout.len(),
            "Analyzer command finished"
        );

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AnalysisError::InvalidOutput(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
