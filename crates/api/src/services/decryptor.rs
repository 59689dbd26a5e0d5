//! Client for the external workbook decrypt tool.
//!
//! The tool is opaque: it takes the encrypted file, a password and the data
//! start row, and prints a single JSON object on stdout. `ok: true` means
//! success regardless of exit code; stderr may carry warnings either way.
//! A run that exceeds the configured timeout is fatal and never retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use uuid::Uuid;

use domain::error::IngestError;

use crate::config::DecryptConfig;

/// Plaintext outputs produced by one decrypt run.
#[derive(Debug, Clone)]
pub struct DecryptedPaths {
    pub xlsx: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ToolOutput {
    #[serde(default)]
    ok: bool,
    xlsx: Option<String>,
    csv: Option<String>,
    json: Option<String>,
    error: Option<String>,
}

/// Spawns the decrypt tool and interprets its stdout contract.
#[derive(Clone)]
pub struct ExcelDecryptor {
    config: DecryptConfig,
}

impl ExcelDecryptor {
    pub fn new(config: DecryptConfig) -> Self {
        Self { config }
    }

    /// Decrypt one workbook. Returns the plaintext output paths.
    pub async fn decrypt(
        &self,
        input: &Path,
        password: &str,
        start_row: u32,
    ) -> Result<DecryptedPaths, IngestError> {
        if !input.is_file() {
            return Err(IngestError::Decrypt(format!(
                "file not found: {}",
                input.display()
            )));
        }

        let out_prefix = std::env::temp_dir().join(format!("ohx_{}", Uuid::new_v4().simple()));

        let run = Command::new(&self.config.python_bin)
            .arg(&self.config.script)
            .arg("--in")
            .arg(input.as_os_str())
            .arg("--password")
            .arg(password)
            .arg("--out")
            .arg(out_prefix.as_os_str())
            .arg("--start-row")
            .arg(start_row.to_string())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), run)
            .await
            .map_err(|_| {
                IngestError::Decrypt(format!(
                    "decrypt tool timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| IngestError::Decrypt(format!("failed to run decrypt tool: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            // stderr may be a warning even on success; keep it for operators
            tracing::warn!(exit_code = ?output.status.code(), stderr = %stderr, "decrypt tool stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_tool_output(&stdout).map_err(|tool_error| {
            let detail = if tool_error.is_empty() { stderr } else { tool_error };
            if detail.is_empty() {
                IngestError::Decrypt("unknown decrypt error".to_string())
            } else {
                IngestError::Decrypt(detail)
            }
        })
    }
}

/// Extract and interpret the JSON object from the tool's stdout.
///
/// The error side carries the tool-reported message, or an empty string when
/// the output was unintelligible.
fn parse_tool_output(stdout: &str) -> Result<DecryptedPaths, String> {
    let (start, end) = match (stdout.find('{'), stdout.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(String::new()),
    };

    let parsed: ToolOutput =
        serde_json::from_str(&stdout[start..=end]).map_err(|_| String::new())?;

    if parsed.ok {
        match (parsed.xlsx, parsed.csv, parsed.json) {
            (Some(xlsx), Some(csv), Some(json)) => Ok(DecryptedPaths {
                xlsx: PathBuf::from(xlsx),
                csv: PathBuf::from(csv),
                json: PathBuf::from(json),
            }),
            _ => Err("decrypt tool reported ok without output paths".to_string()),
        }
    } else {
        Err(parsed.error.unwrap_or_default())
    }
}
