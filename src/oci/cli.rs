//! OCI CLI process runner.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::InventoryError;

/// Runs OCI CLI commands that print JSON.
#[async_trait]
pub trait CliRunner: Send + Sync {
    /// Run `oci <args>`. Returns `None` when the command printed nothing,
    /// which is how the CLI reports an empty list.
    async fn run_json(&self, args: &[String]) -> Result<Option<Value>, InventoryError>;
}

/// Process-backed runner for the `oci` executable.
#[derive(Debug, Clone)]
pub struct OciCli {
    bin: String,
    profile: Option<String>,
    config_file: Option<PathBuf>,
}

impl OciCli {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
            profile: None,
            config_file: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_config_file(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file;
        self
    }

    /// Flags appended to every invocation.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec!["--output".to_string(), "json".to_string()];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(path) = &self.config_file {
            args.push("--config-file".to_string());
            args.push(path.display().to_string());
        }
        args
    }
}

#[async_trait]
impl CliRunner for OciCli {
    async fn run_json(&self, args: &[String]) -> Result<Option<Value>, InventoryError> {
        let command = command_line(&self.bin, args);
        debug!("Running: {}", command);

        let output = Command::new(&self.bin)
            .args(args)
            .args(self.global_args())
            .output()
            .await
            .map_err(|e| InventoryError::OciCli {
                command: command.clone(),
                details: format!("failed to execute ({}). Is the OCI CLI installed?", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InventoryError::OciCli {
                command,
                details: stderr.trim().to_string(),
            });
        }

        parse_output(&command, &output.stdout)
    }
}

/// Human-readable command line for logs and errors.
pub fn command_line(bin: &str, args: &[String]) -> String {
    std::iter::once(bin)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse CLI stdout; blank output means "no results".
pub fn parse_output(command: &str, stdout: &[u8]) -> Result<Option<Value>, InventoryError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        debug!("Command produced no output: {}", command);
        return Ok(None);
    }

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| InventoryError::OciOutput {
            command: command.to_string(),
            details: e.to_string(),
        })
}
