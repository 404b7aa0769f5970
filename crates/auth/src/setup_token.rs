//! One-time credential acquisition from the trusted Claude CLI.
//!
//! Runs `claude setup-token` and extracts the credential from its output.
//! The command is trusted local tooling; its only contract is the output
//! label followed by the credential value.

use async_trait::async_trait;
use maxline_types::{MaxlineError, traits::Result};
use std::time::Duration;
use tokio::process::Command;

/// Label preceding the credential in the CLI output.
pub const TOKEN_LABEL: &str = "OAuth token:";

/// Maximum time the CLI may take to produce a credential.
pub const SETUP_TOKEN_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_PROGRAM: &str = "claude";
const DEFAULT_ARGS: &[&str] = &["setup-token"];

/// Produces a one-time exchange credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Obtain a fresh one-time credential.
    async fn obtain(&self) -> Result<String>;
}

/// [`CredentialSource`] backed by the `claude setup-token` command.
pub struct ClaudeCliSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ClaudeCliSource {
    /// Creates a source invoking `claude setup-token` with the default
    /// timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(ToString::to_string).collect(),
            timeout: SETUP_TOKEN_TIMEOUT,
        }
    }

    /// Creates a source invoking an arbitrary command, for tests.
    pub fn with_command(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl Default for ClaudeCliSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialSource for ClaudeCliSource {
    async fn obtain(&self) -> Result<String> {
        let run = Command::new(&self.program).args(&self.args).output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => {
                return Err(MaxlineError::Auth(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                )));
            }
            Ok(Err(e)) => {
                return Err(MaxlineError::Auth(format!(
                    "failed to run {}: {e}; install the Claude CLI first",
                    self.program
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MaxlineError::Auth(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_setup_token_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the credential following the **last** [`TOKEN_LABEL`] occurrence.
///
/// # Errors
///
/// Returns an error if the label is absent or nothing follows it.
pub fn parse_setup_token_output(output: &str) -> Result<String> {
    let trimmed = output.trim();
    let token = trimmed
        .rfind(TOKEN_LABEL)
        .map(|idx| trimmed[idx + TOKEN_LABEL.len()..].trim());

    match token {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(MaxlineError::Auth(format!(
            "could not parse credential from setup-token output: {trimmed}"
        ))),
    }
}
