//! Fingerprint authentication through fprintd
//!
//! Shells out to the fprintd command line tools:
//! - `fprintd-list <user>` reports devices and enrolled fingers
//! - `fprintd-verify <user>` runs one verification, exiting 0 on a match
//!
//! A verify run ended by a signal, such as `pkill fprintd-verify` from
//! another terminal, counts as the user cancelling. Ctrl-C at the prompt goes
//! to the whole foreground process group and ends the command itself.

use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use crate::ports::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt};

const LIST_PROGRAM: &str = "fprintd-list";
const VERIFY_PROGRAM: &str = "fprintd-verify";

/// fprintd-backed authenticator
#[derive(Debug, Clone)]
pub struct FprintdAuthenticator {
    list_program: String,
    verify_program: String,
    user: Option<String>,
}

impl Default for FprintdAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl FprintdAuthenticator {
    /// Use the system fprintd tools for the current user
    pub fn new() -> Self {
        Self {
            list_program: LIST_PROGRAM.to_string(),
            verify_program: VERIFY_PROGRAM.to_string(),
            user: std::env::var("USER").ok().filter(|u| !u.is_empty()),
        }
    }

    /// Use custom programs in place of `fprintd-list` and `fprintd-verify`
    pub fn with_programs(list_program: impl Into<String>, verify_program: impl Into<String>) -> Self {
        Self {
            list_program: list_program.into(),
            verify_program: verify_program.into(),
            user: None,
        }
    }

    fn command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        if let Some(user) = &self.user {
            command.arg(user);
        }
        command.stdin(Stdio::null()).kill_on_drop(true);
        command
    }

    /// Output of `fprintd-list`, or None when the tool is missing or fails
    async fn list(&self) -> Option<String> {
        let output = self
            .command(&self.list_program)
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(unix)]
fn interrupted(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal().is_some()
}

#[cfg(not(unix))]
fn interrupted(_status: &ExitStatus) -> bool {
    false
}

/// Map a finished `fprintd-verify` run to an outcome
fn verify_outcome(status: &ExitStatus, stdout: &str) -> BiometricOutcome {
    if status.success() {
        BiometricOutcome::Success
    } else if interrupted(status) {
        BiometricOutcome::UserCancelled
    } else if stdout.contains("verify-disconnected") || stdout.contains("No devices available") {
        BiometricOutcome::Unavailable
    } else {
        BiometricOutcome::Failed
    }
}

#[async_trait]
impl BiometricAuthenticator for FprintdAuthenticator {
    fn name(&self) -> &str {
        "fprintd"
    }

    async fn has_hardware(&self) -> bool {
        match self.list().await {
            Some(out) => !out.contains("No devices available"),
            None => false,
        }
    }

    async fn is_enrolled(&self) -> bool {
        match self.list().await {
            Some(out) => out.lines().any(|l| l.trim_start().starts_with("- #")),
            None => false,
        }
    }

    async fn authenticate(&self, prompt: &BiometricPrompt) -> anyhow::Result<BiometricOutcome> {
        eprintln!(
            "{} ({} if the reader fails)",
            prompt.message,
            prompt.fallback_label.to_lowercase()
        );

        let output = self
            .command(&self.verify_program)
            .stderr(Stdio::inherit())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.verify_program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(verify_outcome(&output.status, &stdout))
    }
}

/// Authenticator for devices without biometric support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBiometrics;

#[async_trait]
impl BiometricAuthenticator for NoBiometrics {
    fn name(&self) -> &str {
        "none"
    }

    async fn has_hardware(&self) -> bool {
        false
    }

    async fn is_enrolled(&self) -> bool {
        false
    }

    async fn authenticate(&self, _prompt: &BiometricPrompt) -> anyhow::Result<BiometricOutcome> {
        Ok(BiometricOutcome::Unavailable)
    }
}
