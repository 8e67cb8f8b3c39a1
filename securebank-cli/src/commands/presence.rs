//! Console presence check - biometric stand-in for machines without a reader

use anyhow::{Context, Result};
use async_trait::async_trait;
use dialoguer::Confirm;
use securebank_core::ports::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt};

/// Asks the person at the terminal to confirm instead of scanning a finger.
///
/// Only counts as present hardware when stdin is an interactive terminal, so
/// scripted invocations fall back to manual login.
pub struct ConsolePresence;

#[async_trait]
impl BiometricAuthenticator for ConsolePresence {
    fn name(&self) -> &str {
        "console"
    }

    async fn has_hardware(&self) -> bool {
        atty::is(atty::Stream::Stdin)
    }

    async fn is_enrolled(&self) -> bool {
        true
    }

    async fn authenticate(&self, prompt: &BiometricPrompt) -> Result<BiometricOutcome> {
        let message = prompt.message.clone();
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(message).default(false).interact_opt()
        })
        .await
        .context("Presence prompt task failed")?
        .context("Could not read from terminal")?;

        Ok(match answer {
            Some(true) => BiometricOutcome::Success,
            Some(false) | None => BiometricOutcome::UserCancelled,
        })
    }
}
