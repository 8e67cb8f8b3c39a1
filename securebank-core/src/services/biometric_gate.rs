//! Biometric gate - capability checks and a single challenge

use std::sync::Arc;

use crate::ports::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt};

/// Wraps the platform authenticator with the app's prompt text.
///
/// Platform faults never escape: a failing `authenticate` call reads as
/// `Unavailable`, so callers only ever see an outcome.
#[derive(Clone)]
pub struct BiometricGate {
    authenticator: Arc<dyn BiometricAuthenticator>,
    prompt: BiometricPrompt,
}

impl BiometricGate {
    pub fn new(authenticator: Arc<dyn BiometricAuthenticator>) -> Self {
        Self {
            authenticator,
            prompt: BiometricPrompt::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: BiometricPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Name of the underlying platform
    pub fn provider(&self) -> &str {
        self.authenticator.name()
    }

    pub fn prompt(&self) -> &BiometricPrompt {
        &self.prompt
    }

    pub async fn is_supported(&self) -> bool {
        self.authenticator.has_hardware().await
    }

    pub async fn is_enrolled(&self) -> bool {
        self.authenticator.is_enrolled().await
    }

    /// Supported and enrolled
    pub async fn is_available(&self) -> bool {
        self.is_supported().await && self.is_enrolled().await
    }

    /// Run one challenge with the configured prompt
    pub async fn challenge(&self) -> BiometricOutcome {
        self.authenticator
            .authenticate(&self.prompt)
            .await
            .unwrap_or(BiometricOutcome::Unavailable)
    }
}

impl std::fmt::Debug for BiometricGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiometricGate")
            .field("provider", &self.authenticator.name())
            .field("prompt", &self.prompt)
            .finish()
    }
}
