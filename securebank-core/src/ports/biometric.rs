//! Biometric platform port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text shown by the platform prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricPrompt {
    pub message: String,
    /// Label of the "use password instead" action, where the platform has one
    pub fallback_label: String,
}

impl Default for BiometricPrompt {
    fn default() -> Self {
        Self {
            message: "Authenticate to continue".to_string(),
            fallback_label: "Use password".to_string(),
        }
    }
}

/// Result of a single biometric challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricOutcome {
    Success,
    UserCancelled,
    Failed,
    Unavailable,
}

/// Platform biometric API (fingerprint reader, face unlock, ...)
///
/// A user declining or failing the prompt is an ordinary outcome. `Err` is
/// reserved for platform-level faults; callers treat it as `Unavailable`.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Platform name (e.g., "fprintd", "console")
    fn name(&self) -> &str;

    /// Device has the required hardware
    async fn has_hardware(&self) -> bool;

    /// User registered at least one biometric credential with the OS
    async fn is_enrolled(&self) -> bool;

    /// Run one blocking challenge
    async fn authenticate(&self, prompt: &BiometricPrompt) -> anyhow::Result<BiometricOutcome>;
}
