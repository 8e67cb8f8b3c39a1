//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Biometric, auth, network and busy errors are recoverable: the caller falls
/// back to manual login or retries. Validation and storage errors abort the
/// operation before any state changes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Biometric authentication unavailable: {0}")]
    BiometricUnavailable(String),

    #[error("Biometric authentication cancelled")]
    BiometricCancelled,

    #[error("Biometric authentication failed")]
    BiometricFailed,

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Another authentication attempt is already in progress")]
    Busy,

    #[error("A session is already active; log out first")]
    SessionActive,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Whether the user can continue through another path (manual login, retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BiometricUnavailable(_)
                | Self::BiometricCancelled
                | Self::BiometricFailed
                | Self::AuthRejected(_)
                | Self::Network(_)
                | Self::Busy
        )
    }

    /// Whether this error came out of the biometric gate
    pub fn is_biometric(&self) -> bool {
        matches!(
            self,
            Self::BiometricUnavailable(_) | Self::BiometricCancelled | Self::BiometricFailed
        )
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Create a failed result with context
    pub fn fail_with_context(
        error: impl Into<String>,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                let mut context = HashMap::new();
                context.insert("recoverable".to_string(), serde_json::json!(e.is_recoverable()));
                Self::fail_with_context(e.to_string(), context)
            }
        }
    }
}
