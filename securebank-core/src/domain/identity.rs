//! Identity domain model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Minimum accepted secret length
pub const MIN_SECRET_LEN: usize = 6;

/// The credential pair used to authenticate
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub alias: String,
    pub secret: String,
}

impl Identity {
    pub fn new(alias: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            secret: secret.into(),
        }
    }

    /// Validate and build an identity from user input
    ///
    /// Rejects an empty alias, an empty secret and secrets shorter than
    /// [`MIN_SECRET_LEN`] characters.
    pub fn parse(alias: &str, secret: &str) -> Result<Self> {
        let identity = Self::new(alias, secret);
        identity.validate()?;
        Ok(identity)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alias.trim().is_empty() || self.secret.is_empty() {
            return Err(Error::validation("Alias and secret are required"));
        }
        validate_secret(&self.secret)
    }
}

/// Check a secret against the length rule
pub fn validate_secret(secret: &str) -> Result<()> {
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(Error::validation(format!(
            "Secret must be at least {} characters",
            MIN_SECRET_LEN
        )));
    }
    Ok(())
}

// Keep secrets out of debug output and panics
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("alias", &self.alias)
            .field("secret", &"<redacted>")
            .finish()
    }
}
