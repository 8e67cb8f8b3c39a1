//! Credential store port - durable key-value persistence for login material

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Identity, Profile};

/// Durable storage for the saved identity, the biometric opt-in flag, the
/// current session token and the profile returned with it
///
/// Every key may be absent (first launch). Implementations must make writes
/// atomic at record level so no reader ever observes a half-written identity,
/// and must surface unavailable storage as `Error::Storage` instead of
/// swallowing it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist alias and secret, overwriting any prior values
    async fn save(&self, identity: &Identity) -> Result<()>;

    /// Stored identity; `None` if never saved or if either field is missing
    async fn load(&self) -> Result<Option<Identity>>;

    async fn set_biometric_preference(&self, enabled: bool) -> Result<()>;

    /// Stored opt-in flag, `false` when unset
    async fn biometric_preference(&self) -> Result<bool>;

    async fn save_token(&self, token: &str) -> Result<()>;

    async fn load_token(&self) -> Result<Option<String>>;

    /// Remove the token and the profile that came with it
    async fn clear_token(&self) -> Result<()>;

    async fn save_profile(&self, profile: &Profile) -> Result<()>;

    async fn load_profile(&self) -> Result<Option<Profile>>;

    /// Remove identity, preference, token and profile. Idempotent.
    async fn clear(&self) -> Result<()>;
}
