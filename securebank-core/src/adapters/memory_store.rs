//! In-process credential store
//!
//! Nothing survives the process. Used for ephemeral sessions and in tests,
//! where `set_available(false)` simulates device storage going away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, Profile};
use crate::ports::CredentialStore;

#[derive(Debug, Default)]
struct Slots {
    identity: Option<Identity>,
    biometric_enabled: bool,
    token: Option<String>,
    profile: Option<Profile>,
}

/// Credential store held in memory
#[derive(Debug)]
pub struct MemoryCredentialStore {
    slots: Mutex<Slots>,
    available: AtomicBool,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Start with a saved identity and preference, as after a previous login
    pub fn with_identity(identity: Identity, biometric_enabled: bool) -> Self {
        let store = Self::new();
        {
            let mut slots = store.lock();
            slots.identity = Some(identity);
            slots.biometric_enabled = biometric_enabled;
        }
        store
    }

    /// Toggle simulated storage availability
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slots(&self) -> Result<MutexGuard<'_, Slots>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::storage("device storage is unavailable"));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, identity: &Identity) -> Result<()> {
        self.slots()?.identity = Some(identity.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Identity>> {
        Ok(self.slots()?.identity.clone())
    }

    async fn set_biometric_preference(&self, enabled: bool) -> Result<()> {
        self.slots()?.biometric_enabled = enabled;
        Ok(())
    }

    async fn biometric_preference(&self) -> Result<bool> {
        Ok(self.slots()?.biometric_enabled)
    }

    async fn save_token(&self, token: &str) -> Result<()> {
        self.slots()?.token = Some(token.to_string());
        Ok(())
    }

    async fn load_token(&self) -> Result<Option<String>> {
        Ok(self.slots()?.token.clone())
    }

    async fn clear_token(&self) -> Result<()> {
        let mut slots = self.slots()?;
        slots.token = None;
        slots.profile = None;
        Ok(())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.slots()?.profile = Some(profile.clone());
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<Profile>> {
        Ok(self.slots()?.profile.clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.slots()? = Slots::default();
        Ok(())
    }
}
