//! File-backed credential store
//!
//! Keeps a single JSON record (`credentials.json`) in the app directory:
//! ```json
//! { "alias": "...", "secret": "...", "biometricEnabled": true, "token": "...", "profile": {...} }
//! ```
//!
//! Every mutation is a read-modify-write under an exclusive lock on
//! `credentials.lock`. The new record is written to a temp file in the same
//! directory and renamed over the old one, so readers see either the previous
//! record or the new one.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, Profile};
use crate::ports::CredentialStore;

const CREDENTIALS_FILE: &str = "credentials.json";
const LOCK_FILE: &str = "credentials.lock";

/// On-disk record. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(default)]
    biometric_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

impl CredentialRecord {
    fn identity(&self) -> Option<Identity> {
        match (&self.alias, &self.secret) {
            (Some(alias), Some(secret)) if !alias.is_empty() && !secret.is_empty() => {
                Some(Identity::new(alias.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

/// Credential store persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the credentials record
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    async fn read(&self) -> Result<CredentialRecord> {
        let dir = self.dir.clone();
        run_blocking(move || with_lock(&dir, false, || read_record(&dir.join(CREDENTIALS_FILE))))
            .await
    }

    async fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialRecord) + Send + 'static,
    {
        let dir = self.dir.clone();
        run_blocking(move || {
            with_lock(&dir, true, || {
                let path = dir.join(CREDENTIALS_FILE);
                let mut record = read_record(&path)?;
                mutate(&mut record);
                write_record(&dir, &path, &record)
            })
        })
        .await
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::storage(format!("credential store task failed: {}", e)))?
        .map_err(|e| Error::storage(format!("{:#}", e)))
}

/// Run `f` while holding the store lock (shared for reads, exclusive for writes)
fn with_lock<T>(dir: &Path, exclusive: bool, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create credential directory {:?}", dir))?;

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(dir.join(LOCK_FILE))
        .context("Failed to open credential lock file")?;

    if exclusive {
        FileExt::lock_exclusive(&lock_file)
    } else {
        FileExt::lock_shared(&lock_file)
    }
    .context("Failed to lock credential store")?;

    // Released when `lock_file` is dropped
    f()
}

/// Missing or unreadable records count as empty
fn read_record(path: &Path) -> anyhow::Result<CredentialRecord> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content).unwrap_or_default()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(CredentialRecord::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
    }
}

fn write_record(dir: &Path, path: &Path, record: &CredentialRecord) -> anyhow::Result<()> {
    // NamedTempFile is created owner-only (0600) on Unix
    let mut tmp = tempfile::NamedTempFile::new_in(dir).context("Failed to create temp file")?;
    let content = serde_json::to_string_pretty(record)?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write credentials")?;
    tmp.as_file().sync_all().context("Failed to flush credentials")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, identity: &Identity) -> Result<()> {
        let identity = identity.clone();
        self.update(move |record| {
            record.alias = Some(identity.alias);
            record.secret = Some(identity.secret);
        })
        .await
    }

    async fn load(&self) -> Result<Option<Identity>> {
        Ok(self.read().await?.identity())
    }

    async fn set_biometric_preference(&self, enabled: bool) -> Result<()> {
        self.update(move |record| record.biometric_enabled = enabled)
            .await
    }

    async fn biometric_preference(&self) -> Result<bool> {
        Ok(self.read().await?.biometric_enabled)
    }

    async fn save_token(&self, token: &str) -> Result<()> {
        let token = token.to_string();
        self.update(move |record| record.token = Some(token)).await
    }

    async fn load_token(&self) -> Result<Option<String>> {
        Ok(self.read().await?.token.filter(|t| !t.is_empty()))
    }

    async fn clear_token(&self) -> Result<()> {
        self.update(|record| {
            record.token = None;
            record.profile = None;
        })
        .await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<()> {
        let profile = profile.clone();
        self.update(move |record| record.profile = Some(profile)).await
    }

    async fn load_profile(&self) -> Result<Option<Profile>> {
        Ok(self.read().await?.profile)
    }

    async fn clear(&self) -> Result<()> {
        let dir = self.dir.clone();
        run_blocking(move || {
            with_lock(&dir, true, || {
                match fs::remove_file(dir.join(CREDENTIALS_FILE)) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e).context("Failed to remove credentials"),
                }
            })
        })
        .await
    }
}
