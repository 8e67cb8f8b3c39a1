//! Configuration management
//!
//! Settings live in `<app dir>/settings.json`:
//! ```json
//! {
//!   "api": { "baseUrl": "https://...", "timeoutSecs": 30 },
//!   "biometrics": { "provider": "fprintd", "prompt": "...", "fallbackLabel": "..." }
//! }
//! ```
//! Keys this crate does not manage are kept when saving.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::bank_http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::ports::BiometricPrompt;

/// Environment override for the API base URL
pub const API_URL_ENV: &str = "SECUREBANK_API_URL";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    biometrics: BiometricSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BiometricSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<BiometricProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_label: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Which biometric platform to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricProvider {
    /// Linux fingerprint daemon
    Fprintd,
    /// Terminal confirmation prompt
    Console,
    None,
}

impl Default for BiometricProvider {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            BiometricProvider::Fprintd
        } else {
            BiometricProvider::None
        }
    }
}

impl BiometricProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricProvider::Fprintd => "fprintd",
            BiometricProvider::Console => "console",
            BiometricProvider::None => "none",
        }
    }
}

impl fmt::Display for BiometricProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiometricProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fprintd" => Ok(BiometricProvider::Fprintd),
            "console" => Ok(BiometricProvider::Console),
            "none" | "off" => Ok(BiometricProvider::None),
            other => bail!("Unknown biometric provider '{}': expected fprintd, console or none", other),
        }
    }
}

/// Secure Bank configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub biometric_provider: BiometricProvider,
    pub prompt: BiometricPrompt,
    /// Base URL came from the environment and is not written back
    url_from_env: bool,
    // Keep the raw settings for preservation when saving
    raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default(), None)
    }
}

impl Config {
    fn from_settings(raw: SettingsFile, url_override: Option<String>) -> Self {
        let defaults = BiometricPrompt::default();
        let url_override = url_override.filter(|u| !u.trim().is_empty());
        Self {
            url_from_env: url_override.is_some(),
            base_url: url_override
                .or_else(|| raw.api.base_url.clone())
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: raw
                .api
                .timeout_secs
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            biometric_provider: raw.biometrics.provider.unwrap_or_default(),
            prompt: BiometricPrompt {
                message: raw.biometrics.prompt.clone().unwrap_or(defaults.message),
                fallback_label: raw
                    .biometrics
                    .fallback_label
                    .clone()
                    .unwrap_or(defaults.fallback_label),
            },
            raw_settings: raw,
        }
    }

    fn read_settings(app_dir: &Path) -> Result<SettingsFile> {
        let settings_path = app_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(&settings_path)?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Load config from the app directory
    ///
    /// `SECUREBANK_API_URL` overrides the configured base URL.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(app_dir)?;
        let url_override = std::env::var(API_URL_ENV).ok();
        Ok(Self::from_settings(raw, url_override))
    }

    /// Save to the app directory, preserving keys this crate doesn't manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(app_dir)?;

        let mut settings = Self::read_settings(app_dir)?;
        for (key, value) in &self.raw_settings.other {
            settings.other.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if !self.url_from_env {
            settings.api.base_url = Some(self.base_url.clone());
        }
        settings.api.timeout_secs = Some(self.timeout_secs);
        settings.biometrics.provider = Some(self.biometric_provider);
        settings.biometrics.prompt = Some(self.prompt.message.clone());
        settings.biometrics.fallback_label = Some(self.prompt.fallback_label.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(app_dir.join("settings.json"), content)?;
        Ok(())
    }

    pub fn set_biometric_provider(&mut self, provider: BiometricProvider) {
        self.biometric_provider = provider;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let config = Config::from_settings(Config::read_settings(dir.path()).unwrap(), None);

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.prompt, BiometricPrompt::default());
    }

    #[test]
    fn test_reads_camel_case_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{
                "api": { "baseUrl": "http://localhost:3000", "timeoutSecs": 5 },
                "biometrics": { "provider": "console", "prompt": "Unlock", "fallbackLabel": "Senha" }
            }"#,
        )
        .unwrap();

        let config = Config::from_settings(Config::read_settings(dir.path()).unwrap(), None);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.biometric_provider, BiometricProvider::Console);
        assert_eq!(config.prompt.message, "Unlock");
        assert_eq!(config.prompt.fallback_label, "Senha");
    }

    #[test]
    fn test_url_override_wins() {
        let raw = SettingsFile {
            api: ApiSettings {
                base_url: Some("http://configured".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = Config::from_settings(raw, Some("http://override".to_string()));
        assert_eq!(config.base_url, "http://override");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{ "theme": "dark", "api": { "retries": 3 } }"#,
        )
        .unwrap();

        let mut config = Config::from_settings(Config::read_settings(dir.path()).unwrap(), None);
        config.set_biometric_provider(BiometricProvider::None);
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("settings.json")).unwrap())
                .unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["api"]["retries"], 3);
        assert_eq!(saved["biometrics"]["provider"], "none");
        assert_eq!(saved["api"]["timeoutSecs"], 30);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("fprintd".parse::<BiometricProvider>().unwrap(), BiometricProvider::Fprintd);
        assert_eq!("OFF".parse::<BiometricProvider>().unwrap(), BiometricProvider::None);
        assert!("faceid".parse::<BiometricProvider>().is_err());
    }
}
