//! CLI command implementations

pub mod account;
pub mod auth;
pub mod biometrics;
pub mod feed;
pub mod logs;
pub mod presence;
pub mod profile;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use securebank_core::adapters::{FprintdAuthenticator, NoBiometrics};
use securebank_core::config::{BiometricProvider, Config};
use securebank_core::ports::BiometricAuthenticator;
use securebank_core::services::{EntryPoint, LogEvent, LoggingService};
use securebank_core::{BankContext, Session};

use presence::ConsolePresence;

/// Environment override for the app directory
pub const APP_DIR_ENV: &str = "SECUREBANK_DIR";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let app_dir = get_app_dir().ok()?;
    std::fs::create_dir_all(&app_dir).ok()?;
    LoggingService::new(&app_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors (logging should never break a command)
pub fn log_event(ctx: &BankContext, event: LogEvent) {
    if let Some(l) = ctx.logger() {
        let _ = l.log(event);
    }
}

/// Record that `command` ran
pub fn log_command(ctx: &BankContext, command: &str) {
    if let Some(l) = ctx.logger() {
        let _ = l.log_command(command);
    }
}

/// Get the app directory from environment or default
pub fn get_app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(APP_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".securebank"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", APP_DIR_ENV))
}

/// Build the biometric platform selected in settings
pub fn authenticator_for(provider: BiometricProvider) -> Arc<dyn BiometricAuthenticator> {
    match provider {
        BiometricProvider::Fprintd => Arc::new(FprintdAuthenticator::new()),
        BiometricProvider::Console => Arc::new(ConsolePresence),
        BiometricProvider::None => Arc::new(NoBiometrics),
    }
}

/// Get or create the bank context
pub fn get_context() -> Result<BankContext> {
    let app_dir = get_app_dir()?;
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app directory: {:?}", app_dir))?;

    let config = Config::load(&app_dir)?;
    BankContext::new(&app_dir, authenticator_for(config.biometric_provider), get_logger())
        .context("Failed to initialize Secure Bank context")
}

/// Session persisted by an earlier `sb login` or `sb unlock`
pub async fn require_session(ctx: &BankContext) -> Result<Session> {
    ctx.sessions
        .resume()
        .await?
        .ok_or_else(|| anyhow!("Not logged in. Run 'sb login' or 'sb unlock' first."))
}
