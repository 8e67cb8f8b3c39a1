//! Secure Bank Core - session, credential and transaction feed logic
//!
//! This crate implements the client core following hexagonal architecture:
//!
//! - **domain**: Core entities (Identity, Session, Transaction, FeedFilter, ...)
//! - **ports**: Trait definitions for external dependencies (CredentialStore,
//!   BankApi, BiometricAuthenticator)
//! - **services**: Session manager, feed controller, account and logging services
//! - **adapters**: Concrete implementations (JSON file store, HTTP client, fprintd)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::{FileCredentialStore, HttpBankApi};
use config::Config;
use ports::{BankApi, BiometricAuthenticator, CredentialStore};
use services::{AccountService, BiometricGate, FeedController, LoggingService, SessionFeedSource, SessionManager};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{FeedFilter, Identity, Session, SessionState, Transaction, TransactionKind};

/// Main context for Secure Bank operations
///
/// Wires configuration, the credential store, the HTTP client and the
/// services around them.
pub struct BankContext {
    pub config: Config,
    pub app_dir: PathBuf,
    pub api: Arc<dyn BankApi>,
    pub store: Arc<dyn CredentialStore>,
    pub sessions: SessionManager,
    pub accounts: AccountService,
    logger: Option<Arc<LoggingService>>,
}

impl BankContext {
    /// Create a context rooted at `app_dir`
    pub fn new(
        app_dir: &Path,
        authenticator: Arc<dyn BiometricAuthenticator>,
        logger: Option<Arc<LoggingService>>,
    ) -> Result<Self> {
        let config = Config::load(app_dir)?;

        let api: Arc<dyn BankApi> =
            Arc::new(HttpBankApi::new_with_base_url(&config.base_url, config.timeout_secs)?);
        let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(app_dir));
        let gate = BiometricGate::new(authenticator).with_prompt(config.prompt.clone());

        let mut sessions = SessionManager::new(Arc::clone(&store), Arc::clone(&api), gate);
        let mut accounts = AccountService::new(Arc::clone(&api));
        if let Some(logger) = &logger {
            sessions = sessions.with_logger(Arc::clone(logger));
            accounts = accounts.with_logger(Arc::clone(logger));
        }

        Ok(Self {
            config,
            app_dir: app_dir.to_path_buf(),
            api,
            store,
            sessions,
            accounts,
            logger,
        })
    }

    /// Event log shared by the services, when one could be opened
    pub fn logger(&self) -> Option<&Arc<LoggingService>> {
        self.logger.as_ref()
    }

    /// Transaction feed bound to `session`
    pub fn feed(&self, session: &Session) -> FeedController {
        let source = SessionFeedSource::new(Arc::clone(&self.api), session);
        let feed = FeedController::new(Arc::new(source));
        match &self.logger {
            Some(logger) => feed.with_logger(Arc::clone(logger)),
            None => feed,
        }
    }
}
