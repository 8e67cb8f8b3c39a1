//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod bank_api;
mod biometric;
mod credential_store;

pub use bank_api::{BankApi, TransactionSource};
pub use biometric::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt};
pub use credential_store::CredentialStore;
