//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - JSON file for the CredentialStore port (in-memory variant for tests)
//! - Secure Bank HTTP client for BankApi
//! - fprintd command line tools for BiometricAuthenticator

pub mod bank_http;
pub mod file_store;
pub mod fprintd;
pub mod memory_store;

#[cfg(test)]
pub mod mock_bank;

pub use bank_http::HttpBankApi;
pub use file_store::FileCredentialStore;
pub use fprintd::{FprintdAuthenticator, NoBiometrics};
pub use memory_store::MemoryCredentialStore;
