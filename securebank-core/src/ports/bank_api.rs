//! Remote bank service port
//!
//! Defines the interface to the bank's HTTP API. The session and feed layers
//! depend on these traits only, so they can be driven by a scripted fake in
//! tests.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{AuthGrant, Identity, PageRequest, Registration, Transaction, TransferRequest};

/// Bank API operations
#[async_trait]
pub trait BankApi: Send + Sync {
    /// Exchange an identity for a bearer token
    ///
    /// A declined identity is `Error::AuthRejected` carrying the server's
    /// message; transport problems are `Error::Network`.
    async fn authenticate(&self, identity: &Identity) -> Result<AuthGrant>;

    /// Create a new account
    async fn register(&self, registration: &Registration) -> Result<()>;

    /// Current balance of the token's account
    async fn balance(&self, token: &str) -> Result<Decimal>;

    /// One page of the transaction listing; an empty page means no more data
    async fn list_transactions(&self, token: &str, request: &PageRequest)
        -> Result<Vec<Transaction>>;

    /// Send money to another alias
    async fn send_transfer(&self, token: &str, transfer: &TransferRequest) -> Result<()>;
}

/// Paged transaction source used by the feed controller
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Transaction>>;
}
