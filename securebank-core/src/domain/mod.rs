//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod identity;
mod session;
mod transaction;
pub mod result;

pub use account::{Registration, TransferRequest, DEFAULT_CATEGORIES, DEFAULT_TRANSFER_DESCRIPTION};
pub use identity::{validate_secret, Identity, MIN_SECRET_LEN};
pub use session::{AuthGrant, Profile, Session, SessionState};
pub use transaction::{Counterparty, FeedFilter, PageRequest, Transaction, TransactionKind};
