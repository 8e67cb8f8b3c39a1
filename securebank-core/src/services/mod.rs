//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod biometric_gate;
mod feed;
pub mod logging;
mod session;

pub use account::AccountService;
pub use biometric_gate::BiometricGate;
pub use feed::{FeedController, FeedOutcome, FeedState, SessionFeedSource};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use session::{RestoreOutcome, SessionManager};
