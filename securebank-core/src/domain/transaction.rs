//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::Error;

/// Direction of a transfer relative to the logged-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Incoming,
    Outgoing,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Incoming => "incoming",
            TransactionKind::Outgoing => "outgoing",
        }
    }

    /// Sign to show in front of the amount
    pub fn sign(&self) -> char {
        match self {
            TransactionKind::Incoming => '+',
            TransactionKind::Outgoing => '-',
        }
    }
}

/// The other side of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub alias: String,
    pub name: String,
}

/// A single transfer as listed by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    /// Always positive; direction lives in `kind`
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: String,
    /// ISO-8601 timestamp exactly as the server sent it
    pub timestamp: String,
    pub counterparty: Counterparty,
}

impl Transaction {
    /// Create a transaction with required fields
    pub fn new(id: i64, kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            id,
            description: String::new(),
            amount,
            kind,
            category: String::new(),
            timestamp: String::new(),
            counterparty: Counterparty {
                alias: String::new(),
                name: String::new(),
            },
        }
    }

    /// Amount with the direction applied (outgoing is negative)
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Incoming => self.amount,
            TransactionKind::Outgoing => -self.amount,
        }
    }

    /// Parse the timestamp, accepting RFC 3339, naive date-times and bare dates
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// Server-side filter applied to the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    #[default]
    All,
    Incoming,
    Outgoing,
}

impl FeedFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFilter::All => "all",
            FeedFilter::Incoming => "incoming",
            FeedFilter::Outgoing => "outgoing",
        }
    }

    /// The kind this filter restricts to, if any
    pub fn kind(&self) -> Option<TransactionKind> {
        match self {
            FeedFilter::All => None,
            FeedFilter::Incoming => Some(TransactionKind::Incoming),
            FeedFilter::Outgoing => Some(TransactionKind::Outgoing),
        }
    }

    pub fn matches(&self, kind: TransactionKind) -> bool {
        self.kind().map_or(true, |k| k == kind)
    }
}

impl fmt::Display for FeedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(FeedFilter::All),
            "incoming" | "in" | "received" => Ok(FeedFilter::Incoming),
            "outgoing" | "out" | "sent" => Ok(FeedFilter::Outgoing),
            other => Err(Error::validation(format!(
                "Unknown filter '{}': expected all, incoming or outgoing",
                other
            ))),
        }
    }
}

/// One page request against the transaction listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub filter: FeedFilter,
    pub query: String,
}

impl PageRequest {
    pub fn new(page: u32, filter: FeedFilter, query: impl Into<String>) -> Self {
        Self {
            page,
            filter,
            query: query.into(),
        }
    }

    pub fn first(filter: FeedFilter, query: impl Into<String>) -> Self {
        Self::new(1, filter, query)
    }
}
