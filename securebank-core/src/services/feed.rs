//! Feed controller - paginated, filterable transaction listing
//!
//! Every request is issued with a ticket recording the reset generation, page,
//! filter and query it was started under. A response is applied only if the
//! ticket still matches the state when it arrives; anything else is dropped
//! as stale. Refresh, filter and query changes bump the generation, which
//! supersedes every request issued before them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{FeedFilter, PageRequest, Session, Transaction};
use crate::ports::{BankApi, TransactionSource};
use crate::services::logging::{record, LogEvent, LoggingService};

/// Observable feed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedState {
    pub items: Vec<Transaction>,
    pub page: u32,
    pub filter: FeedFilter,
    pub query: String,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub exhausted: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            filter: FeedFilter::All,
            query: String::new(),
            is_loading: false,
            is_loading_more: false,
            is_refreshing: false,
            exhausted: false,
        }
    }
}

impl FeedState {
    /// Any request in flight
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more || self.is_refreshing
    }

    fn clear_flags(&mut self) {
        self.is_loading = false;
        self.is_loading_more = false;
        self.is_refreshing = false;
    }
}

/// What happened to a feed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOutcome {
    /// A non-empty page was applied
    Loaded { received: usize },
    /// An empty page, or a next page with no new items, was applied; the
    /// feed is exhausted
    Exhausted,
    /// `load_more` was a no-op
    Skipped,
    /// The response arrived after the state moved on and was dropped
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Initial,
    More,
    Refresh,
}

#[derive(Debug, Clone)]
struct Ticket {
    kind: RequestKind,
    generation: u64,
    request: PageRequest,
}

#[derive(Debug, Default)]
struct Inner {
    state: FeedState,
    generation: u64,
}

impl Inner {
    fn flag(&mut self, kind: RequestKind) -> &mut bool {
        match kind {
            RequestKind::Initial => &mut self.state.is_loading,
            RequestKind::More => &mut self.state.is_loading_more,
            RequestKind::Refresh => &mut self.state.is_refreshing,
        }
    }

    /// Start over at page 1 under a new generation
    fn reset(&mut self, kind: RequestKind) -> Ticket {
        self.generation += 1;
        self.state.clear_flags();
        self.state.page = 1;
        self.state.exhausted = false;
        *self.flag(kind) = true;
        self.ticket(kind)
    }

    fn ticket(&self, kind: RequestKind) -> Ticket {
        Ticket {
            kind,
            generation: self.generation,
            request: PageRequest::new(self.state.page, self.state.filter, self.state.query.clone()),
        }
    }

    fn is_current(&mut self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
            && ticket.request.page == self.state.page
            && ticket.request.filter == self.state.filter
            && ticket.request.query == self.state.query
            && *self.flag(ticket.kind)
    }

    /// Settle a request that did not deliver a page
    fn settle_without_page(&mut self, ticket: &Ticket) {
        *self.flag(ticket.kind) = false;
        if ticket.kind == RequestKind::More {
            self.state.page = self.state.page.saturating_sub(1).max(1);
        }
    }

    fn apply(&mut self, ticket: &Ticket, result: Result<Vec<Transaction>>) -> Result<FeedOutcome> {
        if !self.is_current(ticket) {
            return Ok(FeedOutcome::Discarded);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.settle_without_page(ticket);
                return Err(e);
            }
        };

        *self.flag(ticket.kind) = false;

        if ticket.kind != RequestKind::More {
            self.state.items.clear();
        }

        if page.is_empty() {
            self.state.exhausted = true;
            return Ok(FeedOutcome::Exhausted);
        }

        let received = page.len();
        let before = self.state.items.len();
        let mut seen: HashSet<i64> = self.state.items.iter().map(|tx| tx.id).collect();
        self.state
            .items
            .extend(page.into_iter().filter(|tx| seen.insert(tx.id)));

        // A next page with nothing new means the server ignores paging
        if ticket.kind == RequestKind::More && self.state.items.len() == before {
            self.state.exhausted = true;
            return Ok(FeedOutcome::Exhausted);
        }

        Ok(FeedOutcome::Loaded { received })
    }
}

/// A request in flight. Dropping it before it lands (cancelled future)
/// clears its loading flag so the feed does not stay stuck.
struct Flight<'a> {
    inner: &'a Mutex<Inner>,
    ticket: Ticket,
    landed: bool,
}

impl Flight<'_> {
    fn land(mut self, result: Result<Vec<Transaction>>) -> Result<FeedOutcome> {
        self.landed = true;
        let outcome = lock(self.inner).apply(&self.ticket, result);
        outcome
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.landed {
            let mut inner = lock(self.inner);
            if inner.is_current(&self.ticket) {
                inner.settle_without_page(&self.ticket);
            }
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives the transaction feed
pub struct FeedController {
    source: Arc<dyn TransactionSource>,
    inner: Mutex<Inner>,
    logger: Option<Arc<LoggingService>>,
}

impl FeedController {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner::default()),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FeedState {
        lock(&self.inner).state.clone()
    }

    pub fn items(&self) -> Vec<Transaction> {
        lock(&self.inner).state.items.clone()
    }

    async fn run(&self, ticket: Ticket) -> Result<FeedOutcome> {
        let request = ticket.request.clone();
        let kind = ticket.kind;
        let flight = Flight {
            inner: &self.inner,
            ticket,
            landed: false,
        };

        let result = self.source.fetch_page(&request).await;
        let outcome = flight.land(result);

        match &outcome {
            Err(e) => record(
                self.logger.as_deref(),
                LogEvent::new("feed_fetch_failed")
                    .with_screen("transactions")
                    .with_error(e.to_string())
                    .with_error_details(format!("{:?} page {}", kind, request.page)),
            ),
            Ok(FeedOutcome::Discarded) => record(
                self.logger.as_deref(),
                LogEvent::new("feed_response_discarded").with_screen("transactions"),
            ),
            Ok(_) => {}
        }

        outcome
    }

    /// Load page 1 for `filter` and `query`, replacing the items
    ///
    /// Only valid while no request is in flight.
    pub async fn initial_load(&self, filter: FeedFilter, query: &str) -> Result<FeedOutcome> {
        let ticket = {
            let mut inner = lock(&self.inner);
            if inner.state.is_busy() {
                return Err(Error::Busy);
            }
            inner.state.filter = filter;
            inner.state.query = query.to_string();
            inner.reset(RequestKind::Initial)
        };
        self.run(ticket).await
    }

    /// Fetch the next page and append it
    ///
    /// No-op while another request is in flight or once the feed is exhausted.
    pub async fn load_more(&self) -> Result<FeedOutcome> {
        let ticket = {
            let mut inner = lock(&self.inner);
            let state = &mut inner.state;
            if state.is_busy() || state.exhausted {
                return Ok(FeedOutcome::Skipped);
            }
            state.page += 1;
            state.is_loading_more = true;
            inner.ticket(RequestKind::More)
        };
        self.run(ticket).await
    }

    /// Re-fetch page 1, superseding any pending `load_more`
    pub async fn refresh(&self) -> Result<FeedOutcome> {
        let ticket = {
            let mut inner = lock(&self.inner);
            if inner.state.is_loading {
                return Err(Error::Busy);
            }
            inner.reset(RequestKind::Refresh)
        };
        self.run(ticket).await
    }

    /// Change the filter and reload from page 1
    pub async fn set_filter(&self, filter: FeedFilter) -> Result<FeedOutcome> {
        let ticket = {
            let mut inner = lock(&self.inner);
            inner.state.filter = filter;
            inner.reset(RequestKind::Initial)
        };
        self.run(ticket).await
    }

    /// Change the search text and reload from page 1
    pub async fn set_query(&self, query: &str) -> Result<FeedOutcome> {
        let ticket = {
            let mut inner = lock(&self.inner);
            inner.state.query = query.to_string();
            inner.reset(RequestKind::Initial)
        };
        self.run(ticket).await
    }
}

impl std::fmt::Debug for FeedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedController")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Transaction source bound to a session's token
pub struct SessionFeedSource {
    api: Arc<dyn BankApi>,
    token: String,
}

impl SessionFeedSource {
    pub fn new(api: Arc<dyn BankApi>, session: &Session) -> Self {
        Self {
            api,
            token: session.token.clone(),
        }
    }
}

#[async_trait]
impl TransactionSource for SessionFeedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Transaction>> {
        self.api.list_transactions(&self.token, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;
    use rust_decimal::Decimal;
    use std::collections::VecDeque;

    /// Replies from a queue, recording every request
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Vec<Transaction>>>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedSource {
        fn push(&self, reply: Result<Vec<Transaction>>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Transaction>> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn tx(id: i64) -> Transaction {
        Transaction::new(id, TransactionKind::Outgoing, Decimal::new(1000, 2))
    }

    fn page(ids: &[i64]) -> Result<Vec<Transaction>> {
        Ok(ids.iter().copied().map(tx).collect())
    }

    #[tokio::test]
    async fn test_load_more_appends_and_skips_duplicates() {
        let source = Arc::new(ScriptedSource::default());
        source.push(page(&[1, 2, 3]));
        source.push(page(&[3, 4]));
        let feed = FeedController::new(source.clone());

        feed.initial_load(FeedFilter::All, "").await.unwrap();
        let outcome = feed.load_more().await.unwrap();

        assert_eq!(outcome, FeedOutcome::Loaded { received: 2 });
        let ids: Vec<i64> = feed.items().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(feed.state().page, 2);
    }

    #[tokio::test]
    async fn test_failed_load_more_rolls_back_page() {
        let source = Arc::new(ScriptedSource::default());
        source.push(page(&[1, 2]));
        source.push(Err(Error::network("offline")));
        source.push(page(&[3]));
        let feed = FeedController::new(source.clone());

        feed.initial_load(FeedFilter::All, "").await.unwrap();
        assert!(matches!(feed.load_more().await, Err(Error::Network(_))));

        let state = feed.state();
        assert_eq!(state.page, 1);
        assert!(!state.is_busy());

        // The retry asks for the same page again
        feed.load_more().await.unwrap();
        let pages: Vec<u32> = source.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_failed_initial_load_clears_flag() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Err(Error::network("offline")));
        let feed = FeedController::new(source);

        assert!(feed.initial_load(FeedFilter::All, "").await.is_err());
        let state = feed.state();
        assert!(!state.is_loading);
        assert_eq!(state.page, 1);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_exhausted() {
        let source = Arc::new(ScriptedSource::default());
        let feed = FeedController::new(source.clone());

        assert_eq!(
            feed.initial_load(FeedFilter::Outgoing, "nothing").await.unwrap(),
            FeedOutcome::Exhausted
        );
        assert!(feed.state().exhausted);
        assert_eq!(feed.load_more().await.unwrap(), FeedOutcome::Skipped);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_and_query_changes_reset_and_reload() {
        let source = Arc::new(ScriptedSource::default());
        source.push(page(&[1, 2]));
        source.push(page(&[]));
        source.push(page(&[7]));
        source.push(page(&[8]));
        let feed = FeedController::new(source.clone());

        feed.initial_load(FeedFilter::All, "").await.unwrap();
        feed.load_more().await.unwrap();
        assert!(feed.state().exhausted);

        feed.set_filter(FeedFilter::Incoming).await.unwrap();
        let state = feed.state();
        assert!(!state.exhausted);
        assert_eq!(state.page, 1);
        assert_eq!(state.items.len(), 1);

        feed.set_query("aluguel").await.unwrap();
        let last = source.requests().pop().unwrap();
        assert_eq!(last, PageRequest::new(1, FeedFilter::Incoming, "aluguel"));
        assert_eq!(feed.items()[0].id, 8);
    }

    #[tokio::test]
    async fn test_refresh_replaces_items() {
        let source = Arc::new(ScriptedSource::default());
        source.push(page(&[1, 2]));
        source.push(page(&[3]));
        source.push(page(&[9, 1]));
        let feed = FeedController::new(source);

        feed.initial_load(FeedFilter::All, "").await.unwrap();
        feed.load_more().await.unwrap();
        feed.refresh().await.unwrap();

        let ids: Vec<i64> = feed.items().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![9, 1]);
        assert_eq!(feed.state().page, 1);
        assert!(!feed.state().is_refreshing);
    }
}
