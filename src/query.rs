//! Keyed async queries with a private TTL cache.
//!
//! Inspired by TanStack Query, a `Query<K, T>` keeps `{ data, loading, error }`
//! in sync with the backend for a key the caller controls (a date, a month,
//! a status filter). Each instance owns:
//!
//! - a cache of past results, keyed by [`QueryKey::cache_key`], with a TTL
//! - at most one request in flight; starting a new one aborts the old one
//! - a token check so a response for a superseded request never lands
//!
//! Results come back over a channel and are applied in [`Query::poll`], which
//! the UI calls on every tick. Dropping the query aborts its request.
//!
//! # Example
//!
//! ```ignore
//! let api = api.clone();
//! let mut query = Query::new(move |date: NaiveDate| {
//!     let api = api.clone();
//!     async move { api.earnings().daily(date).await }
//! });
//!
//! query.set_key(today);       // starts loading (or serves the cache)
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Ready(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use chrono::NaiveDate;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::api::types::PaymentStatus;
use crate::api::RequestError;
use crate::period::Month;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// Keys
// ============================================================================

/// Request parameters that identify a cached result.
pub trait QueryKey: Clone + Send + 'static {
  /// Deterministic cache key for these parameters
  fn cache_key(&self) -> String;
}

impl QueryKey for String {
  fn cache_key(&self) -> String {
    self.clone()
  }
}

impl QueryKey for NaiveDate {
  fn cache_key(&self) -> String {
    self.format("%Y-%m-%d").to_string()
  }
}

impl QueryKey for Month {
  fn cache_key(&self) -> String {
    self.to_string()
  }
}

impl QueryKey for PaymentStatus {
  fn cache_key(&self) -> String {
    self.as_str().to_string()
  }
}

/// Unparameterized resources (e.g. the whole inventory)
impl QueryKey for () {
  fn cache_key(&self) -> String {
    "all".to_string()
  }
}

// ============================================================================
// State
// ============================================================================

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// No key yet
  Idle,
  /// A request is in flight
  Loading,
  /// Data present, nothing in flight
  Ready(T),
  /// The last request failed
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, QueryState::Ready(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Ready(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Cache lifetime settings.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  /// How long a cached result may be served without a request
  pub ttl: Duration,
  /// How often expired entries are swept out
  pub sweep_interval: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      ttl: DEFAULT_TTL,
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
    }
  }
}

// ============================================================================
// Cache
// ============================================================================

#[derive(Debug)]
struct CacheEntry<T> {
  value: T,
  stored_at: Instant,
}

/// Per-query result cache. Entries are fresh while younger than the TTL.
#[derive(Debug)]
pub struct QueryCache<T> {
  entries: HashMap<String, CacheEntry<T>>,
  ttl: Duration,
}

impl<T> QueryCache<T> {
  fn new(ttl: Duration) -> Self {
    Self {
      entries: HashMap::new(),
      ttl,
    }
  }

  fn get_fresh(&self, key: &str, now: Instant) -> Option<&T> {
    self
      .entries
      .get(key)
      .filter(|entry| now.duration_since(entry.stored_at) < self.ttl)
      .map(|entry| &entry.value)
  }

  fn insert(&mut self, key: String, value: T, now: Instant) {
    self.entries.insert(
      key,
      CacheEntry {
        value,
        stored_at: now,
      },
    );
  }

  fn remove(&mut self, key: &str) -> bool {
    self.entries.remove(key).is_some()
  }

  /// Drop every entry whose age has reached the TTL. Returns how many went.
  fn sweep(&mut self, now: Instant) -> usize {
    let before = self.entries.len();
    let ttl = self.ttl;
    self
      .entries
      .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
    before - self.entries.len()
  }

  fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

// ============================================================================
// Query
// ============================================================================

/// A factory that starts a fetch for a key
type Fetcher<K, T> = Box<dyn Fn(K) -> BoxFuture<'static, Result<T, RequestError>> + Send + Sync>;

/// A settled request, tagged with the token it was issued under
struct Completion<T> {
  token: u64,
  key: String,
  result: Result<T, RequestError>,
}

struct InFlight {
  token: u64,
  key: String,
  handle: JoinHandle<()>,
}

/// Keyed async query with caching and superseding requests.
pub struct Query<K, T> {
  state: QueryState<T>,
  fetcher: Fetcher<K, T>,
  key: Option<K>,
  cache: QueryCache<T>,
  in_flight: Option<InFlight>,
  next_token: u64,
  tx: mpsc::UnboundedSender<Completion<T>>,
  rx: mpsc::UnboundedReceiver<Completion<T>>,
  sweep_interval: Duration,
  last_sweep: Instant,
}

impl<K: QueryKey, T: Clone + Send + 'static> Query<K, T> {
  /// Create an idle query around a fetcher.
  ///
  /// The fetcher is called once per network request with the current key.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
  {
    let options = QueryOptions::default();
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move |key| Box::pin(fetcher(key))),
      key: None,
      cache: QueryCache::new(options.ttl),
      in_flight: None,
      next_token: 0,
      tx,
      rx,
      sweep_interval: options.sweep_interval,
      last_sweep: Instant::now(),
    }
  }

  /// Override TTL and sweep interval. Call before the first key is set.
  pub fn with_options(mut self, options: QueryOptions) -> Self {
    self.cache.ttl = options.ttl;
    self.sweep_interval = options.sweep_interval;
    self
  }

  /// Set the initial key and start loading right away.
  pub fn with_key(mut self, key: K) -> Self {
    self.set_key(key);
    self
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  #[cfg(test)]
  pub fn cache(&self) -> &QueryCache<T> {
    &self.cache
  }

  /// Point the query at a new key.
  ///
  /// A fresh cache entry is served immediately without a request. Setting
  /// the key it already has is a no-op.
  pub fn set_key(&mut self, key: K) {
    let same = self
      .key
      .as_ref()
      .is_some_and(|current| current.cache_key() == key.cache_key());
    if same {
      return;
    }
    self.key = Some(key);
    self.load();
  }

  /// Drop the cached result for the current key and fetch it again.
  pub fn refetch(&mut self) {
    let Some(key) = &self.key else {
      return;
    };
    self.cache.remove(&key.cache_key());
    self.load();
  }

  /// Forget every cached result, e.g. after a write that touched other keys.
  ///
  /// The visible state stays as it is until the next key change or refetch.
  pub fn invalidate_all(&mut self) {
    self.cache.clear();
  }

  /// Apply settled requests and run the periodic sweep.
  ///
  /// Returns `true` if the visible state changed.
  pub fn poll(&mut self) -> bool {
    let now = Instant::now();

    if now.duration_since(self.last_sweep) >= self.sweep_interval {
      let removed = self.cache.sweep(now);
      if removed > 0 {
        debug!(removed, "Swept expired query cache entries");
      }
      self.last_sweep = now;
    }

    let mut changed = false;
    while let Ok(completion) = self.rx.try_recv() {
      changed |= self.apply(completion, now);
    }
    changed
  }

  fn load(&mut self) {
    let Some(key) = self.key.clone() else {
      return;
    };
    let cache_key = key.cache_key();

    // Whatever was in flight belongs to an older key or an older refetch
    self.cancel_in_flight();

    if let Some(value) = self.cache.get_fresh(&cache_key, Instant::now()) {
      debug!(key = %cache_key, "Query cache hit");
      self.state = QueryState::Ready(value.clone());
      return;
    }

    self.next_token += 1;
    let token = self.next_token;
    debug!(key = %cache_key, token, "Query cache miss, fetching");

    let future = (self.fetcher)(key);
    let tx = self.tx.clone();
    let task_key = cache_key.clone();
    let handle = tokio::spawn(async move {
      let result = future.await;
      // Receiver lives as long as the query; a send error means it is gone
      let _ = tx.send(Completion {
        token,
        key: task_key,
        result,
      });
    });

    self.in_flight = Some(InFlight {
      token,
      key: cache_key,
      handle,
    });
    self.state = QueryState::Loading;
  }

  fn apply(&mut self, completion: Completion<T>, now: Instant) -> bool {
    let current = self.in_flight.as_ref().map(|f| f.token);
    if current != Some(completion.token) {
      debug!(key = %completion.key, token = completion.token, "Discarding stale response");
      return false;
    }
    self.in_flight = None;

    match completion.result {
      Ok(value) => {
        self.cache.insert(completion.key, value.clone(), now);
        self.state = QueryState::Ready(value);
        true
      }
      Err(e) => {
        self.state = QueryState::Error(e.message);
        true
      }
    }
  }

  fn cancel_in_flight(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      debug!(key = %in_flight.key, token = in_flight.token, "Cancelling superseded request");
      in_flight.handle.abort();
    }
  }
}

impl<K, T> Drop for Query<K, T> {
  fn drop(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.handle.abort();
    }
  }
}

impl<K: std::fmt::Debug, T: std::fmt::Debug> std::fmt::Debug for Query<K, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("key", &self.key)
      .field("cached", &self.cache.len())
      .field("in_flight", &self.in_flight.as_ref().map(|f| f.token))
      .finish_non_exhaustive()
  }
}

// ============================================================================
// Mutation
// ============================================================================

/// A single write operation whose outcome is picked up on a later tick.
///
/// Only one write runs at a time; dropping the mutation aborts it.
pub struct Mutation<T> {
  pending: Option<(JoinHandle<()>, oneshot::Receiver<Result<T, RequestError>>)>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self { pending: None }
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Start a write. Returns `false` (and does nothing) if one is running.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
  {
    if self.pending.is_some() {
      return false;
    }
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
    self.pending = Some((handle, rx));
    true
  }

  /// Take the outcome once the write has settled.
  pub fn poll(&mut self) -> Option<Result<T, RequestError>> {
    let (_, rx) = self.pending.as_mut()?;
    match rx.try_recv() {
      Ok(result) => {
        self.pending = None;
        Some(result)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.pending = None;
        Some(Err(RequestError::cancelled()))
      }
    }
  }
}

impl<T: Send + 'static> Default for Mutation<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Drop for Mutation<T> {
  fn drop(&mut self) {
    if let Some((handle, _)) = self.pending.take() {
      handle.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Arc;

  const JUNE_1: &str = "2024-06-01";
  const JUNE_2: &str = "2024-06-02";

  /// Let spawned fetches run to their next await point
  async fn settle() {
    for _ in 0..10 {
      tokio::task::yield_now().await;
    }
  }

  fn counting_query(calls: Arc<AtomicUsize>) -> Query<String, String> {
    Query::new(move |key: String| {
      calls.fetch_add(1, Ordering::SeqCst);
      async move { Ok(format!("payload for {}", key)) }
    })
  }

  #[tokio::test(start_paused = true)]
  async fn test_starts_idle_then_loads_eagerly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone());
    assert!(matches!(query.state(), QueryState::Idle));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    query.set_key(JUNE_1.to_string());
    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    settle().await;
    assert!(query.poll());
    assert_eq!(query.data().map(String::as_str), Some("payload for 2024-06-01"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_cache_hit_avoids_network_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    settle().await;
    query.poll();

    tokio::time::advance(Duration::from_secs(30)).await;
    query.set_key(JUNE_2.to_string());
    settle().await;
    query.poll();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // t = 60s: back to the first date
    tokio::time::advance(Duration::from_secs(30)).await;
    query.set_key(JUNE_1.to_string());

    // Served synchronously, before any poll
    assert!(query.state().is_ready());
    assert_eq!(query.data().map(String::as_str), Some("payload for 2024-06-01"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_entry_refetches_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    settle().await;
    query.poll();
    query.set_key(JUNE_2.to_string());
    settle().await;
    query.poll();

    tokio::time::advance(Duration::from_secs(301)).await;
    query.set_key(JUNE_1.to_string());
    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    settle().await;
    assert!(query.poll());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_entry_expires_exactly_at_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    settle().await;
    query.poll();
    query.set_key(JUNE_2.to_string());

    tokio::time::advance(DEFAULT_TTL).await;
    query.set_key(JUNE_1.to_string());
    assert!(query.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_superseded_response_is_ignored() {
    let mut query: Query<String, String> = Query::new(|key: String| async move {
      let delay = if key == JUNE_1 { 2000 } else { 300 };
      tokio::time::sleep(Duration::from_millis(delay)).await;
      Ok(format!("payload for {}", key))
    });

    query.set_key(JUNE_1.to_string());
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!query.poll());

    query.set_key(JUNE_2.to_string());
    tokio::time::sleep(Duration::from_millis(2000)).await;
    query.poll();

    assert_eq!(query.data().map(String::as_str), Some("payload for 2024-06-02"));
    // The first date never made it into the cache
    assert_eq!(query.cache().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_completion_already_queued_is_discarded() {
    let mut query: Query<String, String> = Query::new(|key: String| async move {
      if key == JUNE_2 {
        tokio::time::sleep(Duration::from_millis(100)).await;
      }
      Ok(format!("payload for {}", key))
    });

    query.set_key(JUNE_1.to_string());
    settle().await; // first response is now waiting in the channel

    query.set_key(JUNE_2.to_string());
    assert!(!query.poll());
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(query.poll());
    assert_eq!(query.data().map(String::as_str), Some("payload for 2024-06-02"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_bypasses_fresh_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    settle().await;
    query.poll();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    query.refetch();
    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    settle().await;
    assert!(query.poll());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(query.state().is_ready());
  }

  #[tokio::test(start_paused = true)]
  async fn test_same_key_is_noop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    query.set_key(JUNE_1.to_string());
    settle().await;
    query.poll();
    query.set_key(JUNE_1.to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_without_key_does_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone());
    query.refetch();
    assert!(matches!(query.state(), QueryState::Idle));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_error_state() {
    let mut query: Query<String, String> =
      Query::new(|_key: String| async { Err(RequestError::transport("connection refused")) });
    query.set_key(JUNE_1.to_string());
    settle().await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("connection refused"));
    assert!(query.cache().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancelled_current_request_settles() {
    let mut query: Query<String, String> =
      Query::new(|_key: String| async { Err(RequestError::cancelled()) });
    query.set_key(JUNE_1.to_string());
    settle().await;

    assert!(query.poll());
    assert!(!query.is_loading());
    assert_eq!(query.error(), Some("Request was cancelled"));

    // A retry still goes out
    query.refetch();
    assert!(query.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_aborts_in_flight_request() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    let mut query: Query<String, String> = Query::new(move |key: String| {
      let flag = flag.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        flag.store(true, Ordering::SeqCst);
        Ok(key)
      }
    });

    query.set_key(JUNE_1.to_string());
    settle().await;
    drop(query);

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(!finished.load(Ordering::SeqCst));
  }

  #[tokio::test(start_paused = true)]
  async fn test_sweep_empties_cache_after_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_options(QueryOptions::default());

    for day in ["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04"] {
      query.set_key(day.to_string());
      settle().await;
      query.poll();
    }
    assert_eq!(query.cache().len(), 4);

    tokio::time::advance(DEFAULT_SWEEP_INTERVAL).await;
    query.poll();
    assert!(query.cache().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_sweep_keeps_fresh_entries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_options(QueryOptions {
      ttl: Duration::from_secs(60),
      sweep_interval: Duration::from_secs(30),
    });

    query.set_key(JUNE_1.to_string());
    settle().await;
    query.poll();

    tokio::time::advance(Duration::from_secs(40)).await;
    query.set_key(JUNE_2.to_string());
    settle().await;
    query.poll();
    assert_eq!(query.cache().len(), 2);

    // t = 70s: the first entry is 70s old, the second 30s
    tokio::time::advance(Duration::from_secs(30)).await;
    query.poll();
    assert_eq!(query.cache().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_all_forces_refetch_of_other_keys() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut query = counting_query(calls.clone()).with_key(JUNE_1.to_string());
    settle().await;
    query.poll();
    query.set_key(JUNE_2.to_string());
    settle().await;
    query.poll();

    query.invalidate_all();
    assert!(query.state().is_ready());
    query.set_key(JUNE_1.to_string());
    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn test_domain_cache_keys() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert_eq!(date.cache_key(), "2024-06-01");
    assert_eq!(Month::of(date).cache_key(), "2024-06");
    assert_eq!(PaymentStatus::Paid.cache_key(), "paid");
    assert_eq!(().cache_key(), "all");
  }

  #[tokio::test]
  async fn test_mutation_settles_once() {
    let mut mutation: Mutation<u32> = Mutation::new();
    assert!(mutation.start(async { Ok(7) }));
    assert!(mutation.is_pending());
    assert!(!mutation.start(async { Ok(8) }));

    let mut outcome = None;
    for _ in 0..20 {
      tokio::task::yield_now().await;
      if let Some(result) = mutation.poll() {
        outcome = Some(result);
        break;
      }
    }
    assert_eq!(outcome, Some(Ok(7)));
    assert!(!mutation.is_pending());
    assert!(mutation.poll().is_none());
  }

  #[tokio::test]
  async fn test_mutation_error_is_reported() {
    let mut mutation: Mutation<()> = Mutation::new();
    mutation.start(async { Err(RequestError::transport("offline")) });

    let mut outcome = None;
    for _ in 0..20 {
      tokio::task::yield_now().await;
      if let Some(result) = mutation.poll() {
        outcome = Some(result);
        break;
      }
    }
    assert_eq!(outcome.unwrap().unwrap_err().message, "offline");
  }
}
