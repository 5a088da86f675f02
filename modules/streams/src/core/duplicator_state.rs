//! Shared state behind a duplicator and its duplicates.
//!
//! The duplicator subscribes once to its source and appends every element to a buffer indexed
//! by absolute position. Each duplicate owns a cursor into that buffer and pulls from it on its
//! own executor. Entries are evicted once every live duplicate moved past them, except while the
//! duplicator is open: an open duplicator keeps the whole history so that duplicates created
//! later replay it from the first element.

use alloc::{
  boxed::Box,
  collections::VecDeque,
  sync::{Arc, Weak},
  vec::Vec,
};

use spin::Mutex;

use super::{
  DuplicatorConfig, ExecutorShared, OverflowPolicy, StreamElement, StreamError, StreamMessageShared, Subscriber,
  SubscriptionOptions, SubscriptionShared, UNBOUNDED_DEMAND, duplicate_stream_message::DuplicateStreamMessage,
  signal::Signal, stream_core::StreamCore,
};

const TARGET: &str = "stream_message::duplicator";

struct DuplicateEntry<T> {
  id:     u64,
  cursor: u64,
  demand: i64,
  core:   Weak<StreamCore<T>>,
}

impl<T> DuplicateEntry<T> {
  fn is_live(&self) -> bool {
    self.core.strong_count() > 0
  }
}

/// Duplicates failed by an overflow plus the upstream to cancel, if any.
struct Overflow<T> {
  failed:   Vec<Weak<StreamCore<T>>>,
  upstream: Option<SubscriptionShared>,
}

impl<T> Overflow<T> {
  const fn none() -> Self {
    Self { failed: Vec::new(), upstream: None }
  }
}

struct DuplicatorState<T> {
  buffer:     VecDeque<T>,
  // absolute position of buffer[0]
  head:       u64,
  upstream:   Option<SubscriptionShared>,
  requested:  u64,
  unbounded:  bool,
  terminal:   Option<Result<(), StreamError>>,
  duplicates: Vec<DuplicateEntry<T>>,
  next_id:    u64,
  open:       bool,
  truncated:  bool,
  failure:    Option<StreamError>,
}

impl<T> DuplicatorState<T> {
  const fn new() -> Self {
    Self {
      buffer:     VecDeque::new(),
      head:       0,
      upstream:   None,
      requested:  0,
      unbounded:  false,
      terminal:   None,
      duplicates: Vec::new(),
      next_id:    0,
      open:       true,
      truncated:  false,
      failure:    None,
    }
  }

  fn end(&self) -> u64 {
    self.head + self.buffer.len() as u64
  }

  /// History is kept for duplicates not created yet.
  const fn pinned(&self) -> bool {
    self.open && !self.truncated
  }

  /// Removes the entries every live duplicate has passed and returns them for release.
  fn evict(&mut self) -> VecDeque<T> {
    self.duplicates.retain(DuplicateEntry::is_live);
    if self.pinned() {
      return VecDeque::new();
    }
    let end = self.end();
    let floor = self.duplicates.iter().map(|entry| entry.cursor).min().unwrap_or(end);
    let count = usize::try_from(floor.saturating_sub(self.head)).unwrap_or(usize::MAX).min(self.buffer.len());
    self.head += count as u64;
    self.buffer.drain(..count).collect()
  }

  /// Computes the additional upstream demand needed by the live duplicates.
  ///
  /// Upstream demand follows the furthest position any duplicate asked for, so a fast duplicate
  /// is never held back by a slow one.
  fn upstream_request(&mut self) -> Option<(SubscriptionShared, i64)> {
    if self.unbounded || self.terminal.is_some() {
      return None;
    }
    let upstream = self.upstream.clone()?;
    let mut target = self.requested;
    for entry in self.duplicates.iter().filter(|entry| entry.is_live()) {
      if entry.demand == UNBOUNDED_DEMAND {
        self.unbounded = true;
        return Some((upstream, UNBOUNDED_DEMAND));
      }
      target = target.max(entry.cursor.saturating_add(u64::try_from(entry.demand).unwrap_or(0)));
    }
    if target <= self.requested {
      return None;
    }
    let delta = target - self.requested;
    self.requested = target;
    Some((upstream, i64::try_from(delta).unwrap_or(UNBOUNDED_DEMAND)))
  }

  /// Cancels upstream once the duplicator is closed and no duplicate is left.
  fn idle_upstream(&mut self) -> Option<SubscriptionShared> {
    if self.open || !self.duplicates.is_empty() || self.terminal.is_some() {
      return None;
    }
    self.terminal = Some(Err(StreamError::CancelledSubscription));
    self.upstream.take()
  }

  fn enforce_limit(&mut self, limit: usize, policy: OverflowPolicy) -> Overflow<T> {
    if self.buffer.len() <= limit {
      return Overflow::none();
    }
    let threshold = self.end() - limit as u64;
    if self.pinned() {
      tracing::debug!(target: TARGET, limit, "history exceeded the buffer limit, later duplicates are rejected");
      self.truncated = true;
    }
    if !self.duplicates.iter().any(|entry| entry.cursor < threshold) {
      return Overflow::none();
    }
    match policy {
      | OverflowPolicy::FailSlowest => {
        let (lagging, keeping): (Vec<_>, Vec<_>) =
          core::mem::take(&mut self.duplicates).into_iter().partition(|entry| entry.cursor < threshold);
        self.duplicates = keeping;
        tracing::debug!(target: TARGET, limit, failed = lagging.len(), "failing lagging duplicates");
        Overflow { failed: lagging.into_iter().map(|entry| entry.core).collect(), upstream: None }
      },
      | OverflowPolicy::FailAll => {
        let error = StreamError::BufferExceeded { limit };
        tracing::debug!(target: TARGET, limit, "failing every duplicate");
        self.open = false;
        self.failure = Some(error.clone());
        self.terminal = Some(Err(error));
        let failed = core::mem::take(&mut self.duplicates).into_iter().map(|entry| entry.core).collect();
        Overflow { failed, upstream: self.upstream.take() }
      },
    }
  }

  fn live_cores(&self, waiting_only: bool) -> Vec<Arc<StreamCore<T>>> {
    self
      .duplicates
      .iter()
      .filter(|entry| !waiting_only || entry.demand > 0)
      .filter_map(|entry| entry.core.upgrade())
      .collect()
  }
}

pub(crate) struct DuplicatorShared<T: StreamElement> {
  state:  Mutex<DuplicatorState<T>>,
  source: StreamMessageShared<T>,
  config: DuplicatorConfig,
}

impl<T: StreamElement> DuplicatorShared<T> {
  /// Creates the shared state and subscribes to `source` on `executor`.
  pub(crate) fn new(source: StreamMessageShared<T>, executor: ExecutorShared, config: DuplicatorConfig) -> Arc<Self> {
    let shared = Arc::new(Self { state: Mutex::new(DuplicatorState::new()), source, config });
    let subscriber = UpstreamSubscriber { shared: shared.clone() };
    shared.source.subscribe_with(Box::new(subscriber), executor, SubscriptionOptions::new().with_pooled_objects());
    shared
  }

  fn limit(&self) -> usize {
    self.config.max_buffered_elements().unwrap_or(usize::MAX)
  }

  pub(crate) fn duplicate(self: &Arc<Self>) -> Result<StreamMessageShared<T>, StreamError> {
    let (core, id) = {
      let mut state = self.state.lock();
      if let Some(failure) = &state.failure {
        return Err(failure.clone());
      }
      if !state.open {
        return Err(StreamError::DuplicatorClosed);
      }
      if state.truncated {
        return Err(StreamError::BufferExceeded { limit: self.limit() });
      }
      let id = state.next_id;
      state.next_id += 1;
      let core = DuplicateStreamMessage::core_for(self.clone(), id);
      let cursor = state.head;
      state.duplicates.push(DuplicateEntry { id, cursor, demand: 0, core: Arc::downgrade(&core) });
      (core, id)
    };
    tracing::trace!(target: TARGET, id, "duplicate created");
    Ok(StreamMessageShared::new(DuplicateStreamMessage::new(core, self.clone())))
  }

  /// Returns `true` until the source is closed, ended or the duplicator failed.
  pub(crate) fn is_open(&self) -> bool {
    let running = {
      let state = self.state.lock();
      state.terminal.is_none() && state.failure.is_none()
    };
    running && self.source.is_open()
  }

  /// Returns `true` once the source is known to end without ever publishing an element.
  pub(crate) fn is_empty(&self) -> bool {
    let drained_empty = {
      let state = self.state.lock();
      matches!(state.terminal, Some(Ok(()))) && state.head == 0 && state.buffer.is_empty()
    };
    drained_empty || self.source.is_empty()
  }

  pub(crate) fn request(&self, id: u64, n: i64) {
    let request = {
      let mut state = self.state.lock();
      if let Some(entry) = state.duplicates.iter_mut().find(|entry| entry.id == id) {
        entry.demand = entry.demand.saturating_add(n);
      }
      state.upstream_request()
    };
    if let Some((upstream, n)) = request {
      upstream.request(n);
    }
  }

  pub(crate) fn pull(&self, id: u64, has_demand: bool) -> Option<Signal<T>> {
    let (signal, evicted) = {
      let mut state = self.state.lock();
      let index = state.duplicates.iter().position(|entry| entry.id == id)?;
      let cursor = state.duplicates[index].cursor;
      if cursor < state.end() {
        if !has_demand {
          return None;
        }
        let offset = usize::try_from(cursor - state.head).ok()?;
        let element = state.buffer.get(offset)?.retained_duplicate();
        let entry = &mut state.duplicates[index];
        entry.cursor += 1;
        if entry.demand != UNBOUNDED_DEMAND && entry.demand > 0 {
          entry.demand -= 1;
        }
        (Signal::Next(element), state.evict())
      } else {
        let terminal = state.terminal.clone()?;
        state.duplicates.remove(index);
        let signal = match terminal {
          | Ok(()) => Signal::Complete,
          | Err(error) => Signal::Error(error),
        };
        (signal, state.evict())
      }
    };
    drop(evicted);
    Some(signal)
  }

  /// Removes a duplicate that was cancelled, aborted or failed.
  pub(crate) fn remove(&self, id: u64) {
    let (evicted, upstream) = {
      let mut state = self.state.lock();
      state.duplicates.retain(|entry| entry.id != id);
      let evicted = state.evict();
      (evicted, state.idle_upstream())
    };
    drop(evicted);
    if let Some(upstream) = upstream {
      tracing::debug!(target: TARGET, "last duplicate left a closed duplicator, cancelling upstream");
      upstream.cancel();
    }
  }

  pub(crate) fn close(&self) {
    let (evicted, upstream) = {
      let mut state = self.state.lock();
      if !state.open {
        return;
      }
      state.open = false;
      let evicted = state.evict();
      (evicted, state.idle_upstream())
    };
    tracing::trace!(target: TARGET, released = evicted.len(), "duplicator closed");
    drop(evicted);
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }

  pub(crate) fn abort_with(&self, cause: StreamError) {
    let (buffer, duplicates) = {
      let mut state = self.state.lock();
      if state.failure.is_some() {
        return;
      }
      state.failure = Some(cause.clone());
      state.open = false;
      state.upstream = None;
      if state.terminal.is_none() {
        state.terminal = Some(Err(cause.clone()));
      }
      state.head = state.end();
      (core::mem::take(&mut state.buffer), core::mem::take(&mut state.duplicates))
    };
    drop(buffer);
    tracing::debug!(target: TARGET, %cause, duplicates = duplicates.len(), "duplicator aborted");
    for core in duplicates.into_iter().filter_map(|entry| entry.core.upgrade()) {
      core.abort_with(cause.clone());
    }
    self.source.abort_with(cause);
  }

  #[cfg(test)]
  pub(crate) fn buffered(&self) -> usize {
    self.state.lock().buffer.len()
  }

  fn on_upstream_subscribe(&self, subscription: SubscriptionShared) {
    let request = {
      let mut state = self.state.lock();
      if state.terminal.is_some() {
        None
      } else {
        state.upstream = Some(subscription.clone());
        Some(state.upstream_request())
      }
    };
    match request {
      | None => subscription.cancel(),
      | Some(Some((upstream, n))) => upstream.request(n),
      | Some(None) => {},
    }
  }

  fn on_upstream_next(&self, element: T) {
    let (waiting, overflow, evicted, idle) = {
      let mut state = self.state.lock();
      if state.terminal.is_some() {
        return;
      }
      state.buffer.push_back(element);
      let overflow = match self.config.max_buffered_elements() {
        | Some(limit) => state.enforce_limit(limit, self.config.overflow_policy()),
        | None => Overflow::none(),
      };
      let evicted = state.evict();
      let idle = state.idle_upstream();
      (state.live_cores(true), overflow, evicted, idle)
    };
    drop(evicted);
    let error = StreamError::BufferExceeded { limit: self.limit() };
    for core in overflow.failed.into_iter().filter_map(|core| core.upgrade()) {
      core.abort_with(error.clone());
    }
    if let Some(upstream) = overflow.upstream.or(idle) {
      upstream.cancel();
    }
    for core in waiting {
      core.schedule_drain();
    }
  }

  fn on_upstream_terminal(&self, result: Result<(), StreamError>) {
    let (waiting, evicted) = {
      let mut state = self.state.lock();
      if state.terminal.is_some() {
        return;
      }
      if let Err(error) = &result {
        tracing::debug!(target: TARGET, %error, "upstream failed, broadcasting to duplicates");
      }
      state.terminal = Some(result);
      state.upstream = None;
      (state.live_cores(false), state.evict())
    };
    drop(evicted);
    for core in waiting {
      core.schedule_drain();
    }
  }
}

struct UpstreamSubscriber<T: StreamElement> {
  shared: Arc<DuplicatorShared<T>>,
}

impl<T: StreamElement> Subscriber<T> for UpstreamSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    self.shared.on_upstream_subscribe(subscription);
  }

  fn on_next(&mut self, element: T) {
    self.shared.on_upstream_next(element);
  }

  fn on_error(&mut self, error: StreamError) {
    self.shared.on_upstream_terminal(Err(error));
  }

  fn on_complete(&mut self) {
    self.shared.on_upstream_terminal(Ok(()));
  }
}
