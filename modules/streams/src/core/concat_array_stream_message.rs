//! Concatenation of an ordered list of streams.


use alloc::{boxed::Box, collections::VecDeque, sync::Arc};

use spin::Mutex;

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, StreamMessageShared, Subscriber,
  SubscriptionOptions, SubscriptionShared, TrampolineExecutor, UNBOUNDED_DEMAND, signal::Signal,
  stream_core::StreamCore, upstream_link::UpstreamLink,
};

const TARGET: &str = "stream_message::concat";

/// Stream delivering the elements of its children one child after another.
///
/// Exactly one child is subscribed at a time, starting with the first one when the downstream
/// subscriber attaches. Demand left over when a child completes carries over to the next child.
pub(crate) struct ConcatArrayStreamMessage<T: StreamElement> {
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> ConcatArrayStreamMessage<T> {
  pub(crate) fn new(children: VecDeque<StreamMessageShared<T>>) -> Self {
    let link = Arc::new(ConcatLink {
      state: Mutex::new(ConcatState { pending: children, active: ChildDemand::new(), cancelled: false }),
    });
    Self { core: StreamCore::new(Some(link)) }
  }
}

impl<T: StreamElement> StreamMessage<T> for ConcatArrayStreamMessage<T> {
  fn is_open(&self) -> bool {
    self.core.is_open()
  }

  fn is_empty(&self) -> bool {
    self.core.is_empty()
  }

  fn demand(&self) -> i64 {
    self.core.demand()
  }

  fn when_complete(&self) -> StreamCompletion {
    self.core.completion()
  }

  fn subscribe_with(&self, subscriber: Box<dyn Subscriber<T>>, executor: ExecutorShared, options: SubscriptionOptions) {
    self.core.subscribe(subscriber, executor, options);
  }

  fn abort_with(&self, cause: StreamError) {
    self.core.abort_with(cause);
  }
}

/// Demand forwarded to the active child.
///
/// `outstanding` counts elements requested downstream and not yet received from any child.
pub(crate) struct ChildDemand {
  active:      Option<SubscriptionShared>,
  outstanding: i64,
}

impl ChildDemand {
  pub(crate) const fn new() -> Self {
    Self { active: None, outstanding: 0 }
  }

  /// Records a downstream request and returns the child to forward it to.
  pub(crate) fn add(&mut self, n: i64) -> Option<SubscriptionShared> {
    self.outstanding = self.outstanding.saturating_add(n);
    self.active.clone()
  }

  /// Attaches a newly subscribed child and returns the carried-over demand.
  pub(crate) fn attach(&mut self, subscription: SubscriptionShared) -> i64 {
    self.active = Some(subscription);
    self.outstanding
  }

  pub(crate) fn received_one(&mut self) {
    if self.outstanding != UNBOUNDED_DEMAND && self.outstanding > 0 {
      self.outstanding -= 1;
    }
  }

  pub(crate) fn detach(&mut self) -> Option<SubscriptionShared> {
    self.active.take()
  }
}

struct ConcatState<T: StreamElement> {
  pending:   VecDeque<StreamMessageShared<T>>,
  active:    ChildDemand,
  cancelled: bool,
}

struct ConcatLink<T: StreamElement> {
  state: Mutex<ConcatState<T>>,
}

impl<T: StreamElement> ConcatLink<T> {
  fn subscribe_next(self: &Arc<Self>, core: &Arc<StreamCore<T>>) {
    let next = {
      let mut state = self.state.lock();
      if state.cancelled {
        return;
      }
      state.pending.pop_front()
    };
    let Some(child) = next else {
      core.push(Signal::Complete);
      return;
    };
    let executor = core.executor().unwrap_or_else(TrampolineExecutor::shared);
    let subscriber = ChildSubscriber { link: self.clone(), core: core.clone(), done: false };
    child.subscribe_with(Box::new(subscriber), executor, SubscriptionOptions::new().with_pooled_objects());
  }

  fn abort_pending(&self, cause: &StreamError) {
    let pending = core::mem::take(&mut self.state.lock().pending);
    for child in pending {
      child.abort_with(cause.clone());
    }
  }
}

impl<T: StreamElement> UpstreamLink<T> for ConcatLink<T> {
  fn on_subscribe(self: Arc<Self>, core: &Arc<StreamCore<T>>) {
    self.subscribe_next(core);
  }

  fn on_request(self: Arc<Self>, _core: &Arc<StreamCore<T>>, n: i64) {
    let active = self.state.lock().active.add(n);
    if let Some(active) = active {
      active.request(n);
    }
  }

  fn on_cancel(self: Arc<Self>) {
    let active = {
      let mut state = self.state.lock();
      state.cancelled = true;
      state.active.detach()
    };
    if let Some(active) = active {
      active.cancel();
    }
    tracing::debug!(target: TARGET, "concatenation cancelled, aborting children not yet started");
    self.abort_pending(&StreamError::Aborted);
  }
}

struct ChildSubscriber<T: StreamElement> {
  link: Arc<ConcatLink<T>>,
  core: Arc<StreamCore<T>>,
  done: bool,
}

impl<T: StreamElement> Subscriber<T> for ChildSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    let carried = {
      let mut state = self.link.state.lock();
      if state.cancelled { None } else { Some(state.active.attach(subscription.clone())) }
    };
    match carried {
      | None => subscription.cancel(),
      | Some(n) if n > 0 => subscription.request(n),
      | Some(_) => {},
    }
  }

  fn on_next(&mut self, element: T) {
    self.link.state.lock().active.received_one();
    self.core.push(Signal::Next(element));
  }

  fn on_error(&mut self, error: StreamError) {
    if core::mem::replace(&mut self.done, true) {
      return;
    }
    self.link.state.lock().active.detach();
    tracing::debug!(target: TARGET, %error, "child failed, failing the concatenation");
    self.link.abort_pending(&error);
    self.core.push(Signal::Error(error));
  }

  fn on_complete(&mut self) {
    if core::mem::replace(&mut self.done, true) {
      return;
    }
    self.link.state.lock().active.detach();
    self.link.subscribe_next(&self.core);
  }
}
