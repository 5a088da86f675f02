//! Concatenation of a stream of streams.


use alloc::{boxed::Box, sync::Arc};

use spin::Mutex;

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, StreamMessageShared, Subscriber,
  SubscriptionOptions, SubscriptionShared, TrampolineExecutor, concat_array_stream_message::ChildDemand,
  signal::Signal, stream_core::StreamCore, upstream_link::UpstreamLink,
};

const TARGET: &str = "stream_message::concat";

/// Stream delivering the elements of every inner stream published by an outer stream.
///
/// Inner streams are requested from the outer stream one at a time. The stream completes once
/// the outer stream and the last inner stream completed.
pub(crate) struct ConcatPublisherStreamMessage<T: StreamElement> {
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> ConcatPublisherStreamMessage<T> {
  pub(crate) fn new(outer: StreamMessageShared<StreamMessageShared<T>>) -> Self {
    let link = Arc::new(OuterLink {
      outer: Mutex::new(Some(outer)),
      state: Mutex::new(OuterState {
        outer_subscription: None,
        inner:              ChildDemand::new(),
        inner_running:      false,
        outer_done:         false,
        terminated:         false,
      }),
    });
    Self { core: StreamCore::new(Some(link)) }
  }
}

impl<T: StreamElement> StreamMessage<T> for ConcatPublisherStreamMessage<T> {
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

struct OuterState {
  outer_subscription: Option<SubscriptionShared>,
  inner:              ChildDemand,
  inner_running:      bool,
  outer_done:         bool,
  terminated:         bool,
}

struct OuterLink<T: StreamElement> {
  outer: Mutex<Option<StreamMessageShared<StreamMessageShared<T>>>>,
  state: Mutex<OuterState>,
}

impl<T: StreamElement> OuterLink<T> {
  /// Marks the concatenation as terminated and returns the subscriptions to cancel.
  fn terminate(&self) -> (Option<SubscriptionShared>, Option<SubscriptionShared>) {
    let mut state = self.state.lock();
    state.terminated = true;
    (state.outer_subscription.take(), state.inner.detach())
  }
}

impl<T: StreamElement> UpstreamLink<T> for OuterLink<T> {
  fn on_subscribe(self: Arc<Self>, core: &Arc<StreamCore<T>>) {
    let Some(outer) = self.outer.lock().take() else {
      return;
    };
    let executor = core.executor().unwrap_or_else(TrampolineExecutor::shared);
    let subscriber = OuterSubscriber { link: self.clone(), core: core.clone(), executor: executor.clone() };
    outer.subscribe_with(Box::new(subscriber), executor, SubscriptionOptions::new());
  }

  fn on_request(self: Arc<Self>, _core: &Arc<StreamCore<T>>, n: i64) {
    let active = self.state.lock().inner.add(n);
    if let Some(active) = active {
      active.request(n);
    }
  }

  fn on_cancel(self: Arc<Self>) {
    let outer = self.outer.lock().take();
    let (outer_subscription, inner) = self.terminate();
    if let Some(inner) = inner {
      inner.cancel();
    }
    if let Some(outer_subscription) = outer_subscription {
      outer_subscription.cancel();
    }
    if let Some(outer) = outer {
      outer.abort();
    }
  }
}

struct OuterSubscriber<T: StreamElement> {
  link:     Arc<OuterLink<T>>,
  core:     Arc<StreamCore<T>>,
  executor: ExecutorShared,
}

impl<T: StreamElement> Subscriber<StreamMessageShared<T>> for OuterSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    let accepted = {
      let mut state = self.link.state.lock();
      if state.terminated {
        false
      } else {
        state.outer_subscription = Some(subscription.clone());
        true
      }
    };
    if accepted {
      subscription.request(1);
    } else {
      subscription.cancel();
    }
  }

  fn on_next(&mut self, inner: StreamMessageShared<T>) {
    let terminated = {
      let mut state = self.link.state.lock();
      state.inner_running = !state.terminated;
      state.terminated
    };
    if terminated {
      inner.abort();
      return;
    }
    let subscriber = InnerSubscriber { link: self.link.clone(), core: self.core.clone(), done: false };
    inner.subscribe_with(Box::new(subscriber), self.executor.clone(), SubscriptionOptions::new().with_pooled_objects());
  }

  fn on_error(&mut self, error: StreamError) {
    let (_, inner) = self.link.terminate();
    if let Some(inner) = inner {
      inner.cancel();
    }
    tracing::debug!(target: TARGET, %error, "outer stream failed");
    self.core.push(Signal::Error(error));
  }

  fn on_complete(&mut self) {
    let finished = {
      let mut state = self.link.state.lock();
      state.outer_subscription = None;
      state.outer_done = true;
      !state.inner_running
    };
    if finished {
      self.core.push(Signal::Complete);
    }
  }
}

enum AfterInner {
  Complete,
  RequestNext(SubscriptionShared),
  Wait,
}

struct InnerSubscriber<T: StreamElement> {
  link: Arc<OuterLink<T>>,
  core: Arc<StreamCore<T>>,
  done: bool,
}

impl<T: StreamElement> Subscriber<T> for InnerSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    let carried = {
      let mut state = self.link.state.lock();
      if state.terminated { None } else { Some(state.inner.attach(subscription.clone())) }
    };
    match carried {
      | None => subscription.cancel(),
      | Some(n) if n > 0 => subscription.request(n),
      | Some(_) => {},
    }
  }

  fn on_next(&mut self, element: T) {
    self.link.state.lock().inner.received_one();
    self.core.push(Signal::Next(element));
  }

  fn on_error(&mut self, error: StreamError) {
    if core::mem::replace(&mut self.done, true) {
      return;
    }
    let (outer_subscription, _) = self.link.terminate();
    if let Some(outer_subscription) = outer_subscription {
      outer_subscription.cancel();
    }
    tracing::debug!(target: TARGET, %error, "inner stream failed");
    self.core.push(Signal::Error(error));
  }

  fn on_complete(&mut self) {
    if core::mem::replace(&mut self.done, true) {
      return;
    }
    let next = {
      let mut state = self.link.state.lock();
      state.inner.detach();
      state.inner_running = false;
      if state.outer_done {
        AfterInner::Complete
      } else {
        state.outer_subscription.clone().map_or(AfterInner::Wait, AfterInner::RequestNext)
      }
    };
    match next {
      | AfterInner::Complete => {
        self.core.push(Signal::Complete);
      },
      | AfterInner::RequestNext(outer_subscription) => outer_subscription.request(1),
      | AfterInner::Wait => {},
    }
  }
}
