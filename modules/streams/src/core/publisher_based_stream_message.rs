
use alloc::{boxed::Box, sync::Arc};

use spin::Mutex;

use super::{
  ExecutorShared, Publisher, StreamCompletion, StreamElement, StreamError, StreamMessage, Subscriber,
  SubscriptionOptions, SubscriptionShared, signal::Signal, stream_core::StreamCore, upstream_link::UpstreamLink,
};

/// Stream relaying the signals of a foreign [`Publisher`].
///
/// The publisher is subscribed when the downstream subscriber attaches. Demand is forwarded as
/// requested, and cancelling or aborting the stream cancels the publisher's subscription.
pub(crate) struct PublisherBasedStreamMessage<T> {
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> PublisherBasedStreamMessage<T> {
  pub(crate) fn new(publisher: Arc<dyn Publisher<T>>) -> Self {
    let link = Arc::new(PublisherLink { publisher: Mutex::new(Some(publisher)), state: Mutex::new(AdapterState::new()) });
    Self { core: StreamCore::new(Some(link)) }
  }
}

impl<T: StreamElement> StreamMessage<T> for PublisherBasedStreamMessage<T> {
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

struct AdapterState {
  upstream:  Option<SubscriptionShared>,
  // demand requested before the publisher handed out its subscription
  pending:   i64,
  cancelled: bool,
}

impl AdapterState {
  const fn new() -> Self {
    Self { upstream: None, pending: 0, cancelled: false }
  }
}

struct PublisherLink<T> {
  publisher: Mutex<Option<Arc<dyn Publisher<T>>>>,
  state:     Mutex<AdapterState>,
}

impl<T: StreamElement> UpstreamLink<T> for PublisherLink<T> {
  fn on_subscribe(self: Arc<Self>, core: &Arc<StreamCore<T>>) {
    let Some(publisher) = self.publisher.lock().take() else {
      return;
    };
    publisher.subscribe(Box::new(AdapterSubscriber { link: self.clone(), core: core.clone() }));
  }

  fn on_request(self: Arc<Self>, _core: &Arc<StreamCore<T>>, n: i64) {
    let upstream = {
      let mut state = self.state.lock();
      match &state.upstream {
        | Some(upstream) => Some(upstream.clone()),
        | None => {
          state.pending = state.pending.saturating_add(n);
          None
        },
      }
    };
    if let Some(upstream) = upstream {
      upstream.request(n);
    }
  }

  fn on_cancel(self: Arc<Self>) {
    self.publisher.lock().take();
    let upstream = {
      let mut state = self.state.lock();
      state.cancelled = true;
      state.upstream.take()
    };
    if let Some(upstream) = upstream {
      tracing::trace!(target: "stream_message::adapter", "cancelling wrapped publisher");
      upstream.cancel();
    }
  }
}

struct AdapterSubscriber<T> {
  link: Arc<PublisherLink<T>>,
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> Subscriber<T> for AdapterSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    let pending = {
      let mut state = self.link.state.lock();
      if state.cancelled || state.upstream.is_some() {
        None
      } else {
        state.upstream = Some(subscription.clone());
        Some(core::mem::take(&mut state.pending))
      }
    };
    match pending {
      | None => subscription.cancel(),
      | Some(0) => {},
      | Some(n) => subscription.request(n),
    }
  }

  fn on_next(&mut self, element: T) {
    self.core.push(Signal::Next(element));
  }

  fn on_error(&mut self, error: StreamError) {
    self.link.state.lock().upstream = None;
    self.core.push(Signal::Error(error));
  }

  fn on_complete(&mut self) {
    self.link.state.lock().upstream = None;
    self.core.push(Signal::Complete);
  }
}
