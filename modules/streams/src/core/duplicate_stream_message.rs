use alloc::{boxed::Box, sync::Arc};

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, Subscriber, SubscriptionOptions,
  duplicator_state::DuplicatorShared, signal::Signal, stream_core::StreamCore, upstream_link::UpstreamLink,
};

/// One independently paced view over a duplicated stream.
///
/// Open and empty reflect the shared source as well as this view's own delivery state.
pub(crate) struct DuplicateStreamMessage<T: StreamElement> {
  core:   Arc<StreamCore<T>>,
  shared: Arc<DuplicatorShared<T>>,
}

impl<T: StreamElement> DuplicateStreamMessage<T> {
  /// Creates the pulling engine of duplicate `id`.
  pub(crate) fn core_for(shared: Arc<DuplicatorShared<T>>, id: u64) -> Arc<StreamCore<T>> {
    StreamCore::pulling(Arc::new(DuplicateLink { shared, id }))
  }

  pub(crate) const fn new(core: Arc<StreamCore<T>>, shared: Arc<DuplicatorShared<T>>) -> Self {
    Self { core, shared }
  }
}

impl<T: StreamElement> StreamMessage<T> for DuplicateStreamMessage<T> {
  fn is_open(&self) -> bool {
    self.core.is_open() && self.shared.is_open()
  }

  fn is_empty(&self) -> bool {
    self.core.is_empty() || self.shared.is_empty()
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

struct DuplicateLink<T: StreamElement> {
  shared: Arc<DuplicatorShared<T>>,
  id:     u64,
}

impl<T: StreamElement> UpstreamLink<T> for DuplicateLink<T> {
  fn on_request(self: Arc<Self>, _core: &Arc<StreamCore<T>>, n: i64) {
    self.shared.request(self.id, n);
  }

  fn pull(&self, has_demand: bool) -> Option<Signal<T>> {
    self.shared.pull(self.id, has_demand)
  }

  fn on_cancel(self: Arc<Self>) {
    self.shared.remove(self.id);
  }
}

impl<T: StreamElement> Drop for DuplicateLink<T> {
  fn drop(&mut self) {
    // dropped together with an unsubscribed or finished duplicate
    self.shared.remove(self.id);
  }
}
