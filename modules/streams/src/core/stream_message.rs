use alloc::boxed::Box;

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, Subscriber, SubscriptionOptions, TrampolineExecutor,
};

/// Publisher that accepts at most one subscriber over its lifetime.
///
/// A stream message is *complete* (fully consumed) once its subscriber observed
/// `on_complete` or `on_error`, once the subscription was cancelled, or once the stream was
/// aborted. [`StreamMessage::when_complete`] resolves at that point, which also covers the
/// cancellation case a subscriber is not told about by default.
///
/// Subscription failures never surface to the caller of `subscribe`. The subscriber receives
/// them through `on_error`:
/// - [`StreamError::AlreadySubscribed`] when another subscriber attached first,
/// - the abort cause when the stream was aborted,
/// - any failure raised while producing elements.
///
/// Pooled elements are converted to unpooled copies before delivery unless the subscriber
/// opted in with [`SubscriptionOptions::with_pooled_objects`].
pub trait StreamMessage<T: StreamElement>: Send + Sync {
  /// Returns `true` until a terminal signal has been committed.
  ///
  /// A closed stream is not necessarily complete: buffered elements may still await delivery.
  fn is_open(&self) -> bool;

  /// Returns `true` once the stream closed without publishing any element.
  ///
  /// Never `true` while the stream is open.
  fn is_empty(&self) -> bool;

  /// Returns the outstanding demand of the current subscriber.
  fn demand(&self) -> i64;

  /// Returns the handle resolved when the stream is complete.
  fn when_complete(&self) -> StreamCompletion;

  /// Returns `true` once [`StreamMessage::when_complete`] resolved.
  fn is_complete(&self) -> bool {
    self.when_complete().is_done()
  }

  /// Attaches `subscriber`, delivering its signals on `executor`.
  fn subscribe_with(&self, subscriber: Box<dyn Subscriber<T>>, executor: ExecutorShared, options: SubscriptionOptions);

  /// Attaches `subscriber` on the default executor with default options.
  fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
    self.subscribe_with(subscriber, self.default_subscriber_executor(), SubscriptionOptions::new());
  }

  /// Returns the executor used by [`StreamMessage::subscribe`].
  ///
  /// Each call may return a different executor.
  fn default_subscriber_executor(&self) -> ExecutorShared {
    TrampolineExecutor::shared()
  }

  /// Closes the stream with [`StreamError::Aborted`] and prevents further subscription.
  fn abort(&self) {
    self.abort_with(StreamError::Aborted);
  }

  /// Closes the stream with `cause` and prevents further subscription.
  ///
  /// Buffered elements are dropped, releasing pooled storage. Has no effect on a stream that is
  /// already complete or aborted.
  fn abort_with(&self, cause: StreamError);
}
