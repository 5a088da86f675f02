
use alloc::{boxed::Box, sync::Arc};

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, StreamMessageShared, Subscriber,
  SubscriptionOptions, signal::Signal, stream_core::StreamCore,
};

/// Writable stream buffering elements until its subscriber requests them.
///
/// The producer side writes with [`DefaultStreamMessage::write`] and finishes with
/// [`DefaultStreamMessage::close`] or [`DefaultStreamMessage::close_with`]. Cloning returns
/// another handle to the same stream.
pub struct DefaultStreamMessage<T> {
  core: Arc<StreamCore<T>>,
}

impl<T> Clone for DefaultStreamMessage<T> {
  fn clone(&self) -> Self {
    Self { core: self.core.clone() }
  }
}

impl<T: StreamElement> DefaultStreamMessage<T> {
  /// Creates an open stream.
  #[must_use]
  pub fn new() -> Self {
    Self { core: StreamCore::new(None) }
  }

  /// Publishes `element`.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::Closed`] when the stream was closed or aborted. The element is
  /// dropped in that case.
  pub fn write(&self, element: T) -> Result<(), StreamError> {
    if self.core.push(Signal::Next(element)) { Ok(()) } else { Err(StreamError::Closed) }
  }

  /// Completes the stream after the written elements.
  pub fn close(&self) {
    self.core.push(Signal::Complete);
  }

  /// Fails the stream with `cause` after the written elements.
  pub fn close_with(&self, cause: StreamError) {
    self.core.push(Signal::Error(cause));
  }

  /// Returns a shared stream handle reading from this stream.
  #[must_use]
  pub fn to_shared(&self) -> StreamMessageShared<T> {
    StreamMessageShared::new(self.clone())
  }
}

impl<T: StreamElement> Default for DefaultStreamMessage<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: StreamElement> StreamMessage<T> for DefaultStreamMessage<T> {
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
