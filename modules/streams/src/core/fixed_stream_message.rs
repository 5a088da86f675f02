#[cfg(test)]
mod tests;

use alloc::{boxed::Box, collections::VecDeque, sync::Arc};

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, Subscriber, SubscriptionOptions,
  stream_core::StreamCore,
};

/// Stream replaying a pre-materialized sequence of elements.
///
/// The stream is closed from construction: it never accepts more elements and
/// [`StreamMessage::is_empty`] reports whether the sequence is empty.
pub(crate) struct FixedStreamMessage<T> {
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> FixedStreamMessage<T> {
  pub(crate) fn empty() -> Self {
    Self::from_deque(VecDeque::new())
  }

  pub(crate) fn of_one(element: T) -> Self {
    let mut elements = VecDeque::with_capacity(1);
    elements.push_back(element);
    Self::from_deque(elements)
  }

  pub(crate) fn of_two(first: T, second: T) -> Self {
    let mut elements = VecDeque::with_capacity(2);
    elements.push_back(first);
    elements.push_back(second);
    Self::from_deque(elements)
  }

  pub(crate) fn from_deque(elements: VecDeque<T>) -> Self {
    Self { core: StreamCore::closed_with(elements) }
  }
}

impl<T: StreamElement> StreamMessage<T> for FixedStreamMessage<T> {
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
