
use alloc::{boxed::Box, collections::VecDeque, sync::Arc};
use core::ops::Deref;

use super::{
  DuplicatorConfig, ExecutorShared, Publisher, StreamElement, StreamError, StreamMessage, StreamMessageDuplicator,
  Subscriber,
  concat_array_stream_message::ConcatArrayStreamMessage,
  concat_publisher_stream_message::ConcatPublisherStreamMessage,
  fixed_stream_message::FixedStreamMessage,
  fuseable_stream_message::{FuseableStreamMessage, Transform},
  identity::{is_identity, take_if_same},
  publisher_based_stream_message::PublisherBasedStreamMessage,
};

/// Shared handle to a stream message.
///
/// Every constructor and operator of the crate returns this handle. Cloning is cheap and all
/// clones refer to the same single-subscriber stream.
pub struct StreamMessageShared<T: StreamElement> {
  inner: Arc<dyn StreamMessage<T>>,
}

impl<T: StreamElement> Clone for StreamMessageShared<T> {
  fn clone(&self) -> Self {
    Self { inner: self.inner.clone() }
  }
}

impl<T: StreamElement> Deref for StreamMessageShared<T> {
  type Target = dyn StreamMessage<T>;

  fn deref(&self) -> &Self::Target {
    &*self.inner
  }
}

impl<T: StreamElement> StreamMessageShared<T> {
  /// Wraps a stream implementation.
  #[must_use]
  pub fn new<S>(stream: S) -> Self
  where
    S: StreamMessage<T> + 'static, {
    Self { inner: Arc::new(stream) }
  }

  /// Returns a closed stream without elements.
  #[must_use]
  pub fn empty() -> Self {
    Self::new(FixedStreamMessage::empty())
  }

  /// Returns a closed stream with a single element.
  #[must_use]
  pub fn of_one(element: T) -> Self {
    Self::new(FixedStreamMessage::of_one(element))
  }

  /// Returns a closed stream with two elements.
  #[must_use]
  pub fn of_two(first: T, second: T) -> Self {
    Self::new(FixedStreamMessage::of_two(first, second))
  }

  /// Returns a closed stream replaying `elements` in iteration order.
  #[must_use]
  pub fn of<I>(elements: I) -> Self
  where
    I: IntoIterator<Item = T>, {
    let mut elements: VecDeque<T> = elements.into_iter().collect();
    match elements.len() {
      | 0 => Self::empty(),
      | 1 => elements.pop_front().map_or_else(Self::empty, Self::of_one),
      | _ => Self::new(FixedStreamMessage::from_deque(elements)),
    }
  }

  /// Adapts a publisher into a single-subscriber stream.
  ///
  /// A publisher that already is a [`StreamMessageShared`] is returned unchanged.
  #[must_use]
  pub fn from_publisher<P>(publisher: P) -> Self
  where
    P: Publisher<T> + 'static, {
    let mut slot = Some(publisher);
    if let Some(stream) = take_if_same::<P, Self>(&mut slot) {
      return stream;
    }
    slot.map_or_else(Self::empty, |publisher| Self::new(PublisherBasedStreamMessage::new(Arc::new(publisher))))
  }

  /// Concatenates `streams` into one stream, subscribing to each only after the previous one
  /// completed.
  ///
  /// An empty iterator yields [`StreamMessageShared::empty`].
  #[must_use]
  pub fn concat<I>(streams: I) -> Self
  where
    I: IntoIterator<Item = Self>, {
    let streams: VecDeque<Self> = streams.into_iter().collect();
    if streams.is_empty() {
      return Self::empty();
    }
    Self::new(ConcatArrayStreamMessage::new(streams))
  }

  /// Concatenates the streams published by `streams`, one inner stream at a time.
  #[must_use]
  pub fn concat_streams(streams: StreamMessageShared<StreamMessageShared<T>>) -> Self {
    Self::new(ConcatPublisherStreamMessage::new(streams))
  }

  /// Delivers only the elements matching `predicate`.
  ///
  /// Rejected elements are dropped and replaced by a request for one more element, so the
  /// demand of the subscriber is preserved.
  #[must_use]
  pub fn filter<P>(self, predicate: P) -> Self
  where
    P: Fn(&T) -> bool + Send + Sync + 'static, {
    let transform: Transform<T, T> = Arc::new(move |element: T| Ok(predicate(&element).then_some(element)));
    Self::new(FuseableStreamMessage::new(self, transform))
  }

  /// Transforms every element with `function`.
  ///
  /// Passing [`identity`](super::identity) returns this stream unchanged.
  #[must_use]
  pub fn map<U, F>(self, function: F) -> StreamMessageShared<U>
  where
    U: StreamElement,
    F: Fn(T) -> U + Send + Sync + 'static, {
    let mut slot = Some(self);
    if is_identity::<T, F>() {
      if let Some(same) = take_if_same::<Self, StreamMessageShared<U>>(&mut slot) {
        return same;
      }
    }
    let transform: Transform<T, U> = Arc::new(move |element: T| Ok(Some(function(element))));
    slot.map_or_else(StreamMessageShared::empty, |source| {
      StreamMessageShared::new(FuseableStreamMessage::new(source, transform))
    })
  }

  /// Transforms every element with a fallible `function`.
  ///
  /// The first `Err` cancels the upstream subscription and fails the subscriber with the
  /// returned error.
  #[must_use]
  pub fn try_map<U, F>(self, function: F) -> StreamMessageShared<U>
  where
    U: StreamElement,
    F: Fn(T) -> Result<U, StreamError> + Send + Sync + 'static, {
    let transform: Transform<T, U> = Arc::new(move |element: T| function(element).map(Some));
    StreamMessageShared::new(FuseableStreamMessage::new(self, transform))
  }

  /// Hands this stream to a duplicator using the default executor and configuration.
  ///
  /// The stream rejects direct subscribers afterwards.
  #[must_use]
  pub fn to_duplicator(self) -> StreamMessageDuplicator<T> {
    let executor = self.default_subscriber_executor();
    self.to_duplicator_with(executor, DuplicatorConfig::default())
  }

  /// Hands this stream to a duplicator subscribing on `executor` with `config`.
  #[must_use]
  pub fn to_duplicator_with(self, executor: ExecutorShared, config: DuplicatorConfig) -> StreamMessageDuplicator<T> {
    StreamMessageDuplicator::new(self, executor, config)
  }
}

impl<T: StreamElement> Publisher<T> for StreamMessageShared<T> {
  fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
    self.inner.subscribe(subscriber);
  }
}

impl<T: StreamElement> StreamElement for StreamMessageShared<T> {
  fn retained_duplicate(&self) -> Self {
    self.clone()
  }
}

impl<T: StreamElement> From<Arc<dyn StreamMessage<T>>> for StreamMessageShared<T> {
  fn from(inner: Arc<dyn StreamMessage<T>>) -> Self {
    Self { inner }
  }
}
