use alloc::boxed::Box;

use super::Subscriber;

/// Any producer following the publish/subscribe signal contract.
///
/// Stream messages are publishers themselves; foreign publishers are adapted with
/// [`StreamMessageShared::from_publisher`](super::StreamMessageShared::from_publisher).
pub trait Publisher<T>: Send + Sync {
  /// Attaches a subscriber.
  fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>);
}
