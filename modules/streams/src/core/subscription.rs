use alloc::sync::Arc;

/// Shared subscription handle.
pub type SubscriptionShared = Arc<dyn Subscription>;

/// Binding between a stream and its subscriber.
pub trait Subscription: Send + Sync {
  /// Requests `n` more elements. A non-positive `n` fails the subscription with
  /// [`StreamError::InvalidDemand`](super::StreamError::InvalidDemand).
  fn request(&self, n: i64);

  /// Stops delivery and releases the resources held for this subscriber.
  fn cancel(&self);
}
