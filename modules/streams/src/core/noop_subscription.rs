use alloc::{boxed::Box, sync::Arc};

use super::{ExecutorShared, StreamError, Subscriber, Subscription, SubscriptionShared};

/// Subscription that ignores every call.
///
/// Handed to subscribers whose subscription attempt failed, right before the failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSubscription;

impl NoopSubscription {
  /// Returns a shared no-op subscription.
  #[must_use]
  pub fn shared() -> SubscriptionShared {
    Arc::new(Self)
  }
}

impl Subscription for NoopSubscription {
  fn request(&self, _n: i64) {}

  fn cancel(&self) {}
}

/// Delivers `on_subscribe(noop)` followed by `on_error(error)` on the subscriber's executor.
pub(crate) fn reject_subscriber<T: 'static>(
  mut subscriber: Box<dyn Subscriber<T>>,
  executor: &ExecutorShared,
  error: StreamError,
) {
  tracing::debug!(target: "stream_message::subscribe", %error, "rejecting subscriber");
  executor.execute(Box::new(move || {
    subscriber.on_subscribe(NoopSubscription::shared());
    subscriber.on_error(error);
  }));
}
