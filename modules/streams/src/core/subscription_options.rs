/// Options chosen once, when a subscriber attaches to a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
  with_pooled_objects: bool,
  notify_cancellation: bool,
}

impl SubscriptionOptions {
  /// Creates options with every behavior disabled.
  #[must_use]
  pub const fn new() -> Self {
    Self { with_pooled_objects: false, notify_cancellation: false }
  }

  /// Returns `true` when pooled elements are delivered without copying.
  ///
  /// The subscriber then owns the release of every pooled element it receives.
  #[must_use]
  pub const fn is_with_pooled_objects(&self) -> bool {
    self.with_pooled_objects
  }

  /// Returns `true` when cancellation is signaled through `on_error`.
  #[must_use]
  pub const fn is_notify_cancellation(&self) -> bool {
    self.notify_cancellation
  }

  /// Delivers pooled elements as-is instead of converting them to unpooled copies.
  #[must_use]
  pub const fn with_pooled_objects(mut self) -> Self {
    self.with_pooled_objects = true;
    self
  }

  /// Signals [`StreamError::CancelledSubscription`](super::StreamError::CancelledSubscription)
  /// to the subscriber when it cancels.
  #[must_use]
  pub const fn with_notify_cancellation(mut self) -> Self {
    self.notify_cancellation = true;
    self
  }
}
