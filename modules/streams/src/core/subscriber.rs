use super::{StreamError, SubscriptionShared};

/// Receiver of stream signals.
///
/// Signals for one subscriber never overlap: they all run on the executor chosen at
/// subscription time. `on_subscribe` is always the first signal, and at most one of
/// `on_complete`/`on_error` follows the elements.
pub trait Subscriber<T>: Send {
  /// Receives the subscription used to request elements or cancel.
  fn on_subscribe(&mut self, subscription: SubscriptionShared);

  /// Receives the next element.
  fn on_next(&mut self, element: T);

  /// Receives the terminal failure.
  fn on_error(&mut self, error: StreamError);

  /// Receives successful completion.
  fn on_complete(&mut self);
}
