use alloc::sync::Arc;

use super::{signal::Signal, stream_core::StreamCore};

/// Upstream side of a [`StreamCore`].
///
/// Composite producers plug into the delivery engine through this trait. Every method is
/// invoked without any engine lock held.
pub(crate) trait UpstreamLink<T>: Send + Sync {
  /// The downstream subscriber received `on_subscribe`.
  fn on_subscribe(self: Arc<Self>, _core: &Arc<StreamCore<T>>) {}

  /// The downstream subscriber requested `n` more elements.
  fn on_request(self: Arc<Self>, _core: &Arc<StreamCore<T>>, _n: i64) {}

  /// Returns the next signal for pull-based producers.
  ///
  /// Elements may only be returned when `has_demand` is `true`; terminal signals are always
  /// allowed.
  fn pull(&self, _has_demand: bool) -> Option<Signal<T>> {
    None
  }

  /// The stream was cancelled, aborted or failed by the subscriber.
  fn on_cancel(self: Arc<Self>) {}
}
