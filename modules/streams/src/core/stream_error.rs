//! Stream error definitions.


use alloc::string::String;

/// Errors signaled to subscribers and completion handles.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StreamError {
  /// Another subscriber is already attached to the stream.
  #[error("only one subscriber is allowed")]
  AlreadySubscribed,
  /// A non-positive amount was requested.
  #[error("invalid demand request: {requested} (expected: > 0)")]
  InvalidDemand {
    /// The rejected request amount.
    requested: i64,
  },
  /// The stream was aborted by its owner.
  #[error("stream aborted")]
  Aborted,
  /// The subscription was cancelled by the subscriber.
  #[error("subscription cancelled")]
  CancelledSubscription,
  /// A duplicate fell too far behind the shared buffer.
  #[error("duplicator buffer exceeded {limit} elements")]
  BufferExceeded {
    /// The configured buffer limit.
    limit: usize,
  },
  /// The duplicator no longer accepts new duplicates.
  #[error("duplicator is closed")]
  DuplicatorClosed,
  /// The stream is closed and does not accept more elements.
  #[error("stream is closed")]
  Closed,
  /// No executor could be obtained from the runtime.
  #[error("executor unavailable")]
  ExecutorUnavailable,
  /// The producer or a transform failed.
  #[error("stream failed: {reason}")]
  Failed {
    /// Human readable failure description.
    reason: String,
  },
}

impl StreamError {
  /// Creates a [`StreamError::Failed`] with the provided reason.
  #[must_use]
  pub fn failed(reason: impl Into<String>) -> Self {
    Self::Failed { reason: reason.into() }
  }

  /// Returns `true` when the error represents a subscriber cancellation.
  #[must_use]
  pub const fn is_cancellation(&self) -> bool {
    matches!(self, Self::CancelledSubscription)
  }
}
