use super::StreamError;

/// Polling result for stream completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
  /// Completion is still pending.
  Pending,
  /// Completion is ready with the provided result.
  Ready(Result<(), StreamError>),
}

impl Completion {
  /// Returns `true` once the completion resolved.
  #[must_use]
  pub const fn is_ready(&self) -> bool {
    matches!(self, Self::Ready(_))
  }
}
