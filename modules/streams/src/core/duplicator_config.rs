
use super::OverflowPolicy;

/// Configuration applied when a stream is handed to a duplicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicatorConfig {
  max_buffered_elements: Option<usize>,
  overflow_policy:       OverflowPolicy,
}

impl DuplicatorConfig {
  /// Creates a configuration without a buffer limit.
  #[must_use]
  pub const fn new() -> Self {
    Self { max_buffered_elements: None, overflow_policy: OverflowPolicy::FailSlowest }
  }

  /// Returns the maximum number of buffered elements, if limited.
  #[must_use]
  pub const fn max_buffered_elements(&self) -> Option<usize> {
    self.max_buffered_elements
  }

  /// Limits how many elements a duplicate may fall behind.
  ///
  /// A limit of zero is raised to one.
  #[must_use]
  pub const fn with_max_buffered_elements(mut self, limit: usize) -> Self {
    self.max_buffered_elements = Some(if limit == 0 { 1 } else { limit });
    self
  }

  /// Returns the policy applied when the limit is exceeded.
  #[must_use]
  pub const fn overflow_policy(&self) -> OverflowPolicy {
    self.overflow_policy
  }

  /// Sets the policy applied when the limit is exceeded.
  #[must_use]
  pub const fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
    self.overflow_policy = policy;
    self
  }
}
