//! Demand tracker implementation.


use crate::core::stream_error::StreamError;

/// Demand value meaning "send everything".
pub const UNBOUNDED_DEMAND: i64 = i64::MAX;

/// Tracks the outstanding demand of a single subscription.
///
/// Demand is a signed 64-bit counter that never goes negative and saturates at
/// [`UNBOUNDED_DEMAND`]. Once unbounded, consuming elements no longer decrements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemandTracker {
  current: i64,
}

impl DemandTracker {
  /// Creates a new demand tracker with zero demand.
  #[must_use]
  pub const fn new() -> Self {
    Self { current: 0 }
  }

  /// Returns the current demand value.
  #[must_use]
  pub const fn current(&self) -> i64 {
    self.current
  }

  /// Returns `true` once the demand saturated to [`UNBOUNDED_DEMAND`].
  #[must_use]
  pub const fn is_unbounded(&self) -> bool {
    self.current == UNBOUNDED_DEMAND
  }

  /// Returns `true` if at least one element may be delivered.
  #[must_use]
  pub const fn has_demand(&self) -> bool {
    self.current > 0
  }

  /// Adds demand to the tracker.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::InvalidDemand`] when `amount` is zero or negative.
  pub const fn request(&mut self, amount: i64) -> Result<i64, StreamError> {
    if amount <= 0 {
      return Err(StreamError::InvalidDemand { requested: amount });
    }
    self.current = self.current.saturating_add(amount);
    Ok(self.current)
  }

  /// Consumes a single unit of demand when available.
  #[must_use]
  pub const fn consume_one(&mut self) -> bool {
    match self.current {
      | UNBOUNDED_DEMAND => true,
      | value if value > 0 => {
        self.current = value - 1;
        true
      },
      | _ => false,
    }
  }

  /// Drops any outstanding demand.
  pub const fn clear(&mut self) {
    self.current = 0;
  }
}

impl Default for DemandTracker {
  fn default() -> Self {
    Self::new()
  }
}
