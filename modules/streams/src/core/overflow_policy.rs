/// Reaction of a duplicator when a duplicate falls behind the buffer limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
  /// Fails only the duplicates that fell behind; the others continue.
  #[default]
  FailSlowest,
  /// Fails every duplicate and cancels the upstream subscription.
  FailAll,
}
