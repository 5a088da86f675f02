use alloc::{string::String, vec::Vec};

use bytes::Bytes;

/// Element carried by a stream message.
///
/// Pooled elements borrow storage from a pool and must be released exactly once; in Rust the
/// release is the element's `Drop`. Plain values use the default method bodies.
pub trait StreamElement: Send + Sized + 'static {
  /// Returns `true` when the element holds pooled storage.
  fn is_pooled(&self) -> bool {
    false
  }

  /// Returns another handle to the same payload, retaining pooled storage once more.
  #[must_use]
  fn retained_duplicate(&self) -> Self;

  /// Converts the element into a form that does not hold pooled storage.
  ///
  /// Pooled storage is released as part of the conversion.
  #[must_use]
  fn into_unpooled(self) -> Self {
    self
  }
}

macro_rules! impl_plain_element {
  ($($ty:ty),* $(,)?) => {
    $(
      impl StreamElement for $ty {
        fn retained_duplicate(&self) -> Self {
          self.clone()
        }
      }
    )*
  };
}

impl_plain_element!(
  bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, String, &'static str, Bytes,
);

impl<T> StreamElement for Vec<T>
where
  T: Clone + Send + 'static,
{
  fn retained_duplicate(&self) -> Self {
    self.clone()
  }
}
