use core::any::{Any, TypeId};

/// Returns its argument.
///
/// Passing this function to [`StreamMessageShared::map`](super::StreamMessageShared::map)
/// returns the original stream instead of wrapping it.
#[must_use]
pub const fn identity<T>(value: T) -> T {
  value
}

/// Returns `true` when `F` is the function item `identity::<T>`.
pub(crate) fn is_identity<T: 'static, F: 'static>() -> bool {
  TypeId::of::<F>() == type_id_of(&identity::<T>)
}

/// Moves the value out of `slot` when `A` and `B` are the same type.
pub(crate) fn take_if_same<A: 'static, B: 'static>(slot: &mut Option<A>) -> Option<B> {
  (slot as &mut dyn Any).downcast_mut::<Option<B>>().and_then(Option::take)
}

fn type_id_of<V: 'static>(_: &V) -> TypeId {
  TypeId::of::<V>()
}
