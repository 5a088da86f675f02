//! Reference-counted payload that may borrow its storage from a [`BufferPool`].


use alloc::sync::Arc;
use core::fmt;

use bytes::{Bytes, BytesMut};

use super::{StreamElement, buffer_pool::PoolState};

struct PooledStorage {
  bytes: BytesMut,
  pool:  Arc<PoolState>,
}

impl Drop for PooledStorage {
  fn drop(&mut self) {
    self.pool.recycle(core::mem::take(&mut self.bytes));
  }
}

enum BufferRepr {
  Pooled(Arc<PooledStorage>),
  Unpooled(Bytes),
}

/// Byte payload, either pooled or unpooled.
///
/// A pooled buffer is one reference to storage leased from a [`BufferPool`](super::BufferPool).
/// [`StreamElement::retained_duplicate`] adds a reference, dropping releases one, and the
/// storage goes back to the pool when the last reference is released.
pub struct PooledBuffer {
  repr: BufferRepr,
}

impl PooledBuffer {
  pub(crate) fn pooled(bytes: BytesMut, pool: Arc<PoolState>) -> Self {
    Self { repr: BufferRepr::Pooled(Arc::new(PooledStorage { bytes, pool })) }
  }

  /// Creates an unpooled buffer.
  #[must_use]
  pub fn unpooled(bytes: impl Into<Bytes>) -> Self {
    Self { repr: BufferRepr::Unpooled(bytes.into()) }
  }

  /// Returns the payload.
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    match &self.repr {
      | BufferRepr::Pooled(storage) => &storage.bytes,
      | BufferRepr::Unpooled(bytes) => bytes,
    }
  }

  /// Returns the payload length.
  #[must_use]
  pub fn len(&self) -> usize {
    self.as_bytes().len()
  }

  /// Returns `true` when the payload is empty.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.as_bytes().is_empty()
  }

  /// Returns the number of live references to the pooled storage, or `1` when unpooled.
  #[must_use]
  pub fn ref_count(&self) -> usize {
    match &self.repr {
      | BufferRepr::Pooled(storage) => Arc::strong_count(storage),
      | BufferRepr::Unpooled(_) => 1,
    }
  }
}

impl StreamElement for PooledBuffer {
  fn is_pooled(&self) -> bool {
    matches!(self.repr, BufferRepr::Pooled(_))
  }

  fn retained_duplicate(&self) -> Self {
    match &self.repr {
      | BufferRepr::Pooled(storage) => Self { repr: BufferRepr::Pooled(storage.clone()) },
      | BufferRepr::Unpooled(bytes) => Self { repr: BufferRepr::Unpooled(bytes.clone()) },
    }
  }

  fn into_unpooled(self) -> Self {
    match self.repr {
      | BufferRepr::Pooled(storage) => Self::unpooled(Bytes::copy_from_slice(&storage.bytes)),
      | unpooled @ BufferRepr::Unpooled(_) => Self { repr: unpooled },
    }
  }
}

impl fmt::Debug for PooledBuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PooledBuffer").field("pooled", &self.is_pooled()).field("len", &self.len()).finish()
  }
}

impl PartialEq for PooledBuffer {
  fn eq(&self, other: &Self) -> bool {
    self.as_bytes() == other.as_bytes()
  }
}

impl Eq for PooledBuffer {}
