use alloc::{sync::Arc, vec::Vec};

use bytes::BytesMut;
use portable_atomic::{AtomicUsize, Ordering};
use spin::Mutex;

use super::PooledBuffer;

const DEFAULT_MAX_IDLE: usize = 64;

pub(crate) struct PoolState {
  idle:        Mutex<Vec<BytesMut>>,
  max_idle:    usize,
  outstanding: AtomicUsize,
}

impl PoolState {
  pub(crate) fn lease(&self, len: usize) -> BytesMut {
    self.outstanding.fetch_add(1, Ordering::AcqRel);
    let mut storage = self.idle.lock().pop().unwrap_or_default();
    storage.clear();
    storage.reserve(len);
    storage
  }

  pub(crate) fn recycle(&self, mut storage: BytesMut) {
    storage.clear();
    {
      let mut idle = self.idle.lock();
      if idle.len() < self.max_idle {
        idle.push(storage);
      }
    }
    self.outstanding.fetch_sub(1, Ordering::AcqRel);
  }
}

/// Pool of reusable byte buffers.
///
/// Every [`PooledBuffer`] allocated from the pool counts as one outstanding lease until its
/// last reference is dropped, which makes leaks observable through
/// [`BufferPool::outstanding`].
#[derive(Clone)]
pub struct BufferPool {
  state: Arc<PoolState>,
}

impl BufferPool {
  /// Creates a pool keeping at most 64 idle buffers.
  #[must_use]
  pub fn new() -> Self {
    Self::with_max_idle(DEFAULT_MAX_IDLE)
  }

  /// Creates a pool keeping at most `max_idle` idle buffers.
  #[must_use]
  pub fn with_max_idle(max_idle: usize) -> Self {
    Self {
      state: Arc::new(PoolState {
        idle: Mutex::new(Vec::new()),
        max_idle,
        outstanding: AtomicUsize::new(0),
      }),
    }
  }

  /// Allocates a pooled buffer holding a copy of `data`.
  #[must_use]
  pub fn allocate(&self, data: &[u8]) -> PooledBuffer {
    let mut storage = self.state.lease(data.len());
    storage.extend_from_slice(data);
    PooledBuffer::pooled(storage, self.state.clone())
  }

  /// Returns the number of leased buffers not yet returned to the pool.
  #[must_use]
  pub fn outstanding(&self) -> usize {
    self.state.outstanding.load(Ordering::Acquire)
  }

  /// Returns the number of idle buffers kept for reuse.
  #[must_use]
  pub fn idle(&self) -> usize {
    self.state.idle.lock().len()
  }
}

impl Default for BufferPool {
  fn default() -> Self {
    Self::new()
  }
}
