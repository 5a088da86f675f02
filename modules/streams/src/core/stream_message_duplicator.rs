
use alloc::sync::Arc;

use super::{
  DuplicatorConfig, ExecutorShared, StreamElement, StreamError, StreamMessageShared, duplicator_state::DuplicatorShared,
};

/// Fans one stream out into independently paced duplicates.
///
/// The duplicator subscribes to its source exactly once, on creation, and buffers the elements
/// until every live duplicate consumed them. While the duplicator is open it also keeps the
/// history, so a duplicate created late still observes the stream from its first element.
/// [`StreamMessageDuplicator::close`] (also run on drop) stops accepting duplicates and lets the
/// buffer drain as the remaining duplicates progress.
///
/// Upstream demand follows the most demanding duplicate. Configure
/// [`DuplicatorConfig::with_max_buffered_elements`] to bound the memory a slow duplicate can pin.
pub struct StreamMessageDuplicator<T: StreamElement> {
  shared: Arc<DuplicatorShared<T>>,
}

impl<T: StreamElement> StreamMessageDuplicator<T> {
  pub(crate) fn new(source: StreamMessageShared<T>, executor: ExecutorShared, config: DuplicatorConfig) -> Self {
    Self { shared: DuplicatorShared::new(source, executor, config) }
  }

  /// Returns a new duplicate of the source stream.
  ///
  /// # Errors
  ///
  /// - [`StreamError::DuplicatorClosed`] once the duplicator was closed.
  /// - [`StreamError::BufferExceeded`] once the history exceeded the buffer limit.
  /// - The abort cause once the duplicator was aborted.
  pub fn duplicate(&self) -> Result<StreamMessageShared<T>, StreamError> {
    self.shared.duplicate()
  }

  /// Stops accepting duplicates.
  ///
  /// Buffered elements are released as soon as the existing duplicates consumed them. Without
  /// remaining duplicates the upstream subscription is cancelled.
  pub fn close(&self) {
    self.shared.close();
  }

  /// Fails every duplicate with [`StreamError::Aborted`] and aborts the source.
  pub fn abort(&self) {
    self.abort_with(StreamError::Aborted);
  }

  /// Fails every duplicate with `cause` and aborts the source.
  pub fn abort_with(&self, cause: StreamError) {
    self.shared.abort_with(cause);
  }
}

impl<T: StreamElement> Drop for StreamMessageDuplicator<T> {
  fn drop(&mut self) {
    self.shared.close();
  }
}
