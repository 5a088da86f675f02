//! Serial executor running tasks on a Tokio runtime.

extern crate std;

#[cfg(test)]
mod tests;

use alloc::sync::Arc;

use tokio::{runtime::Handle, sync::mpsc};

use crate::core::{Executor, ExecutorShared, ExecutorTask, StreamError};

/// Executor feeding its tasks to a single Tokio task.
///
/// Tasks run one at a time in submission order. Tasks submitted after the runtime shut down are
/// dropped with a warning.
pub struct TokioSerialExecutor {
  sender: mpsc::UnboundedSender<ExecutorTask>,
}

impl TokioSerialExecutor {
  /// Spawns the worker task on `handle`.
  #[must_use]
  pub fn new(handle: &Handle) -> Self {
    let (sender, mut receiver) = mpsc::unbounded_channel::<ExecutorTask>();
    handle.spawn(async move {
      while let Some(task) = receiver.recv().await {
        task();
      }
    });
    Self { sender }
  }

  /// Spawns the worker task on the runtime of the calling context.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::ExecutorUnavailable`] outside a Tokio runtime.
  pub fn try_current() -> Result<Self, StreamError> {
    let handle = Handle::try_current().map_err(|_| StreamError::ExecutorUnavailable)?;
    Ok(Self::new(&handle))
  }

  /// Spawns the worker task on `handle` and returns a shared executor handle.
  #[must_use]
  pub fn shared(handle: &Handle) -> ExecutorShared {
    Arc::new(Self::new(handle))
  }
}

impl Executor for TokioSerialExecutor {
  fn execute(&self, task: ExecutorTask) {
    if self.sender.send(task).is_err() {
      tracing::warn!(target: "stream_message::executor", "tokio executor stopped, dropping task");
    }
  }
}
