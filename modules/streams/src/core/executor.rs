use alloc::{boxed::Box, sync::Arc};

/// Unit of work submitted to an [`Executor`].
pub type ExecutorTask = Box<dyn FnOnce() + Send + 'static>;

/// Shared executor handle.
pub type ExecutorShared = Arc<dyn Executor>;

/// Serialized task execution context.
///
/// Implementations must run submitted tasks one at a time, in submission order, and never
/// re-enter a running task. Every signal delivered to a subscriber runs on its executor.
pub trait Executor: Send + Sync {
  /// Submits a task for serialized execution.
  fn execute(&self, task: ExecutorTask);
}
