//! Serializing executor that runs tasks on the submitting thread.

#[cfg(test)]
mod tests;

use alloc::{collections::VecDeque, sync::Arc};

use portable_atomic::{AtomicBool, Ordering};
use spin::Mutex;

use super::{Executor, ExecutorShared, ExecutorTask};

/// Executor that drains its queue on whichever thread submits first.
///
/// A task submitted while another task is running is queued and runs after it returns, so
/// tasks never nest. Submissions from other threads during a drain are picked up by the
/// draining thread.
pub struct TrampolineExecutor {
  queue:    Mutex<VecDeque<ExecutorTask>>,
  draining: AtomicBool,
}

impl TrampolineExecutor {
  /// Creates an idle executor.
  #[must_use]
  pub const fn new() -> Self {
    Self { queue: Mutex::new(VecDeque::new()), draining: AtomicBool::new(false) }
  }

  /// Creates an idle executor behind a shared handle.
  #[must_use]
  pub fn shared() -> ExecutorShared {
    Arc::new(Self::new())
  }

  /// Returns the number of queued tasks.
  #[must_use]
  pub fn pending(&self) -> usize {
    self.queue.lock().len()
  }

  fn drain(&self) {
    loop {
      if self.draining.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
        return;
      }
      loop {
        let next = self.queue.lock().pop_front();
        match next {
          | Some(task) => task(),
          | None => break,
        }
      }
      self.draining.store(false, Ordering::Release);
      // 解放直後に積まれたタスクを取りこぼさない
      if self.queue.lock().is_empty() {
        return;
      }
    }
  }
}

impl Default for TrampolineExecutor {
  fn default() -> Self {
    Self::new()
  }
}

impl Executor for TrampolineExecutor {
  fn execute(&self, task: ExecutorTask) {
    self.queue.lock().push_back(task);
    self.drain();
  }
}
