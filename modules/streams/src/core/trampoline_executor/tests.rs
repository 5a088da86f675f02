use alloc::{boxed::Box, sync::Arc, vec, vec::Vec};

use spin::Mutex;

use super::TrampolineExecutor;
use crate::core::Executor;

#[test]
fn runs_task_immediately_when_idle() {
  let executor = TrampolineExecutor::new();
  let log = Arc::new(Mutex::new(Vec::new()));
  let sink = log.clone();
  executor.execute(Box::new(move || sink.lock().push(1)));
  assert_eq!(*log.lock(), vec![1]);
  assert_eq!(executor.pending(), 0);
}

#[test]
fn nested_submissions_run_after_the_current_task() {
  let executor = Arc::new(TrampolineExecutor::new());
  let log = Arc::new(Mutex::new(Vec::new()));

  let outer_log = log.clone();
  let inner_executor = executor.clone();
  executor.execute(Box::new(move || {
    outer_log.lock().push("outer-start");
    let inner_log = outer_log.clone();
    inner_executor.execute(Box::new(move || inner_log.lock().push("inner")));
    outer_log.lock().push("outer-end");
  }));

  assert_eq!(*log.lock(), vec!["outer-start", "outer-end", "inner"]);
}
