use alloc::{boxed::Box, sync::Arc, vec, vec::Vec};

use spin::Mutex;

use super::TokioSerialExecutor;
use crate::core::{
  DefaultStreamMessage, Executor, ExecutorShared, StreamError, StreamMessage, StreamMessageShared,
  SubscriptionOptions, UNBOUNDED_DEMAND, testing::TestSubscriberProbe,
};

#[test]
fn requires_a_runtime() {
  assert!(matches!(TokioSerialExecutor::try_current(), Err(StreamError::ExecutorUnavailable)));
}

#[tokio::test]
async fn runs_tasks_in_submission_order() {
  let executor = TokioSerialExecutor::try_current().unwrap();
  let log = Arc::new(Mutex::new(Vec::new()));
  let (done_tx, done_rx) = tokio::sync::oneshot::channel();
  for index in 0..8 {
    let sink = log.clone();
    executor.execute(Box::new(move || sink.lock().push(index)));
  }
  executor.execute(Box::new(move || {
    let _ = done_tx.send(());
  }));
  done_rx.await.unwrap();
  assert_eq!(*log.lock(), (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn delivers_stream_signals_on_the_runtime() {
  let executor = TokioSerialExecutor::shared(&tokio::runtime::Handle::current());
  let stream = DefaultStreamMessage::new();
  let probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
  stream.subscribe_with(probe.subscriber(), executor, SubscriptionOptions::new());
  for value in 0..5_u32 {
    stream.write(value).unwrap();
  }
  stream.close();
  stream.when_complete().await.unwrap();
  assert_eq!(probe.elements(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicates_progress_on_their_own_executors() {
  let handle = tokio::runtime::Handle::current();
  let source = DefaultStreamMessage::new();
  let duplicator = source.to_shared().to_duplicator_with(TokioSerialExecutor::shared(&handle), Default::default());
  let duplicates: Vec<StreamMessageShared<u32>> = (0..2).map(|_| duplicator.duplicate().unwrap()).collect();
  duplicator.close();

  let probes: Vec<TestSubscriberProbe<u32>> = duplicates
    .iter()
    .map(|duplicate| {
      let probe = TestSubscriberProbe::one_by_one();
      let executor: ExecutorShared = TokioSerialExecutor::shared(&handle);
      duplicate.subscribe_with(probe.subscriber(), executor, SubscriptionOptions::new());
      probe
    })
    .collect();

  for value in 0..100 {
    source.write(value).unwrap();
  }
  source.close();
  for duplicate in &duplicates {
    duplicate.when_complete().await.unwrap();
  }
  let expected: Vec<u32> = (0..100).collect();
  for probe in probes {
    assert_eq!(probe.elements(), expected);
    assert_eq!(probe.protocol_violations(), 0);
  }
}
