use alloc::{collections::VecDeque, sync::Arc, vec, vec::Vec};

use portable_atomic::{AtomicUsize, Ordering};

use super::StreamCore;
use crate::core::{
  BufferPool, Completion, PooledBuffer, StreamElement, StreamError, SubscriptionOptions, TrampolineExecutor,
  signal::Signal, testing::TestSubscriberProbe, upstream_link::UpstreamLink,
};

fn closed(values: &[u32]) -> Arc<StreamCore<u32>> {
  StreamCore::closed_with(values.iter().copied().collect::<VecDeque<_>>())
}

#[test]
fn closed_engine_replays_one_element_per_request() {
  let core = closed(&[1, 2, 3]);
  assert!(!core.is_open());
  assert!(!core.is_empty());

  let probe = TestSubscriberProbe::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  assert!(probe.is_subscribed());
  assert_eq!(probe.element_count(), 0);

  probe.request(1);
  assert_eq!(probe.elements(), vec![1]);
  probe.request(2);
  assert_eq!(probe.elements(), vec![1, 2, 3]);
  assert!(probe.is_completed());
  assert_eq!(core.completion().peek(), Completion::Ready(Ok(())));
  assert_eq!(probe.protocol_violations(), 0);
}

#[test]
fn empty_engine_completes_without_demand() {
  let core = closed(&[]);
  assert!(core.is_empty());
  let probe = TestSubscriberProbe::<u32>::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  assert!(probe.is_completed());
}

#[test]
fn second_subscriber_is_rejected() {
  let core = closed(&[1]);
  let first = TestSubscriberProbe::with_initial_request(1);
  core.subscribe(first.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());

  let second = TestSubscriberProbe::<u32>::new();
  core.subscribe(second.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  assert!(second.is_subscribed());
  assert_eq!(second.error(), Some(StreamError::AlreadySubscribed));
  assert_eq!(first.elements(), vec![1]);
  assert!(first.is_completed());
}

#[test]
fn push_is_rejected_after_terminal_signal() {
  let core = StreamCore::<u32>::new(None);
  assert!(core.is_open());
  assert!(core.push(Signal::Next(1)));
  assert!(core.push(Signal::Complete));
  assert!(!core.is_open());
  assert!(!core.push(Signal::Next(2)));
  assert!(!core.is_empty());
}

#[test]
fn non_positive_request_fails_the_subscriber() {
  let core = closed(&[1, 2]);
  let probe = TestSubscriberProbe::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  probe.request(0);
  assert_eq!(probe.error(), Some(StreamError::InvalidDemand { requested: 0 }));
  assert_eq!(core.completion().peek(), Completion::Ready(Err(StreamError::InvalidDemand { requested: 0 })));
  probe.request(1);
  assert_eq!(probe.element_count(), 0);
}

#[test]
fn cancellation_is_silent_by_default() {
  let core = closed(&[1, 2]);
  let probe = TestSubscriberProbe::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  probe.cancel();
  assert!(!probe.is_terminated());
  assert_eq!(core.completion().peek(), Completion::Ready(Err(StreamError::CancelledSubscription)));
}

#[test]
fn cancellation_is_signaled_when_requested() {
  let core = closed(&[1, 2]);
  let probe = TestSubscriberProbe::<u32>::new();
  let options = SubscriptionOptions::new().with_notify_cancellation();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), options);
  probe.cancel();
  assert_eq!(probe.error(), Some(StreamError::CancelledSubscription));
}

#[test]
fn abort_before_subscription_rejects_later_subscribers() {
  let core = StreamCore::<u32>::new(None);
  core.push(Signal::Next(7));
  core.abort_with(StreamError::failed("boom"));
  assert!(!core.is_open());
  assert_eq!(core.completion().peek(), Completion::Ready(Err(StreamError::failed("boom"))));

  let probe = TestSubscriberProbe::<u32>::with_initial_request(1);
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  assert_eq!(probe.error(), Some(StreamError::failed("boom")));
  assert_eq!(probe.element_count(), 0);
}

#[test]
fn abort_after_completion_is_ignored() {
  let core = closed(&[1]);
  let probe = TestSubscriberProbe::with_initial_request(1);
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  core.abort_with(StreamError::Aborted);
  assert!(probe.is_completed());
  assert_eq!(probe.error(), None);
  assert_eq!(core.completion().peek(), Completion::Ready(Ok(())));
}

#[test]
fn abort_drops_buffered_pooled_elements() {
  let pool = BufferPool::new();
  let core = StreamCore::<PooledBuffer>::new(None);
  core.push(Signal::Next(pool.allocate(b"a")));
  core.push(Signal::Next(pool.allocate(b"b")));
  assert_eq!(pool.outstanding(), 2);

  let probe = TestSubscriberProbe::<PooledBuffer>::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  core.abort_with(StreamError::Aborted);
  assert_eq!(pool.outstanding(), 0);
  assert_eq!(probe.error(), Some(StreamError::Aborted));
}

#[test]
fn pooled_elements_are_unpooled_unless_requested() {
  let pool = BufferPool::new();
  let plain = StreamCore::closed_with(VecDeque::from(vec![pool.allocate(b"x")]));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(1);
  plain.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  let received = probe.take_elements();
  assert!(!received[0].is_pooled());
  assert_eq!(pool.outstanding(), 0);

  let pooled = StreamCore::closed_with(VecDeque::from(vec![pool.allocate(b"y")]));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(1);
  let options = SubscriptionOptions::new().with_pooled_objects();
  pooled.subscribe(probe.subscriber(), TrampolineExecutor::shared(), options);
  let received = probe.take_elements();
  assert!(received[0].is_pooled());
  assert_eq!(pool.outstanding(), 1);
  drop(received);
  assert_eq!(pool.outstanding(), 0);
}

struct CountingLink {
  remaining: AtomicUsize,
  pulls:     AtomicUsize,
  cancels:   AtomicUsize,
}

impl UpstreamLink<u32> for CountingLink {
  fn pull(&self, has_demand: bool) -> Option<Signal<u32>> {
    self.pulls.fetch_add(1, Ordering::SeqCst);
    let remaining = self.remaining.load(Ordering::SeqCst);
    if remaining == 0 {
      return Some(Signal::Complete);
    }
    if !has_demand {
      return None;
    }
    self.remaining.store(remaining - 1, Ordering::SeqCst);
    Some(Signal::Next(remaining as u32))
  }

  fn on_cancel(self: Arc<Self>) {
    self.cancels.fetch_add(1, Ordering::SeqCst);
  }
}

#[test]
fn pulling_engine_asks_the_link_only_with_demand() {
  let link = Arc::new(CountingLink {
    remaining: AtomicUsize::new(2),
    pulls:     AtomicUsize::new(0),
    cancels:   AtomicUsize::new(0),
  });
  let core = StreamCore::pulling(link.clone());
  let probe = TestSubscriberProbe::one_by_one();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  let received: Vec<u32> = probe.elements();
  assert_eq!(received, vec![2, 1]);
  assert!(probe.is_completed());
  assert_eq!(link.cancels.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelling_a_pulling_engine_notifies_the_link() {
  let link = Arc::new(CountingLink {
    remaining: AtomicUsize::new(5),
    pulls:     AtomicUsize::new(0),
    cancels:   AtomicUsize::new(0),
  });
  let core = StreamCore::pulling(link.clone());
  let probe = TestSubscriberProbe::new();
  core.subscribe(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new());
  probe.request(1);
  assert_eq!(probe.elements(), vec![5]);
  probe.cancel();
  assert_eq!(link.cancels.load(Ordering::SeqCst), 1);
  assert_eq!(core.completion().peek(), Completion::Ready(Err(StreamError::CancelledSubscription)));
}
