use alloc::{vec, vec::Vec};

use crate::core::{
  BufferPool, Completion, PooledBuffer, StreamElement, StreamError, StreamMessageShared, SubscriptionOptions,
  TrampolineExecutor,
  testing::{TestPublisher, TestSubscriberProbe},
};

#[test]
fn filter_keeps_matching_elements() {
  let stream = StreamMessageShared::of(1_u32..=6).filter(|value| value % 3 == 0);
  let probe = TestSubscriberProbe::one_by_one();
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec![3, 6]);
  assert!(probe.is_completed());
}

#[test]
fn filter_rerequests_one_element_per_rejection() {
  let publisher = TestPublisher::new(1_u32..=4);
  let stream = StreamMessageShared::from_publisher(publisher.clone()).filter(|value| value % 2 == 0);
  let probe = TestSubscriberProbe::new();
  stream.subscribe(probe.subscriber());

  probe.request(1);
  assert_eq!(probe.elements(), vec![2]);
  assert_eq!(publisher.total_requested(), 2);
}

#[test]
fn map_transforms_each_element() {
  let stream = StreamMessageShared::of_two(2_u32, 3).map(|value| u64::from(value) * 10);
  let probe = TestSubscriberProbe::with_initial_request(8);
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec![20_u64, 30]);
  assert!(probe.is_completed());
  assert_eq!(stream.when_complete().peek(), Completion::Ready(Ok(())));
}

#[test]
fn try_map_failure_cancels_upstream_and_fails_subscriber() {
  let publisher = TestPublisher::new(1_u32..=5);
  let stream = StreamMessageShared::from_publisher(publisher.clone())
    .try_map(|value| if value == 2 { Err(StreamError::failed("no value for 2")) } else { Ok(value) });
  let probe = TestSubscriberProbe::with_initial_request(2);
  stream.subscribe(probe.subscriber());

  assert_eq!(probe.elements(), vec![1]);
  assert_eq!(probe.error(), Some(StreamError::failed("no value for 2")));
  assert!(publisher.is_cancelled());
  assert_eq!(probe.protocol_violations(), 0);
  assert_eq!(stream.when_complete().peek(), Completion::Ready(Err(StreamError::failed("no value for 2"))));
}

#[test]
fn fused_stream_accepts_a_single_subscriber() {
  let stream = StreamMessageShared::of_one(1_u8).map(|value| value + 1);
  let first = TestSubscriberProbe::with_initial_request(1);
  let second = TestSubscriberProbe::with_initial_request(1);
  stream.subscribe(first.subscriber());
  stream.subscribe(second.subscriber());
  assert_eq!(first.elements(), vec![2]);
  assert_eq!(second.error(), Some(StreamError::AlreadySubscribed));
}

#[test]
fn abort_reaches_the_source() {
  let source = StreamMessageShared::of(vec![1_u8, 2, 3]);
  let stream = source.clone().filter(|_| true);
  stream.abort();
  assert!(!source.is_open());
  assert!(source.is_complete());

  let probe = TestSubscriberProbe::<u8>::with_initial_request(1);
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.error(), Some(StreamError::Aborted));
  assert_eq!(stream.when_complete().peek(), Completion::Ready(Err(StreamError::Aborted)));
}

#[test]
fn mapped_pooled_output_is_unpooled_unless_requested() {
  let pool = BufferPool::new();
  let producer = pool.clone();
  let stream = StreamMessageShared::of(vec![1_u8, 2]).map(move |value| producer.allocate(&[value]));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(2);
  stream.subscribe(probe.subscriber());
  let received: Vec<PooledBuffer> = probe.take_elements();
  assert!(received.iter().all(|buffer| !buffer.is_pooled()));
  assert_eq!(pool.outstanding(), 0);

  let producer = pool.clone();
  let stream = StreamMessageShared::of_one(7_u8).map(move |value| producer.allocate(&[value]));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(1);
  let options = SubscriptionOptions::new().with_pooled_objects();
  stream.subscribe_with(probe.subscriber(), TrampolineExecutor::shared(), options);
  let received = probe.take_elements();
  assert!(received[0].is_pooled());
  assert_eq!(pool.outstanding(), 1);
  drop(received);
  assert_eq!(pool.outstanding(), 0);
}
