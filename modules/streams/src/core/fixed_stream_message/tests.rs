use alloc::vec;

use super::FixedStreamMessage;
use crate::core::{BufferPool, PooledBuffer, StreamError, StreamMessage, testing::TestSubscriberProbe};

#[test]
fn fixed_streams_are_closed_from_construction() {
  let empty = FixedStreamMessage::<u8>::empty();
  assert!(!empty.is_open());
  assert!(empty.is_empty());

  let one = FixedStreamMessage::of_one(1_u8);
  assert!(!one.is_open());
  assert!(!one.is_empty());
}

#[test]
fn two_elements_are_replayed_in_order() {
  let stream = FixedStreamMessage::of_two("a", "b");
  let probe = TestSubscriberProbe::one_by_one();
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec!["a", "b"]);
  assert!(probe.is_completed());
  assert!(stream.is_complete());
}

#[test]
fn never_delivers_more_than_requested() {
  let stream = FixedStreamMessage::from_deque((1..=5).collect());
  let probe = TestSubscriberProbe::new();
  stream.subscribe(probe.subscriber());
  probe.request(2);
  assert_eq!(probe.elements(), vec![1, 2]);
  assert!(!probe.is_completed());
  assert_eq!(stream.demand(), 0);
}

#[test]
fn abort_releases_pooled_elements() {
  let pool = BufferPool::new();
  let stream = FixedStreamMessage::<PooledBuffer>::of_two(pool.allocate(b"1"), pool.allocate(b"2"));
  assert_eq!(pool.outstanding(), 2);
  stream.abort();
  assert_eq!(pool.outstanding(), 0);

  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(2);
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.error(), Some(StreamError::Aborted));
}
