#![allow(clippy::unwrap_used, clippy::expect_used)]

use stream_message_rs::core::{
  BufferPool, Completion, DefaultStreamMessage, DuplicatorConfig, OverflowPolicy, PooledBuffer, StreamElement,
  StreamError, StreamMessage, StreamMessageShared, SubscriptionOptions, TrampolineExecutor, UNBOUNDED_DEMAND,
  identity,
  testing::{TestPublisher, TestSubscriberProbe},
};

fn sample_streams() -> Vec<(&'static str, StreamMessageShared<u32>)> {
  let writable = DefaultStreamMessage::new();
  writable.write(1).expect("write");
  vec![
    ("empty", StreamMessageShared::empty()),
    ("fixed", StreamMessageShared::of([1, 2, 3])),
    ("writable", writable.to_shared()),
    ("publisher", StreamMessageShared::from_publisher(TestPublisher::new([1, 2]))),
    ("filtered", StreamMessageShared::of([1, 2]).filter(|value| value % 2 == 0)),
    ("mapped", StreamMessageShared::of_one(1).map(|value| value + 1)),
    ("concat", StreamMessageShared::concat([StreamMessageShared::of_one(1), StreamMessageShared::of_one(2)])),
    ("concat_streams", StreamMessageShared::concat_streams(StreamMessageShared::of_one(StreamMessageShared::of_one(1)))),
    ("duplicate", StreamMessageShared::of([1, 2]).to_duplicator().duplicate().expect("duplicate")),
  ]
}

#[test]
fn aborted_streams_close_and_reject_every_subscriber() {
  for (name, stream) in sample_streams() {
    stream.abort_with(StreamError::failed("owner gave up"));
    assert!(!stream.is_open(), "{name} is still open");
    assert!(stream.is_complete(), "{name} did not complete");

    let probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
    stream.subscribe(probe.subscriber());
    assert_eq!(probe.element_count(), 0, "{name} delivered elements");
    assert_eq!(probe.error(), Some(StreamError::failed("owner gave up")), "{name} error");
  }
}

#[test]
fn fixed_streams_replay_in_order_one_by_one() {
  for count in [0_usize, 1, 2, 7] {
    let expected: Vec<usize> = (0..count).collect();
    let stream = StreamMessageShared::of(expected.clone());
    let probe = TestSubscriberProbe::one_by_one();
    stream.subscribe(probe.subscriber());
    assert_eq!(probe.elements(), expected);
    assert!(probe.is_completed());
    assert_eq!(probe.protocol_violations(), 0);
  }
}

#[test]
fn concatenation_preserves_order() {
  let first = StreamMessageShared::of_two(1_u32, 2);
  let second = StreamMessageShared::of_one(3);
  let stream = StreamMessageShared::concat([first, second]);
  let probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec![1, 2, 3]);
  assert!(probe.is_completed());
}

#[test]
fn failing_child_ends_concatenation_before_the_next_child() {
  let first = DefaultStreamMessage::new();
  let untouched = TestPublisher::new([3_u32]);
  let stream =
    StreamMessageShared::concat([first.to_shared(), StreamMessageShared::from_publisher(untouched.clone())]);
  let probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
  stream.subscribe(probe.subscriber());

  first.write(1).expect("write");
  first.close_with(StreamError::failed("child"));
  assert_eq!(probe.elements(), vec![1]);
  assert_eq!(probe.error(), Some(StreamError::failed("child")));
  assert_eq!(untouched.subscriber_count(), 0);
}

#[test]
fn late_duplicate_sees_everything_and_references_return_to_baseline() {
  let pool = BufferPool::new();
  let source = StreamMessageShared::of([b"x", b"y", b"z"].map(|chunk| pool.allocate(chunk)));
  assert_eq!(pool.outstanding(), 3);

  let duplicator = source.to_duplicator();
  let early = duplicator.duplicate().expect("early duplicate");
  let early_probe = TestSubscriberProbe::<PooledBuffer>::one_by_one();
  early.subscribe(early_probe.subscriber());
  assert!(early_probe.is_completed());

  let late = duplicator.duplicate().expect("late duplicate");
  duplicator.close();
  assert_eq!(pool.outstanding(), 3);

  let late_probe = TestSubscriberProbe::<PooledBuffer>::one_by_one();
  late.subscribe(late_probe.subscriber());
  let bodies: Vec<Vec<u8>> = late_probe.take_elements().iter().map(|buffer| buffer.as_bytes().to_vec()).collect();
  assert_eq!(bodies, vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()]);
  assert!(late_probe.is_completed());
  assert_eq!(pool.outstanding(), 0);
}

#[test]
fn cancelled_duplicate_releases_its_share() {
  let pool = BufferPool::new();
  let source = StreamMessageShared::of([pool.allocate(b"a"), pool.allocate(b"b")]);
  let duplicator = source.to_duplicator();
  let reader = duplicator.duplicate().expect("reader");
  let quitter = duplicator.duplicate().expect("quitter");
  duplicator.close();

  let reader_probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(UNBOUNDED_DEMAND);
  reader.subscribe(reader_probe.subscriber());
  assert_eq!(pool.outstanding(), 2);

  let quitter_probe = TestSubscriberProbe::<PooledBuffer>::new();
  quitter.subscribe(quitter_probe.subscriber());
  quitter_probe.cancel();
  assert_eq!(pool.outstanding(), 0);
}

#[test]
fn filter_preserves_demand_across_rejections() {
  let publisher = TestPublisher::new([1_u32, 2, 3, 4]);
  let stream = StreamMessageShared::from_publisher(publisher.clone()).filter(|value| value % 2 == 0);
  let probe = TestSubscriberProbe::new();
  stream.subscribe(probe.subscriber());

  probe.request(2);
  assert_eq!(probe.elements(), vec![2, 4]);
  let filtered_out = 2;
  assert_eq!(publisher.total_requested(), 2 + filtered_out);
}

#[test]
fn map_identity_is_indistinguishable_from_the_source() {
  let original = StreamMessageShared::of([4_u8, 5, 6]);
  let mapped = original.clone().map(identity);

  let probe = TestSubscriberProbe::one_by_one();
  mapped.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec![4, 5, 6]);
  assert!(original.is_complete());

  let second = TestSubscriberProbe::<u8>::new();
  original.subscribe(second.subscriber());
  assert_eq!(second.error(), Some(StreamError::AlreadySubscribed));
}

#[test]
fn missing_map_result_is_an_error_signal() {
  let stream = StreamMessageShared::of(["1", "two", "3"])
    .try_map(|text| text.parse::<u32>().map_err(|_| StreamError::failed("not a number")));
  let probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
  stream.subscribe(probe.subscriber());
  assert_eq!(probe.elements(), vec![1]);
  assert_eq!(probe.error(), Some(StreamError::failed("not a number")));
  assert_eq!(stream.when_complete().peek(), Completion::Ready(Err(StreamError::failed("not a number"))));
}

#[test]
fn lagging_duplicate_fails_with_buffer_exceeded() {
  let source = DefaultStreamMessage::new();
  let config = DuplicatorConfig::new().with_max_buffered_elements(3).with_overflow_policy(OverflowPolicy::FailSlowest);
  let duplicator = source.to_shared().to_duplicator_with(TrampolineExecutor::shared(), config);
  let steady = duplicator.duplicate().expect("steady");
  let lagging = duplicator.duplicate().expect("lagging");
  duplicator.close();

  let steady_probe = TestSubscriberProbe::with_initial_request(UNBOUNDED_DEMAND);
  let lagging_probe = TestSubscriberProbe::<u32>::with_initial_request(1);
  steady.subscribe(steady_probe.subscriber());
  lagging.subscribe(lagging_probe.subscriber());

  for value in 0..10 {
    source.write(value).expect("write");
  }
  source.close();

  assert_eq!(lagging_probe.elements(), vec![0]);
  assert_eq!(lagging_probe.error(), Some(StreamError::BufferExceeded { limit: 3 }));
  assert_eq!(steady_probe.elements(), (0..10).collect::<Vec<_>>());
  assert!(steady_probe.is_completed());
}

#[test]
fn pooled_delivery_is_opt_in() {
  let pool = BufferPool::new();
  let copied = StreamMessageShared::of_one(pool.allocate(b"copy"));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(1);
  copied.subscribe(probe.subscriber());
  assert!(probe.take_elements().iter().all(|buffer| !buffer.is_pooled()));
  assert_eq!(pool.outstanding(), 0);

  let owned = StreamMessageShared::of_one(pool.allocate(b"own"));
  let probe = TestSubscriberProbe::<PooledBuffer>::with_initial_request(1);
  owned.subscribe_with(probe.subscriber(), TrampolineExecutor::shared(), SubscriptionOptions::new().with_pooled_objects());
  let received = probe.take_elements();
  assert!(received.iter().all(|buffer| buffer.is_pooled()));
  assert_eq!(pool.outstanding(), 1);
  drop(received);
  assert_eq!(pool.outstanding(), 0);
}
