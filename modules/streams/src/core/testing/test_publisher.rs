use alloc::{boxed::Box, collections::VecDeque, sync::Arc, vec::Vec};

use spin::Mutex;

use crate::core::{Publisher, StreamError, Subscriber, Subscription};

struct PublisherLog<T> {
  items:      VecDeque<T>,
  failure:    Option<StreamError>,
  requests:   Vec<i64>,
  demand:     i64,
  subscribed: usize,
  cancelled:  bool,
  finished:   bool,
}

/// Foreign publisher emitting a fixed sequence on demand.
///
/// Emission happens synchronously inside `request`, the way a naive third-party publisher would
/// behave. Every request amount is recorded for later inspection. The publisher accepts one
/// subscriber; later ones are ignored.
pub struct TestPublisher<T> {
  log: Arc<Mutex<PublisherLog<T>>>,
}

impl<T> Clone for TestPublisher<T> {
  fn clone(&self) -> Self {
    Self { log: self.log.clone() }
  }
}

impl<T: Send + 'static> TestPublisher<T> {
  /// Creates a publisher emitting `items` and then completing.
  #[must_use]
  pub fn new(items: impl IntoIterator<Item = T>) -> Self {
    Self {
      log: Arc::new(Mutex::new(PublisherLog {
        items:      items.into_iter().collect(),
        failure:    None,
        requests:   Vec::new(),
        demand:     0,
        subscribed: 0,
        cancelled:  false,
        finished:   false,
      })),
    }
  }

  /// Fails with `error` instead of completing once the items ran out.
  #[must_use]
  pub fn failing_with(self, error: StreamError) -> Self {
    self.log.lock().failure = Some(error);
    self
  }

  /// Returns every amount passed to `request`.
  #[must_use]
  pub fn requests(&self) -> Vec<i64> {
    self.log.lock().requests.clone()
  }

  /// Returns the sum of all requested amounts, saturating at `i64::MAX`.
  #[must_use]
  pub fn total_requested(&self) -> i64 {
    self.log.lock().requests.iter().fold(0_i64, |total, n| total.saturating_add(*n))
  }

  /// Returns how many subscribers attached.
  #[must_use]
  pub fn subscriber_count(&self) -> usize {
    self.log.lock().subscribed
  }

  /// Returns `true` once the subscription was cancelled.
  #[must_use]
  pub fn is_cancelled(&self) -> bool {
    self.log.lock().cancelled
  }
}

impl<T: Send + 'static> Publisher<T> for TestPublisher<T> {
  fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
    {
      let mut log = self.log.lock();
      log.subscribed += 1;
      if log.subscribed > 1 {
        return;
      }
    }
    let subscription = Arc::new(TestSubscription { log: self.log.clone(), subscriber: Mutex::new(None) });
    subscriber.on_subscribe(subscription.clone());
    *subscription.subscriber.lock() = Some(subscriber);
    subscription.emit();
  }
}

struct TestSubscription<T> {
  log:        Arc<Mutex<PublisherLog<T>>>,
  subscriber: Mutex<Option<Box<dyn Subscriber<T>>>>,
}

enum Emission<T> {
  Next(T),
  Complete,
  Error(StreamError),
}

impl<T: Send + 'static> TestSubscription<T> {
  fn emit(&self) {
    // a missing subscriber means another call is emitting and will see the new demand
    let Some(mut subscriber) = self.subscriber.lock().take() else {
      return;
    };
    while let Some(emission) = self.next_emission() {
      match emission {
        | Emission::Next(item) => subscriber.on_next(item),
        | Emission::Complete => subscriber.on_complete(),
        | Emission::Error(error) => subscriber.on_error(error),
      }
    }
    let done = {
      let log = self.log.lock();
      log.cancelled || log.finished
    };
    if !done {
      *self.subscriber.lock() = Some(subscriber);
    }
  }

  fn next_emission(&self) -> Option<Emission<T>> {
    let mut log = self.log.lock();
    if log.cancelled || log.finished {
      return None;
    }
    if log.items.is_empty() {
      log.finished = true;
      return Some(log.failure.take().map_or(Emission::Complete, Emission::Error));
    }
    if log.demand == 0 {
      return None;
    }
    log.demand -= 1;
    log.items.pop_front().map(Emission::Next)
  }
}

impl<T: Send + 'static> Subscription for TestSubscription<T> {
  fn request(&self, n: i64) {
    {
      let mut log = self.log.lock();
      log.requests.push(n);
      log.demand = log.demand.saturating_add(n.max(0));
    }
    self.emit();
  }

  fn cancel(&self) {
    self.log.lock().cancelled = true;
    self.subscriber.lock().take();
  }
}
