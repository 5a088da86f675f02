use alloc::{boxed::Box, sync::Arc, vec::Vec};

use spin::Mutex;

use crate::core::{StreamError, Subscriber, SubscriptionShared};

#[derive(Clone, Copy)]
enum RequestPolicy {
  Manual,
  Initial(i64),
  OneByOne,
}

struct ProbeState<T> {
  policy:       RequestPolicy,
  subscription: Option<SubscriptionShared>,
  subscribed:   usize,
  elements:     Vec<T>,
  error:        Option<StreamError>,
  completed:    bool,
  violations:   usize,
}

impl<T> ProbeState<T> {
  const fn terminated(&self) -> bool {
    self.completed || self.error.is_some()
  }
}

/// Recording subscriber used by tests.
///
/// The probe hands out a [`Subscriber`] via [`TestSubscriberProbe::subscriber`] and records every
/// signal it receives. Signals that break the subscriber protocol (anything after a terminal
/// signal, or a second `on_subscribe`) are counted in
/// [`TestSubscriberProbe::protocol_violations`].
pub struct TestSubscriberProbe<T> {
  state: Arc<Mutex<ProbeState<T>>>,
}

impl<T> Clone for TestSubscriberProbe<T> {
  fn clone(&self) -> Self {
    Self { state: self.state.clone() }
  }
}

impl<T: Send + 'static> TestSubscriberProbe<T> {
  /// Creates a probe that only requests when told to.
  #[must_use]
  pub fn new() -> Self {
    Self::with_policy(RequestPolicy::Manual)
  }

  /// Creates a probe requesting `n` elements as soon as it is subscribed.
  #[must_use]
  pub fn with_initial_request(n: i64) -> Self {
    Self::with_policy(RequestPolicy::Initial(n))
  }

  /// Creates a probe requesting one element on subscription and one more after each element.
  #[must_use]
  pub fn one_by_one() -> Self {
    Self::with_policy(RequestPolicy::OneByOne)
  }

  fn with_policy(policy: RequestPolicy) -> Self {
    Self {
      state: Arc::new(Mutex::new(ProbeState {
        policy,
        subscription: None,
        subscribed: 0,
        elements: Vec::new(),
        error: None,
        completed: false,
        violations: 0,
      })),
    }
  }

  /// Returns a subscriber recording into this probe.
  #[must_use]
  pub fn subscriber(&self) -> Box<dyn Subscriber<T>> {
    Box::new(ProbeSubscriber { state: self.state.clone() })
  }

  /// Requests `n` elements through the recorded subscription.
  pub fn request(&self, n: i64) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.request(n);
    }
  }

  /// Cancels the recorded subscription.
  pub fn cancel(&self) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  /// Returns a copy of the received elements.
  #[must_use]
  pub fn elements(&self) -> Vec<T>
  where
    T: Clone, {
    self.state.lock().elements.clone()
  }

  /// Removes and returns the received elements.
  #[must_use]
  pub fn take_elements(&self) -> Vec<T> {
    core::mem::take(&mut self.state.lock().elements)
  }

  /// Returns the number of received elements.
  #[must_use]
  pub fn element_count(&self) -> usize {
    self.state.lock().elements.len()
  }

  /// Returns `true` once `on_subscribe` was received.
  #[must_use]
  pub fn is_subscribed(&self) -> bool {
    self.state.lock().subscribed > 0
  }

  /// Returns `true` once `on_complete` was received.
  #[must_use]
  pub fn is_completed(&self) -> bool {
    self.state.lock().completed
  }

  /// Returns the error received through `on_error`.
  #[must_use]
  pub fn error(&self) -> Option<StreamError> {
    self.state.lock().error.clone()
  }

  /// Returns `true` once a terminal signal was received.
  #[must_use]
  pub fn is_terminated(&self) -> bool {
    self.state.lock().terminated()
  }

  /// Returns the number of signals that violated the subscriber protocol.
  #[must_use]
  pub fn protocol_violations(&self) -> usize {
    self.state.lock().violations
  }
}

impl<T: Send + 'static> Default for TestSubscriberProbe<T> {
  fn default() -> Self {
    Self::new()
  }
}

struct ProbeSubscriber<T> {
  state: Arc<Mutex<ProbeState<T>>>,
}

impl<T: Send + 'static> Subscriber<T> for ProbeSubscriber<T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    let initial = {
      let mut state = self.state.lock();
      state.subscribed += 1;
      if state.subscribed > 1 {
        state.violations += 1;
        return;
      }
      state.subscription = Some(subscription.clone());
      match state.policy {
        | RequestPolicy::Manual => None,
        | RequestPolicy::Initial(n) => Some(n),
        | RequestPolicy::OneByOne => Some(1),
      }
    };
    if let Some(n) = initial {
      subscription.request(n);
    }
  }

  fn on_next(&mut self, element: T) {
    let next = {
      let mut state = self.state.lock();
      if state.terminated() || state.subscribed == 0 {
        state.violations += 1;
      }
      state.elements.push(element);
      match state.policy {
        | RequestPolicy::OneByOne => state.subscription.clone(),
        | _ => None,
      }
    };
    if let Some(subscription) = next {
      subscription.request(1);
    }
  }

  fn on_error(&mut self, error: StreamError) {
    let mut state = self.state.lock();
    if state.terminated() {
      state.violations += 1;
    }
    state.error = Some(error);
  }

  fn on_complete(&mut self) {
    let mut state = self.state.lock();
    if state.terminated() {
      state.violations += 1;
    }
    state.completed = true;
  }
}
