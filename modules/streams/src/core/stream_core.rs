//! Delivery engine shared by the stream message implementations.
//!
//! The engine owns the single subscriber of a stream, its demand and a queue of signals that
//! are waiting for delivery. Producers push signals (or answer pulls through an
//! [`UpstreamLink`]); the engine delivers them on the subscriber's executor, one element per
//! unit of demand, with terminal signals delivered as soon as they reach the head of the
//! queue. No lock is held while a subscriber callback runs, while a link is invoked, or while a
//! task is submitted to an executor.

#[cfg(test)]
mod tests;

use alloc::{boxed::Box, collections::VecDeque, sync::Arc};

use spin::Mutex;

use super::{
  DemandTracker, ExecutorShared, StreamCompletion, StreamElement, StreamError, Subscriber, Subscription,
  SubscriptionOptions, noop_subscription::reject_subscriber, signal::Signal, upstream_link::UpstreamLink,
};

const TARGET: &str = "stream_message::core";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Idle,
  Subscribed,
  Terminated,
}

struct CoreState<T> {
  phase:           Phase,
  subscriber:      Option<Box<dyn Subscriber<T>>>,
  executor:        Option<ExecutorShared>,
  options:         SubscriptionOptions,
  demand:          DemandTracker,
  queue:           VecDeque<Signal<T>>,
  closed:          bool,
  published:       bool,
  drain_scheduled: bool,
  rerun:           bool,
  abort_cause:     Option<StreamError>,
}

impl<T> CoreState<T> {
  const fn new() -> Self {
    Self {
      phase:           Phase::Idle,
      subscriber:      None,
      executor:        None,
      options:         SubscriptionOptions::new(),
      demand:          DemandTracker::new(),
      queue:           VecDeque::new(),
      closed:          false,
      published:       false,
      drain_scheduled: false,
      rerun:           false,
      abort_cause:     None,
    }
  }

  /// Moves to the terminal phase and hands back what must be released outside the lock.
  fn terminate(&mut self) -> (Option<Box<dyn Subscriber<T>>>, VecDeque<Signal<T>>) {
    self.phase = Phase::Terminated;
    self.closed = true;
    self.demand.clear();
    (self.subscriber.take(), core::mem::take(&mut self.queue))
  }
}

enum Step<T> {
  Deliver(Box<dyn Subscriber<T>>, T, bool),
  Finish(Box<dyn Subscriber<T>>, Result<(), StreamError>),
  Pull(bool),
  Idle,
}

pub(crate) struct StreamCore<T> {
  state:      Mutex<CoreState<T>>,
  completion: StreamCompletion,
  link:       Option<Arc<dyn UpstreamLink<T>>>,
  pulls:      bool,
}

impl<T: StreamElement> StreamCore<T> {
  /// Creates an engine fed by pushes, optionally observed by `link`.
  pub(crate) fn new(link: Option<Arc<dyn UpstreamLink<T>>>) -> Arc<Self> {
    Arc::new(Self { state: Mutex::new(CoreState::new()), completion: StreamCompletion::new(), link, pulls: false })
  }

  /// Creates an engine that pulls its signals from `link`.
  pub(crate) fn pulling(link: Arc<dyn UpstreamLink<T>>) -> Arc<Self> {
    Arc::new(Self {
      state:      Mutex::new(CoreState::new()),
      completion: StreamCompletion::new(),
      link:       Some(link),
      pulls:      true,
    })
  }

  /// Creates a closed engine replaying `elements` followed by completion.
  pub(crate) fn closed_with(elements: VecDeque<T>) -> Arc<Self> {
    let mut state = CoreState::new();
    state.published = !elements.is_empty();
    state.closed = true;
    state.queue = elements.into_iter().map(Signal::Next).collect();
    state.queue.push_back(Signal::Complete);
    Arc::new(Self { state: Mutex::new(state), completion: StreamCompletion::new(), link: None, pulls: false })
  }

  pub(crate) fn is_open(&self) -> bool {
    !self.state.lock().closed
  }

  pub(crate) fn is_empty(&self) -> bool {
    let state = self.state.lock();
    state.closed && !state.published
  }

  pub(crate) fn demand(&self) -> i64 {
    self.state.lock().demand.current()
  }

  pub(crate) fn completion(&self) -> StreamCompletion {
    self.completion.clone()
  }

  /// Returns the subscriber's executor once a subscriber attached.
  pub(crate) fn executor(&self) -> Option<ExecutorShared> {
    self.state.lock().executor.clone()
  }

  pub(crate) fn subscribe(
    self: &Arc<Self>,
    subscriber: Box<dyn Subscriber<T>>,
    executor: ExecutorShared,
    options: SubscriptionOptions,
  ) {
    let accepted = {
      let mut state = self.state.lock();
      if state.phase == Phase::Idle {
        state.phase = Phase::Subscribed;
        state.subscriber = Some(subscriber);
        state.executor = Some(executor.clone());
        state.options = options;
        // start() performs the first drain
        state.drain_scheduled = true;
        Ok(())
      } else {
        Err((subscriber, state.abort_cause.clone().unwrap_or(StreamError::AlreadySubscribed)))
      }
    };
    if let Err((subscriber, error)) = accepted {
      reject_subscriber(subscriber, &executor, error);
      return;
    }
    let core = self.clone();
    executor.execute(Box::new(move || core.start()));
  }

  /// Queues a signal. Returns `false` (dropping the signal) once the stream is closed.
  pub(crate) fn push(self: &Arc<Self>, signal: Signal<T>) -> bool {
    let rejected = {
      let mut state = self.state.lock();
      if state.closed {
        Some(signal)
      } else {
        if signal.is_terminal() {
          state.closed = true;
        } else {
          state.published = true;
        }
        state.queue.push_back(signal);
        None
      }
    };
    if let Some(signal) = rejected {
      tracing::trace!(target: TARGET, terminal = signal.is_terminal(), "discarding signal for a closed stream");
      return false;
    }
    self.schedule_drain();
    true
  }

  /// Makes the engine look for deliverable signals on the subscriber's executor.
  pub(crate) fn schedule_drain(self: &Arc<Self>) {
    let executor = {
      let mut state = self.state.lock();
      if state.phase != Phase::Subscribed {
        return;
      }
      if state.drain_scheduled {
        state.rerun = true;
        return;
      }
      state.drain_scheduled = true;
      state.executor.clone()
    };
    if let Some(executor) = executor {
      let core = self.clone();
      executor.execute(Box::new(move || core.drain()));
    }
  }

  pub(crate) fn abort_with(self: &Arc<Self>, cause: StreamError) {
    let (dropped, subscribed) = {
      let mut state = self.state.lock();
      if state.phase == Phase::Terminated || state.abort_cause.is_some() {
        return;
      }
      state.abort_cause = Some(cause.clone());
      state.closed = true;
      let dropped = core::mem::take(&mut state.queue);
      if state.phase == Phase::Idle {
        state.phase = Phase::Terminated;
        (dropped, false)
      } else {
        state.queue.push_back(Signal::Error(cause.clone()));
        (dropped, true)
      }
    };
    drop(dropped);
    tracing::debug!(target: TARGET, %cause, subscribed, "stream aborted");
    if let Some(link) = &self.link {
      link.clone().on_cancel();
    }
    if subscribed {
      self.schedule_drain();
    } else {
      self.completion.complete(Err(cause));
    }
  }

  fn start(self: &Arc<Self>) {
    let Some(mut subscriber) = self.state.lock().subscriber.take() else {
      return;
    };
    subscriber.on_subscribe(Arc::new(CoreSubscription { core: self.clone() }));
    self.restore(subscriber);
    if let Some(link) = &self.link {
      link.clone().on_subscribe(self);
    }
    self.drain();
  }

  fn post<F>(self: &Arc<Self>, action: F)
  where
    F: FnOnce(&Arc<Self>) + Send + 'static, {
    let Some(executor) = self.executor() else {
      return;
    };
    let core = self.clone();
    executor.execute(Box::new(move || action(&core)));
  }

  fn handle_request(self: &Arc<Self>, n: i64) {
    let failure = {
      let mut state = self.state.lock();
      if state.phase != Phase::Subscribed {
        return;
      }
      match state.demand.request(n) {
        | Ok(_) => None,
        | Err(error) => {
          let (subscriber, dropped) = state.terminate();
          Some((subscriber, dropped, error))
        },
      }
    };
    match failure {
      | None => {
        if let Some(link) = &self.link {
          link.clone().on_request(self, n);
        }
        self.drain_inline();
      },
      | Some((subscriber, dropped, error)) => {
        drop(dropped);
        tracing::warn!(target: TARGET, requested = n, "subscriber requested non-positive demand");
        if let Some(link) = &self.link {
          link.clone().on_cancel();
        }
        if let Some(mut subscriber) = subscriber {
          subscriber.on_error(error.clone());
        }
        self.completion.complete(Err(error));
      },
    }
  }

  fn handle_cancel(self: &Arc<Self>) {
    let (subscriber, dropped, notify) = {
      let mut state = self.state.lock();
      if state.phase != Phase::Subscribed {
        return;
      }
      let notify = state.options.is_notify_cancellation();
      let (subscriber, dropped) = state.terminate();
      (subscriber, dropped, notify)
    };
    drop(dropped);
    tracing::debug!(target: TARGET, notify, "subscription cancelled");
    if let Some(link) = &self.link {
      link.clone().on_cancel();
    }
    if let Some(mut subscriber) = subscriber.filter(|_| notify) {
      subscriber.on_error(StreamError::CancelledSubscription);
    }
    self.completion.complete(Err(StreamError::CancelledSubscription));
  }

  fn drain_inline(self: &Arc<Self>) {
    {
      let mut state = self.state.lock();
      if state.drain_scheduled {
        state.rerun = true;
        return;
      }
      state.drain_scheduled = true;
    }
    self.drain();
  }

  fn drain(self: &Arc<Self>) {
    loop {
      match self.next_step() {
        | Step::Deliver(mut subscriber, element, with_pooled_objects) => {
          let element = if with_pooled_objects || !element.is_pooled() { element } else { element.into_unpooled() };
          subscriber.on_next(element);
          self.restore(subscriber);
        },
        | Step::Finish(mut subscriber, result) => {
          match &result {
            | Ok(()) => subscriber.on_complete(),
            | Err(error) => subscriber.on_error(error.clone()),
          }
          drop(subscriber);
          self.completion.complete(result);
          return;
        },
        | Step::Pull(has_demand) => {
          let pulled = self.link.as_ref().and_then(|link| link.pull(has_demand));
          if !self.after_pull(pulled) {
            return;
          }
        },
        | Step::Idle => return,
      }
    }
  }

  fn next_step(&self) -> Step<T> {
    let mut guard = self.state.lock();
    let state = &mut *guard;
    if state.phase != Phase::Subscribed || state.subscriber.is_none() {
      state.drain_scheduled = false;
      return Step::Idle;
    }
    match state.queue.front() {
      | Some(Signal::Next(_)) if state.demand.consume_one() => {
        let Some(Signal::Next(element)) = state.queue.pop_front() else {
          state.drain_scheduled = false;
          return Step::Idle;
        };
        match state.subscriber.take() {
          | Some(subscriber) => Step::Deliver(subscriber, element, state.options.is_with_pooled_objects()),
          | None => {
            state.drain_scheduled = false;
            Step::Idle
          },
        }
      },
      | Some(Signal::Next(_)) => {
        state.drain_scheduled = false;
        state.rerun = false;
        Step::Idle
      },
      | Some(_) => {
        let result = match state.queue.pop_front() {
          | Some(Signal::Error(error)) => Err(error),
          | _ => Ok(()),
        };
        let (subscriber, _) = state.terminate();
        state.drain_scheduled = false;
        match subscriber {
          | Some(subscriber) => Step::Finish(subscriber, result),
          | None => Step::Idle,
        }
      },
      | None if self.pulls => Step::Pull(state.demand.has_demand()),
      | None => {
        state.drain_scheduled = false;
        state.rerun = false;
        Step::Idle
      },
    }
  }

  /// Stores a pulled signal. Returns `true` while the drain loop should continue.
  fn after_pull(&self, pulled: Option<Signal<T>>) -> bool {
    let mut state = self.state.lock();
    match pulled {
      | Some(signal) if !state.closed => {
        if signal.is_terminal() {
          state.closed = true;
        } else {
          state.published = true;
        }
        state.queue.push_back(signal);
        true
      },
      | Some(signal) => {
        drop(state);
        drop(signal);
        true
      },
      | None if state.rerun || !state.queue.is_empty() => {
        state.rerun = false;
        true
      },
      | None => {
        state.drain_scheduled = false;
        false
      },
    }
  }

  fn restore(&self, subscriber: Box<dyn Subscriber<T>>) {
    let mut state = self.state.lock();
    if state.phase == Phase::Subscribed {
      state.subscriber = Some(subscriber);
    }
  }
}

struct CoreSubscription<T> {
  core: Arc<StreamCore<T>>,
}

impl<T: StreamElement> Subscription for CoreSubscription<T> {
  fn request(&self, n: i64) {
    self.core.post(move |core| core.handle_request(n));
  }

  fn cancel(&self) {
    self.core.post(|core| core.handle_cancel());
  }
}
