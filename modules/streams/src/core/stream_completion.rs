use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{
  future::Future,
  pin::Pin,
  task::{Context, Poll, Waker},
};

use spin::Mutex;

use super::{Completion, StreamError};


type CompletionCallback = Box<dyn FnOnce(&Result<(), StreamError>) + Send>;

struct CompletionState {
  result:    Option<Result<(), StreamError>>,
  wakers:    Vec<Waker>,
  callbacks: Vec<CompletionCallback>,
}

impl CompletionState {
  const fn new() -> Self {
    Self { result: None, wakers: Vec::new(), callbacks: Vec::new() }
  }
}

/// Handle used to observe stream completion.
///
/// Resolves exactly once: on successful completion, on failure, on cancellation
/// ([`StreamError::CancelledSubscription`]) or on abort (the abort cause). The handle is a
/// [`Future`] and can also be polled without an async runtime via [`StreamCompletion::peek`].
pub struct StreamCompletion {
  inner: Arc<Mutex<CompletionState>>,
}

impl Clone for StreamCompletion {
  fn clone(&self) -> Self {
    Self { inner: self.inner.clone() }
  }
}

impl StreamCompletion {
  /// Creates a new pending completion handle.
  #[must_use]
  pub fn new() -> Self {
    Self { inner: Arc::new(Mutex::new(CompletionState::new())) }
  }

  /// Returns the current completion state without waiting.
  #[must_use]
  pub fn peek(&self) -> Completion {
    match self.inner.lock().result.clone() {
      | Some(result) => Completion::Ready(result),
      | None => Completion::Pending,
    }
  }

  /// Returns `true` once the completion resolved.
  #[must_use]
  pub fn is_done(&self) -> bool {
    self.inner.lock().result.is_some()
  }

  /// Registers a callback invoked with the completion result.
  ///
  /// The callback runs immediately on the calling thread when the completion already resolved.
  pub fn on_complete<F>(&self, callback: F)
  where
    F: FnOnce(&Result<(), StreamError>) + Send + 'static, {
    let resolved = {
      let mut guard = self.inner.lock();
      match &guard.result {
        | Some(result) => result.clone(),
        | None => {
          guard.callbacks.push(Box::new(callback));
          return;
        },
      }
    };
    callback(&resolved);
  }

  /// Resolves the completion. Returns `false` when it had already resolved.
  pub(crate) fn complete(&self, result: Result<(), StreamError>) -> bool {
    let (wakers, callbacks) = {
      let mut guard = self.inner.lock();
      if guard.result.is_some() {
        return false;
      }
      guard.result = Some(result.clone());
      (core::mem::take(&mut guard.wakers), core::mem::take(&mut guard.callbacks))
    };
    for waker in wakers {
      waker.wake();
    }
    for callback in callbacks {
      callback(&result);
    }
    true
  }
}

impl Default for StreamCompletion {
  fn default() -> Self {
    Self::new()
  }
}

impl Future for StreamCompletion {
  type Output = Result<(), StreamError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut guard = self.inner.lock();
    if let Some(result) = &guard.result {
      return Poll::Ready(result.clone());
    }
    if !guard.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
      guard.wakers.push(cx.waker().clone());
    }
    Poll::Pending
  }
}
