//! Fused `filter`/`map` operators.
//!
//! A fused stream owns no subscription of its own. It subscribes its downstream subscriber to
//! the source through a thin wrapper that runs the transform on the delivery path and hands the
//! source's subscription straight to the downstream subscriber.

#[cfg(test)]
mod tests;

use alloc::{boxed::Box, sync::Arc};

use portable_atomic::{AtomicBool, Ordering};

use super::{
  ExecutorShared, StreamCompletion, StreamElement, StreamError, StreamMessage, StreamMessageShared, Subscriber,
  SubscriptionOptions, SubscriptionShared, noop_subscription::reject_subscriber,
};

/// Element transform. `Ok(None)` rejects the element.
pub(crate) type Transform<I, T> = Arc<dyn Fn(I) -> Result<Option<T>, StreamError> + Send + Sync>;

pub(crate) struct FuseableStreamMessage<I: StreamElement, T> {
  source:     StreamMessageShared<I>,
  transform:  Transform<I, T>,
  subscribed: AtomicBool,
  completion: StreamCompletion,
}

impl<I: StreamElement, T: StreamElement> FuseableStreamMessage<I, T> {
  pub(crate) fn new(source: StreamMessageShared<I>, transform: Transform<I, T>) -> Self {
    let completion = StreamCompletion::new();
    let chained = completion.clone();
    source.when_complete().on_complete(move |result| {
      chained.complete(result.clone());
    });
    Self { source, transform, subscribed: AtomicBool::new(false), completion }
  }
}

impl<I: StreamElement, T: StreamElement> StreamMessage<T> for FuseableStreamMessage<I, T> {
  fn is_open(&self) -> bool {
    self.source.is_open()
  }

  fn is_empty(&self) -> bool {
    self.source.is_empty()
  }

  fn demand(&self) -> i64 {
    self.source.demand()
  }

  fn when_complete(&self) -> StreamCompletion {
    self.completion.clone()
  }

  fn subscribe_with(&self, subscriber: Box<dyn Subscriber<T>>, executor: ExecutorShared, options: SubscriptionOptions) {
    if self.subscribed.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
      reject_subscriber(subscriber, &executor, StreamError::AlreadySubscribed);
      return;
    }
    let fused = FuseSubscriber {
      downstream: subscriber,
      transform: self.transform.clone(),
      upstream: None,
      completion: self.completion.clone(),
      unpool: !options.is_with_pooled_objects(),
      done: false,
    };
    self.source.subscribe_with(Box::new(fused), executor, options);
  }

  fn default_subscriber_executor(&self) -> ExecutorShared {
    self.source.default_subscriber_executor()
  }

  fn abort_with(&self, cause: StreamError) {
    self.source.abort_with(cause);
  }
}

struct FuseSubscriber<I, T> {
  downstream: Box<dyn Subscriber<T>>,
  transform:  Transform<I, T>,
  upstream:   Option<SubscriptionShared>,
  completion: StreamCompletion,
  unpool:     bool,
  done:       bool,
}

impl<I: StreamElement, T: StreamElement> Subscriber<I> for FuseSubscriber<I, T> {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    self.upstream = Some(subscription.clone());
    self.downstream.on_subscribe(subscription);
  }

  fn on_next(&mut self, element: I) {
    if self.done {
      return;
    }
    match (self.transform)(element) {
      | Ok(Some(output)) => {
        let output = if self.unpool && output.is_pooled() { output.into_unpooled() } else { output };
        self.downstream.on_next(output);
      },
      | Ok(None) => {
        if let Some(upstream) = &self.upstream {
          upstream.request(1);
        }
      },
      | Err(error) => {
        tracing::debug!(target: "stream_message::fuse", %error, "transform failed, cancelling upstream");
        self.done = true;
        self.completion.complete(Err(error.clone()));
        if let Some(upstream) = self.upstream.take() {
          upstream.cancel();
        }
        self.downstream.on_error(error);
      },
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.done {
      self.done = true;
      self.downstream.on_error(error);
    }
  }

  fn on_complete(&mut self) {
    if !self.done {
      self.done = true;
      self.downstream.on_complete();
    }
  }
}
