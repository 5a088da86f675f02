#![allow(clippy::expect_used)]

use stream_message_rs::{
  core::{
    DefaultStreamMessage, DuplicatorConfig, StreamError, StreamMessage, Subscriber,
    SubscriptionOptions, SubscriptionShared,
  },
  std::TokioSerialExecutor,
};

struct PrintingSubscriber {
  label:        &'static str,
  subscription: Option<SubscriptionShared>,
}

impl Subscriber<String> for PrintingSubscriber {
  fn on_subscribe(&mut self, subscription: SubscriptionShared) {
    subscription.request(1);
    self.subscription = Some(subscription);
  }

  fn on_next(&mut self, element: String) {
    println!("[{}] {element}", self.label);
    if let Some(subscription) = &self.subscription {
      subscription.request(1);
    }
  }

  fn on_error(&mut self, error: StreamError) {
    println!("[{}] failed: {error}", self.label);
  }

  fn on_complete(&mut self) {
    println!("[{}] complete", self.label);
  }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  let handle = tokio::runtime::Handle::current();
  let source = DefaultStreamMessage::new();
  let upper = source.to_shared().map(|line: String| line.to_uppercase());

  let duplicator =
    upper.to_duplicator_with(TokioSerialExecutor::shared(&handle), DuplicatorConfig::new().with_max_buffered_elements(16));
  let left = duplicator.duplicate().expect("duplicate");
  let right = duplicator.duplicate().expect("duplicate");
  duplicator.close();

  for (label, duplicate) in [("left", &left), ("right", &right)] {
    let subscriber = Box::new(PrintingSubscriber { label, subscription: None });
    duplicate.subscribe_with(subscriber, TokioSerialExecutor::shared(&handle), SubscriptionOptions::new());
  }

  for line in ["hello", "stream", "message"] {
    source.write(line.to_string()).expect("write");
  }
  source.close();

  for duplicate in [&left, &right] {
    duplicate.when_complete().await.expect("duplicate completion");
  }
  println!("source completion: {:?}", source.when_complete().await);
}
