//! Test utilities for stream verification.

mod test_publisher;
mod test_subscriber_probe;

pub use test_publisher::TestPublisher;
pub use test_subscriber_probe::TestSubscriberProbe;
