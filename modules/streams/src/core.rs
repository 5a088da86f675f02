/// Buffer pool backing pooled payloads.
mod buffer_pool;
/// Completion polling types.
mod completion;
/// Array-backed concatenation.
mod concat_array_stream_message;
/// Stream-of-streams concatenation.
mod concat_publisher_stream_message;
/// Queue-backed writable stream.
mod default_stream_message;
/// Demand tracking utilities.
mod demand_tracker;
/// Duplicate views handed out by the duplicator.
mod duplicate_stream_message;
/// Duplicator configuration.
mod duplicator_config;
/// Shared duplicator state (internal).
mod duplicator_state;
/// Executor abstraction.
mod executor;
/// Fixed element producers.
mod fixed_stream_message;
/// Fused filter/map operators.
mod fuseable_stream_message;
/// Identity function used by the `map` shortcut.
mod identity;
/// No-op subscription handed to rejected subscribers.
mod noop_subscription;
/// Overflow policy for duplicator buffers.
mod overflow_policy;
/// Reference-counted pooled buffers.
mod pooled_buffer;
/// Publisher contract.
mod publisher;
/// Adapter for foreign publishers.
mod publisher_based_stream_message;
/// Delivery signals (internal).
mod signal;
/// Stream completion handle.
mod stream_completion;
/// Delivery engine shared by stream implementations (internal).
mod stream_core;
/// Element contract.
mod stream_element;
/// Stream error definitions.
mod stream_error;
/// Stream message trait.
mod stream_message;
/// Duplicator handle.
mod stream_message_duplicator;
/// Shared stream message handle.
mod stream_message_shared;
/// Subscriber contract.
mod subscriber;
/// Subscription contract.
mod subscription;
/// Subscription options.
mod subscription_options;
/// Test utilities for stream verification.
pub mod testing;
/// Serializing trampoline executor.
mod trampoline_executor;
/// Upstream side of the delivery engine (internal).
mod upstream_link;

pub use buffer_pool::BufferPool;
pub use completion::Completion;
pub use default_stream_message::DefaultStreamMessage;
pub use demand_tracker::{DemandTracker, UNBOUNDED_DEMAND};
pub use duplicator_config::DuplicatorConfig;
pub use executor::{Executor, ExecutorShared, ExecutorTask};
pub use identity::identity;
pub use noop_subscription::NoopSubscription;
pub use overflow_policy::OverflowPolicy;
pub use pooled_buffer::PooledBuffer;
pub use publisher::Publisher;
pub use stream_completion::StreamCompletion;
pub use stream_element::StreamElement;
pub use stream_error::StreamError;
pub use stream_message::StreamMessage;
pub use stream_message_duplicator::StreamMessageDuplicator;
pub use stream_message_shared::StreamMessageShared;
pub use subscriber::Subscriber;
pub use subscription::{Subscription, SubscriptionShared};
pub use subscription_options::SubscriptionOptions;
pub use trampoline_executor::TrampolineExecutor;
