/// Tokio-backed serial executor.
mod tokio_serial_executor;

pub use tokio_serial_executor::TokioSerialExecutor;
