//! Decision metrics: sinks and the recorder that falls back between them.

mod log_file;
mod memory;
mod recorder;

pub use log_file::LogFileSink;
pub use memory::InMemoryMetricsSink;
pub use recorder::{MetricsRecorder, RecordOutcome};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisMetricsSink;
