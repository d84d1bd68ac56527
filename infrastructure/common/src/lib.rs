pub mod config;
pub mod hosting;
pub mod message_queue;
pub mod telemetry;

pub use message_queue::{ConsumerFn, ConsumerReturn};
