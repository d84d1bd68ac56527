pub mod config;
mod coordinator;
mod kubernetes;
mod service_provider;
pub(crate) mod snapshot_channel;
mod worker_rpc;

pub use service_provider::ServiceProvider;
pub use snapshot_channel::SnapshotStore;
