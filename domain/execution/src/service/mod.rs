pub mod aggregate;
pub mod publisher;
pub mod worker_rpc;

#[rustfmt::skip]
pub use {
    aggregate::StatisticsAggregateService,
    publisher::SnapshotPublisher,
    worker_rpc::WorkerRpcService,
};
