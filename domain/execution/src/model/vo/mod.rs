pub mod options;
pub mod plan;
pub mod profile;
pub mod snapshot;
pub mod statistics;
pub mod worker;

#[rustfmt::skip]
pub use {
    options::{AggregationOptions, FailurePolicy},
    plan::{OperatorPlan, PhysicalPlan, RegionPlan},
    profile::{ColumnProfile, ColumnStatistics, GlobalProfile, TableProfile, TableProfileSlot},
    snapshot::{AggregatedSnapshot, WorkerObservation},
    statistics::{OperatorStatistics, WorkerStatistics, WorkerStatisticsReply},
    worker::{OperatorId, RegionId, WorkerIdentity, WorkerState},
};
