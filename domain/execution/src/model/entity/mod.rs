pub mod execution_record;
pub mod registry;
pub mod worker_record;

#[rustfmt::skip]
pub use {
    execution_record::{OperatorExecutionRecord, RegionExecutionRecord, WorkflowExecutionRecord},
    registry::WorkerRegistry,
    worker_record::WorkerExecutionRecord,
};
