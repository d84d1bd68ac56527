use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    exception::ExecutionResult,
    model::vo::{AggregatedSnapshot, WorkerIdentity},
};

#[async_trait]
pub trait StatisticsAggregateService: Send + Sync {
    /// Runs one aggregation round over the given workers, or over every worker of the
    /// execution when `workers` is `None`, and publishes the resulting snapshot.
    async fn refresh_statistics(
        &self,
        execution_id: Uuid,
        workers: Option<Vec<WorkerIdentity>>,
    ) -> ExecutionResult<AggregatedSnapshot>;
}
