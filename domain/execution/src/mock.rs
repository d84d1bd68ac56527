use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use crate::{
    exception::ExecutionResult,
    model::vo::{AggregatedSnapshot, TableProfile, WorkerIdentity, WorkerStatisticsReply},
    service::{SnapshotPublisher, StatisticsAggregateService, WorkerRpcService},
};

mock! {
    pub WorkerRpcService {}
    #[async_trait]
    impl WorkerRpcService for WorkerRpcService {
        async fn query_statistics(&self, identity: &WorkerIdentity) -> anyhow::Result<WorkerStatisticsReply>;
        async fn query_table_profile(&self, identity: &WorkerIdentity) -> anyhow::Result<TableProfile>;
    }
}

mock! {
    pub SnapshotPublisher {}
    #[async_trait]
    impl SnapshotPublisher for SnapshotPublisher {
        async fn publish(&self, snapshot: &AggregatedSnapshot) -> anyhow::Result<()>;
    }
}

mock! {
    pub StatisticsAggregateService {}
    #[async_trait]
    impl StatisticsAggregateService for StatisticsAggregateService {
        async fn refresh_statistics(
            &self,
            execution_id: Uuid,
            workers: Option<Vec<WorkerIdentity>>,
        ) -> ExecutionResult<AggregatedSnapshot>;
    }
}
