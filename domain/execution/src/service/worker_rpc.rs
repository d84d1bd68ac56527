use async_trait::async_trait;

use crate::model::vo::{TableProfile, WorkerIdentity, WorkerStatisticsReply};

/// Request/reply channel to a single worker.
#[async_trait]
pub trait WorkerRpcService: Send + Sync {
    async fn query_statistics(&self, identity: &WorkerIdentity)
        -> anyhow::Result<WorkerStatisticsReply>;

    /// Only meaningful once the worker has completed.
    async fn query_table_profile(&self, identity: &WorkerIdentity) -> anyhow::Result<TableProfile>;
}
