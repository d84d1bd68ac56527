use async_trait::async_trait;

use crate::model::vo::AggregatedSnapshot;

#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(&self, snapshot: &AggregatedSnapshot) -> anyhow::Result<()>;
}
