//! Delivery of aggregated snapshots over the internal message queue.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use domain_execution::{model::vo::AggregatedSnapshot, service::SnapshotPublisher};
use infrastructure_common::{message_queue::MessageQueueProducerTemplate, ConsumerReturn};
use tracing::{debug, info};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::ServiceProvider;

#[derive(TypedBuilder)]
pub struct QueueSnapshotPublisher {
    producer: Arc<dyn MessageQueueProducerTemplate<AggregatedSnapshot>>,
    topic: String,
}

#[async_trait]
impl SnapshotPublisher for QueueSnapshotPublisher {
    async fn publish(&self, snapshot: &AggregatedSnapshot) -> anyhow::Result<()> {
        self.producer.send_object(snapshot, Some(&self.topic)).await
    }
}

/// Latest published snapshot of every execution.
#[derive(Default)]
pub struct SnapshotStore {
    latest: DashMap<Uuid, AggregatedSnapshot>,
}

impl SnapshotStore {
    /// Keeps `snapshot` unless a newer one of the same execution is already stored.
    pub fn store(&self, snapshot: AggregatedSnapshot) {
        self.latest
            .entry(snapshot.execution_id)
            .and_modify(|current| {
                if current.published_at <= snapshot.published_at {
                    *current = snapshot.clone();
                }
            })
            .or_insert(snapshot);
    }

    pub fn get(&self, execution_id: Uuid) -> Option<AggregatedSnapshot> {
        self.latest.get(&execution_id).map(|snapshot| snapshot.value().clone())
    }

    pub fn remove(&self, execution_id: Uuid) {
        self.latest.remove(&execution_id);
    }
}

/// Stores snapshots of registered executions. A round still running when its execution is
/// disposed may publish afterwards; that snapshot is dropped.
pub fn snapshot_consumer(content: &str, sp: Arc<ServiceProvider>) -> ConsumerReturn {
    Box::pin(async move {
        let snapshot: AggregatedSnapshot = serde_json::from_str(content)?;
        let execution_id = snapshot.execution_id;
        if sp.worker_registry().get(execution_id).is_err() {
            debug!(%execution_id, "Dropping snapshot of a disposed execution.");
            return Ok(());
        }
        info!(
            execution_id = %snapshot.execution_id,
            operators = snapshot.operator_statistics.len(),
            profiled_operators = snapshot.operator_profiles.len(),
            stale_workers = snapshot.stale_workers.len(),
            "Execution statistics updated."
        );
        sp.snapshot_store().store(snapshot);
        // disposal may have happened between the check and the store
        if sp.worker_registry().get(execution_id).is_err() {
            sp.snapshot_store().remove(execution_id);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::{Duration, Utc};
    use domain_cluster::mock::MockClusterLifecycleService;
    use domain_execution::{
        mock::MockStatisticsAggregateService,
        model::{
            entity::WorkerRegistry,
            vo::{OperatorId, OperatorPlan, PhysicalPlan, RegionPlan, WorkerIdentity},
        },
    };

    use super::*;

    fn provider() -> Arc<ServiceProvider> {
        Arc::new(
            ServiceProvider::builder()
                .cluster_lifecycle_service(Arc::new(MockClusterLifecycleService::new()))
                .worker_registry(Arc::new(WorkerRegistry::new()))
                .statistics_aggregate_service(Arc::new(MockStatisticsAggregateService::new()))
                .build(),
        )
    }

    fn plan() -> PhysicalPlan {
        PhysicalPlan {
            regions: vec![RegionPlan {
                id: 0,
                operators: vec![OperatorPlan {
                    id: OperatorId::new("scan"),
                    workers: vec![WorkerIdentity::new("w1")],
                }],
            }],
        }
    }

    fn snapshot(execution_id: Uuid, published_at: chrono::DateTime<Utc>) -> AggregatedSnapshot {
        AggregatedSnapshot {
            execution_id,
            published_at,
            operator_statistics: BTreeMap::new(),
            operator_profiles: BTreeMap::new(),
            stale_workers: BTreeSet::new(),
        }
    }

    #[test]
    fn older_snapshot_never_replaces_newer() {
        let store = SnapshotStore::default();
        let id = Uuid::new_v4();
        let now = Utc::now();
        store.store(snapshot(id, now));
        store.store(snapshot(id, now - Duration::seconds(5)));
        assert_eq!(store.get(id).unwrap().published_at, now);

        store.store(snapshot(id, now + Duration::seconds(5)));
        assert_eq!(store.get(id).unwrap().published_at, now + Duration::seconds(5));

        store.remove(id);
        assert!(store.get(id).is_none());
    }

    #[tokio::test]
    async fn consumer_keeps_snapshots_of_registered_executions_only() {
        let sp = provider();
        let id = Uuid::new_v4();
        sp.worker_registry().register(id, &plan()).unwrap();

        let content = serde_json::to_string(&snapshot(id, Utc::now())).unwrap();
        snapshot_consumer(&content, sp.clone()).await.unwrap();
        assert!(sp.snapshot_store().get(id).is_some());

        assert!(sp.worker_registry().dispose(id));
        sp.snapshot_store().remove(id);
        let late = serde_json::to_string(&snapshot(id, Utc::now())).unwrap();
        snapshot_consumer(&late, sp.clone()).await.unwrap();
        assert!(sp.snapshot_store().get(id).is_none());
    }

    #[tokio::test]
    async fn consumer_ignores_unknown_execution() {
        let sp = provider();
        let id = Uuid::new_v4();
        let content = serde_json::to_string(&snapshot(id, Utc::now())).unwrap();
        snapshot_consumer(&content, sp.clone()).await.unwrap();
        assert!(sp.snapshot_store().get(id).is_none());
    }
}
