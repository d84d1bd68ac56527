use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    exception::ClusterResult,
    model::{
        entity::{ClusterHandle, ComputeUnitStatus},
        vo::{ComputeUnitId, ComputeUnitResources},
    },
};

/// Stands up and tears down compute units.
#[async_trait]
pub trait ClusterLifecycleService: Send + Sync {
    /// Handle of a unit, computed without touching the backend.
    fn handle(&self, unit_id: ComputeUnitId) -> ClusterHandle;

    /// Create volume, master, discovery service and worker set, in that order.
    async fn create_cluster(
        &self,
        unit_id: ComputeUnitId,
        resources: &ComputeUnitResources,
    ) -> ClusterResult<ClusterHandle>;

    /// Best-effort delete of every resource of the unit. Missing resources are fine.
    async fn delete_cluster(&self, unit_id: ComputeUnitId) -> ClusterResult<()>;

    /// `None` when the unit has no master instance.
    async fn get_cluster_status(
        &self,
        unit_id: ComputeUnitId,
    ) -> ClusterResult<Option<ComputeUnitStatus>>;

    /// Current usage of the master instance, empty when unavailable.
    async fn get_pod_metrics(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String>;

    /// Limits of the master instance, empty when unavailable.
    async fn get_resource_limits(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String>;
}
