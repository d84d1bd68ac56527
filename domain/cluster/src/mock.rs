use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::mock;

use crate::{
    exception::ClusterResult,
    model::{
        entity::{ClusterHandle, ComputeUnitStatus, InstanceInfo},
        vo::{
            ComputeUnitId, ComputeUnitResources, DiscoveryServiceSpec, InstanceSpec, Quantity,
            VolumeClaimSpec, WorkerSetSpec,
        },
    },
    service::{
        BackendResult, ClusterLifecycleService, OrchestrationBackend, VolumeProvisionService,
    },
};

mock! {
    pub OrchestrationBackend {}
    #[async_trait]
    impl OrchestrationBackend for OrchestrationBackend {
        async fn get_instance(&self, name: &str) -> BackendResult<Option<InstanceInfo>>;
        async fn create_instance(&self, spec: &InstanceSpec) -> BackendResult<()>;
        async fn delete_instance(&self, name: &str) -> BackendResult<()>;
        async fn create_worker_set(&self, spec: &WorkerSetSpec) -> BackendResult<()>;
        async fn delete_worker_set(&self, name: &str) -> BackendResult<()>;
        async fn create_discovery_service(&self, spec: &DiscoveryServiceSpec) -> BackendResult<()>;
        async fn delete_discovery_service(&self, name: &str) -> BackendResult<()>;
        async fn volume_claim_exists(&self, name: &str) -> BackendResult<bool>;
        async fn create_volume_claim(&self, spec: &VolumeClaimSpec) -> BackendResult<()>;
        async fn delete_volume_claim(&self, name: &str) -> BackendResult<()>;
        async fn instance_usage(&self, name: &str) -> BackendResult<Option<BTreeMap<String, String>>>;
    }
}

mock! {
    pub VolumeProvisionService {}
    #[async_trait]
    impl VolumeProvisionService for VolumeProvisionService {
        async fn ensure_volume(&self, unit_id: ComputeUnitId, size: &Quantity) -> ClusterResult<String>;
        async fn delete_volume(&self, unit_id: ComputeUnitId) -> ClusterResult<()>;
    }
}

mock! {
    pub ClusterLifecycleService {}
    #[async_trait]
    impl ClusterLifecycleService for ClusterLifecycleService {
        fn handle(&self, unit_id: ComputeUnitId) -> ClusterHandle;
        async fn create_cluster(
            &self,
            unit_id: ComputeUnitId,
            resources: &ComputeUnitResources,
        ) -> ClusterResult<ClusterHandle>;
        async fn delete_cluster(&self, unit_id: ComputeUnitId) -> ClusterResult<()>;
        async fn get_cluster_status(&self, unit_id: ComputeUnitId) -> ClusterResult<Option<ComputeUnitStatus>>;
        async fn get_pod_metrics(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String>;
        async fn get_resource_limits(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String>;
    }
}
