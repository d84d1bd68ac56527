use std::{collections::BTreeMap, future::Future, sync::Arc};

use async_trait::async_trait;
use domain_cluster::{
    exception::{ClusterException, ClusterResult, CreationStep},
    model::{
        entity::{ClusterHandle, ComputeUnitStatus},
        vo::{
            ClusterSettings, ComputeUnitId, ComputeUnitResources, DiscoveryServiceSpec,
            InstanceSpec, WorkerSetSpec,
        },
    },
    service::{
        BackendError, BackendResult, ClusterLifecycleService, OrchestrationBackend,
        VolumeProvisionService,
    },
};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct ClusterLifecycleServiceImpl {
    backend: Arc<dyn OrchestrationBackend>,
    volume_service: Arc<dyn VolumeProvisionService>,
    settings: ClusterSettings,
}

#[async_trait]
impl ClusterLifecycleService for ClusterLifecycleServiceImpl {
    fn handle(&self, unit_id: ComputeUnitId) -> ClusterHandle {
        ClusterHandle::derive(unit_id, &self.settings)
    }

    async fn create_cluster(
        &self,
        unit_id: ComputeUnitId,
        resources: &ComputeUnitResources,
    ) -> ClusterResult<ClusterHandle> {
        resources
            .validate()
            .map_err(|reason| ClusterException::InvalidResources { unit_id, reason })?;
        let handle = self.handle(unit_id);

        let existing = self
            .backend
            .get_instance(&handle.instance_name)
            .await
            .map_err(|e| ClusterException::backend(unit_id, e))?;
        if existing.is_some() {
            return Err(ClusterException::ResourceConflict {
                unit_id,
                name: handle.instance_name,
            });
        }

        let mut progress = CreationProgress::new(unit_id);

        self.volume_service.ensure_volume(unit_id, &resources.disk_limit).await?;
        progress.done(CreationStep::Volume);

        let master = InstanceSpec::master(&handle, resources, &self.settings);
        match self.backend.create_instance(&master).await {
            Ok(()) => progress.done(CreationStep::MasterInstance),
            Err(e) if e.is_already_exists() => {
                return Err(ClusterException::ResourceConflict {
                    unit_id,
                    name: handle.instance_name,
                })
            }
            Err(e) => return Err(progress.failed(CreationStep::MasterInstance, e)),
        }

        let service = DiscoveryServiceSpec::for_unit(&handle, &self.settings);
        existing_ok(self.backend.create_discovery_service(&service))
            .await
            .map_err(|e| progress.failed(CreationStep::DiscoveryService, e))?;
        progress.done(CreationStep::DiscoveryService);

        let workers = WorkerSetSpec::for_unit(&handle, resources, &self.settings);
        existing_ok(self.backend.create_worker_set(&workers))
            .await
            .map_err(|e| progress.failed(CreationStep::WorkerSet, e))?;

        info!(
            unit_id = %unit_id,
            master_address = %handle.master_address,
            workers = workers.replicas,
            "Compute unit created."
        );
        Ok(handle)
    }

    async fn delete_cluster(&self, unit_id: ComputeUnitId) -> ClusterResult<()> {
        let handle = self.handle(unit_id);
        let (instance, service, workers, volume) = futures::join!(
            absent_ok(self.backend.delete_instance(&handle.instance_name)),
            absent_ok(self.backend.delete_discovery_service(&handle.service_name)),
            absent_ok(self.backend.delete_worker_set(&handle.worker_set_name)),
            self.volume_service.delete_volume(unit_id),
        );

        let mut errors = [instance, service, workers]
            .into_iter()
            .filter_map(Result::err)
            .map(|e| ClusterException::backend(unit_id, e))
            .chain(volume.err())
            .collect::<Vec<_>>();
        for e in errors.iter() {
            warn!(unit_id = %unit_id, error = %e, "Failed to delete part of a compute unit.");
        }
        if errors.is_empty() {
            info!(unit_id = %unit_id, "Compute unit deleted.");
            Ok(())
        } else {
            Err(errors.swap_remove(0))
        }
    }

    async fn get_cluster_status(
        &self,
        unit_id: ComputeUnitId,
    ) -> ClusterResult<Option<ComputeUnitStatus>> {
        let handle = self.handle(unit_id);
        let instance = self
            .backend
            .get_instance(&handle.instance_name)
            .await
            .map_err(|e| ClusterException::backend(unit_id, e))?;
        Ok(instance.map(|instance| ComputeUnitStatus {
            handle,
            phase: instance.phase,
        }))
    }

    async fn get_pod_metrics(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String> {
        match self.backend.instance_usage(&unit_id.instance_name()).await {
            Ok(usage) => usage.unwrap_or_default(),
            Err(e) => unavailable(unit_id, e, "metrics"),
        }
    }

    async fn get_resource_limits(&self, unit_id: ComputeUnitId) -> BTreeMap<String, String> {
        match self.backend.get_instance(&unit_id.instance_name()).await {
            Ok(instance) => instance.map(|instance| instance.limits).unwrap_or_default(),
            Err(e) => unavailable(unit_id, e, "limits"),
        }
    }
}

/// Steps of one create call that already succeeded.
struct CreationProgress {
    unit_id: ComputeUnitId,
    completed: Vec<CreationStep>,
}

impl CreationProgress {
    fn new(unit_id: ComputeUnitId) -> Self {
        Self {
            unit_id,
            completed: vec![],
        }
    }

    fn done(&mut self, step: CreationStep) {
        self.completed.push(step);
    }

    fn failed(&self, step: CreationStep, source: BackendError) -> ClusterException {
        warn!(
            unit_id = %self.unit_id,
            step = %step,
            completed = ?self.completed,
            "Compute unit partially created, delete it to reconcile."
        );
        ClusterException::PartialCreation {
            unit_id: self.unit_id,
            step,
            completed: self.completed.clone(),
            source,
        }
    }
}

async fn existing_ok(create: impl Future<Output = BackendResult<()>>) -> BackendResult<()> {
    match create.await {
        Err(e) if e.is_already_exists() => Ok(()),
        result => result,
    }
}

async fn absent_ok(delete: impl Future<Output = BackendResult<()>>) -> BackendResult<()> {
    match delete.await {
        Err(e) if e.is_not_found() => Ok(()),
        result => result,
    }
}

fn unavailable(unit_id: ComputeUnitId, e: BackendError, what: &str) -> BTreeMap<String, String> {
    if !e.is_not_found() {
        warn!(unit_id = %unit_id, error = %e, "Compute unit {what} unavailable.");
    }
    BTreeMap::new()
}
