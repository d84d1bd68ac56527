use std::sync::Arc;

use async_trait::async_trait;
use domain_cluster::{
    exception::{ClusterException, ClusterResult},
    model::vo::{ClusterSettings, ComputeUnitId, Quantity, VolumeClaimSpec},
    service::{OrchestrationBackend, VolumeProvisionService},
};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct VolumeProvisionServiceImpl {
    backend: Arc<dyn OrchestrationBackend>,
    settings: ClusterSettings,
}

#[async_trait]
impl VolumeProvisionService for VolumeProvisionServiceImpl {
    async fn ensure_volume(&self, unit_id: ComputeUnitId, size: &Quantity) -> ClusterResult<String> {
        let spec = VolumeClaimSpec::for_unit(unit_id, size, &self.settings);
        let exists = self
            .backend
            .volume_claim_exists(&spec.name)
            .await
            .map_err(|e| ClusterException::backend(unit_id, e))?;
        if exists {
            debug!(volume = %spec.name, "Reusing existing volume.");
            return Ok(spec.name);
        }
        match self.backend.create_volume_claim(&spec).await {
            Ok(()) => {
                info!(volume = %spec.name, size = %spec.size, "Volume created.");
                Ok(spec.name)
            }
            // lost a race with another create for the same unit
            Err(e) if e.is_already_exists() => Ok(spec.name),
            Err(e) => Err(ClusterException::backend(unit_id, e)),
        }
    }

    async fn delete_volume(&self, unit_id: ComputeUnitId) -> ClusterResult<()> {
        let name = unit_id.volume_name();
        match self.backend.delete_volume_claim(&name).await {
            Ok(()) => {
                info!(volume = %name, "Volume deleted.");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(volume = %name, "Volume already absent.");
                Ok(())
            }
            Err(e) => Err(ClusterException::backend(unit_id, e)),
        }
    }
}
