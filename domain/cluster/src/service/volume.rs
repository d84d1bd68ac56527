use async_trait::async_trait;

use crate::{
    exception::ClusterResult,
    model::vo::{ComputeUnitId, Quantity},
};

/// One persistent volume claim per compute unit.
#[async_trait]
pub trait VolumeProvisionService: Send + Sync {
    /// Create the unit's volume or reuse the existing one. Returns the claim name.
    async fn ensure_volume(&self, unit_id: ComputeUnitId, size: &Quantity) -> ClusterResult<String>;

    /// Delete the unit's volume. A missing volume counts as deleted.
    async fn delete_volume(&self, unit_id: ComputeUnitId) -> ClusterResult<()>;
}
