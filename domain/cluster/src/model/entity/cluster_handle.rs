use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::vo::{master_address, ClusterSettings, ComputeUnitId};

/// Everything needed to reach and manage a compute unit.
///
/// Never persisted: [`ClusterHandle::derive`] recomputes it from the id and settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHandle {
    pub unit_id: ComputeUnitId,
    pub instance_name: String,
    pub master_address: String,
    pub service_name: String,
    pub volume_name: String,
    pub worker_set_name: String,
}

impl ClusterHandle {
    pub fn derive(unit_id: ComputeUnitId, settings: &ClusterSettings) -> Self {
        Self {
            unit_id,
            instance_name: unit_id.instance_name(),
            master_address: master_address(unit_id, settings),
            service_name: unit_id.service_name(),
            volume_name: unit_id.volume_name(),
            worker_set_name: unit_id.worker_set_name(),
        }
    }
}

/// Lifecycle phase of one instance as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancePhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl From<&str> for InstancePhase {
    fn from(phase: &str) -> Self {
        match phase {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Observed state of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub name: String,
    pub phase: InstancePhase,
    /// Resource limits of the instance's container.
    pub limits: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeUnitStatus {
    pub handle: ClusterHandle,
    pub phase: InstancePhase,
}
