use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{model::vo::ComputeUnitId, service::BackendError};

pub type ClusterResult<T> = Result<T, ClusterException>;

/// Steps of compute unit creation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreationStep {
    Volume,
    MasterInstance,
    DiscoveryService,
    WorkerSet,
}

impl fmt::Display for CreationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CreationStep::Volume => "volume",
            CreationStep::MasterInstance => "master instance",
            CreationStep::DiscoveryService => "discovery service",
            CreationStep::WorkerSet => "worker set",
        })
    }
}

#[derive(Error, Debug)]
pub enum ClusterException {
    #[error("Invalid resources for compute unit {unit_id}: {reason}.")]
    InvalidResources {
        unit_id: ComputeUnitId,
        reason: String,
    },

    #[error("Compute unit {unit_id} already has a master instance named {name}.")]
    ResourceConflict { unit_id: ComputeUnitId, name: String },

    #[error("Orchestration backend unavailable for compute unit {unit_id}: {source}")]
    BackendUnavailable {
        unit_id: ComputeUnitId,
        #[source]
        source: BackendError,
    },

    /// Creation stopped part way. Nothing is rolled back; deleting the unit reconciles.
    #[error("Creating compute unit {unit_id} failed at {step} after {completed:?}: {source}")]
    PartialCreation {
        unit_id: ComputeUnitId,
        step: CreationStep,
        completed: Vec<CreationStep>,
        #[source]
        source: BackendError,
    },

    #[error("Orchestration backend error for compute unit {unit_id}: {source}")]
    Backend {
        unit_id: ComputeUnitId,
        #[source]
        source: BackendError,
    },
}

impl ClusterException {
    /// Classifies a backend failure that happened before anything was created.
    pub fn backend(unit_id: ComputeUnitId, source: BackendError) -> Self {
        match source {
            BackendError::Unavailable(_) => Self::BackendUnavailable { unit_id, source },
            source => Self::Backend { unit_id, source },
        }
    }

    pub fn unit_id(&self) -> ComputeUnitId {
        match self {
            Self::InvalidResources { unit_id, .. }
            | Self::ResourceConflict { unit_id, .. }
            | Self::BackendUnavailable { unit_id, .. }
            | Self::PartialCreation { unit_id, .. }
            | Self::Backend { unit_id, .. } => *unit_id,
        }
    }
}
