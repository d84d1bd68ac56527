//! Container orchestration backend the control plane provisions against.

use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::model::{
    entity::InstanceInfo,
    vo::{DiscoveryServiceSpec, InstanceSpec, VolumeClaimSpec, WorkerSetSpec},
};

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    Instance,
    WorkerSet,
    DiscoveryService,
    VolumeClaim,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Instance => "instance",
            ResourceKind::WorkerSet => "worker set",
            ResourceKind::DiscoveryService => "discovery service",
            ResourceKind::VolumeClaim => "volume claim",
        })
    }
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("{kind} {name} not found")]
    NotFound { kind: ResourceKind, name: String },

    /// Transport or authentication failure.
    #[error("backend unreachable: {0}")]
    Unavailable(#[source] anyhow::Error),

    #[error("backend rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Namespace scoped create/get/delete of the resources a compute unit is made of.
///
/// Creating a resource that exists fails with [`BackendError::AlreadyExists`], deleting
/// one that does not fails with [`BackendError::NotFound`]. Implementations never retry.
#[async_trait]
pub trait OrchestrationBackend: Send + Sync {
    /// `None` when no instance has that name.
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

    /// Current resource usage of an instance; `None` while metrics are not available.
    async fn instance_usage(&self, name: &str) -> BackendResult<Option<BTreeMap<String, String>>>;
}
