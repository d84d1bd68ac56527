//! Backend-neutral descriptions of the resources that make up a compute unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ClusterSettings, ComputeUnitId, ComputeUnitResources, Quantity, Role};
use crate::model::entity::ClusterHandle;

pub const ENV_CLUSTERING_ENABLED: &str = "CLUSTERING_ENABLED";
pub const ENV_MASTER_ADDRESS: &str = "CLUSTERING_MASTER_ADDRESS";
pub const ENV_COMPUTE_UNIT_ID: &str = "COMPUTE_UNIT_ID";

/// Variables the control plane owns; user supplied environment may not set them.
pub const RESERVED_ENV: &[&str] = &[ENV_CLUSTERING_ENABLED, ENV_MASTER_ADDRESS, ENV_COMPUTE_UNIT_ID];

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub claim_name: String,
    pub mount_path: String,
}

/// One single-instance workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub image: String,
    pub limits: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub hostname: Option<String>,
    pub subdomain: Option<String>,
    pub volume: VolumeMount,
    pub port: u16,
}

impl InstanceSpec {
    pub fn master(
        handle: &ClusterHandle,
        resources: &ComputeUnitResources,
        settings: &ClusterSettings,
    ) -> Self {
        Self {
            name: handle.instance_name.clone(),
            labels: handle.unit_id.labels(Role::Master),
            image: resources.images.master.clone().unwrap_or_else(|| settings.master_image.clone()),
            limits: limits(resources, settings),
            env: clustering_env(handle, resources),
            // hostname + subdomain make `masterAddress` resolvable through the headless service
            hostname: Some(handle.instance_name.clone()),
            subdomain: Some(handle.service_name.clone()),
            volume: volume_mount(handle, settings),
            port: settings.service_port,
        }
    }

    /// Template of every worker replica.
    pub fn worker(
        handle: &ClusterHandle,
        resources: &ComputeUnitResources,
        settings: &ClusterSettings,
    ) -> Self {
        Self {
            name: handle.worker_set_name.clone(),
            labels: handle.unit_id.labels(Role::Worker),
            image: resources.images.worker.clone().unwrap_or_else(|| settings.worker_image.clone()),
            limits: limits(resources, settings),
            env: clustering_env(handle, resources),
            hostname: None,
            subdomain: None,
            volume: volume_mount(handle, settings),
            port: settings.service_port,
        }
    }
}

/// Replicated workload of worker instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSetSpec {
    pub name: String,
    pub replicas: u32,
    /// Governing discovery service; gives replicas stable DNS names.
    pub service_name: String,
    pub selector: BTreeMap<String, String>,
    pub template: InstanceSpec,
}

impl WorkerSetSpec {
    pub fn for_unit(
        handle: &ClusterHandle,
        resources: &ComputeUnitResources,
        settings: &ClusterSettings,
    ) -> Self {
        Self {
            name: handle.worker_set_name.clone(),
            replicas: resources.worker_replicas(),
            service_name: handle.service_name.clone(),
            selector: handle.unit_id.labels(Role::Worker),
            template: InstanceSpec::worker(handle, resources, settings),
        }
    }
}

/// Headless service selecting every instance of a unit, master and workers alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryServiceSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub port: u16,
}

impl DiscoveryServiceSpec {
    pub fn for_unit(handle: &ClusterHandle, settings: &ClusterSettings) -> Self {
        Self {
            name: handle.service_name.clone(),
            labels: handle.unit_id.selector(),
            selector: handle.unit_id.selector(),
            port: settings.service_port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub storage_class_name: String,
    pub access_mode: String,
    pub size: String,
}

impl VolumeClaimSpec {
    pub fn for_unit(unit_id: ComputeUnitId, size: &Quantity, settings: &ClusterSettings) -> Self {
        Self {
            name: unit_id.volume_name(),
            labels: unit_id.selector(),
            storage_class_name: settings.storage_class_name.clone(),
            access_mode: settings.volume_access_mode.clone(),
            size: size.to_string(),
        }
    }
}

fn limits(resources: &ComputeUnitResources, settings: &ClusterSettings) -> BTreeMap<String, String> {
    let mut limits = BTreeMap::from([
        (RESOURCE_CPU.to_owned(), resources.cpu_limit.to_string()),
        (RESOURCE_MEMORY.to_owned(), resources.memory_limit.to_string()),
    ]);
    if resources.requests_gpu() {
        limits.insert(settings.gpu_resource_key.clone(), resources.gpu_limit.to_string());
    }
    limits
}

fn clustering_env(
    handle: &ClusterHandle,
    resources: &ComputeUnitResources,
) -> BTreeMap<String, String> {
    let mut env = resources.env.clone();
    env.insert(ENV_CLUSTERING_ENABLED.to_owned(), "true".to_owned());
    env.insert(ENV_MASTER_ADDRESS.to_owned(), handle.master_address.clone());
    env.insert(ENV_COMPUTE_UNIT_ID.to_owned(), handle.unit_id.to_string());
    env
}

fn volume_mount(handle: &ClusterHandle, settings: &ClusterSettings) -> VolumeMount {
    VolumeMount {
        claim_name: handle.volume_name.clone(),
        mount_path: settings.volume_mount_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ClusterSettings {
        ClusterSettings {
            namespace: "compute".to_string(),
            master_image: "engine-master:1".to_string(),
            worker_image: "engine-worker:1".to_string(),
            storage_class_name: "nfs".to_string(),
            ..Default::default()
        }
    }

    fn resources(gpu: &str) -> ComputeUnitResources {
        serde_json::from_value(serde_json::json!({
            "cpuLimit": "2",
            "memoryLimit": "4Gi",
            "diskLimit": "10Gi",
            "gpuLimit": gpu,
            "replicaCount": 4,
            "images": { "worker": "custom-worker:2" },
            "env": { "LOG_LEVEL": "debug" },
        }))
        .unwrap()
    }

    #[test]
    fn master_carries_clustering_environment() {
        let settings = settings();
        let handle = ClusterHandle::derive(ComputeUnitId::new(5).unwrap(), &settings);
        let master = InstanceSpec::master(&handle, &resources("0"), &settings);

        assert_eq!(master.name, "computing-unit-5");
        assert_eq!(master.image, "engine-master:1");
        assert_eq!(master.env[ENV_CLUSTERING_ENABLED], "true");
        assert_eq!(master.env[ENV_MASTER_ADDRESS], handle.master_address);
        assert_eq!(master.env["LOG_LEVEL"], "debug");
        assert_eq!(master.hostname.as_deref(), Some("computing-unit-5"));
        assert_eq!(master.subdomain.as_deref(), Some("computing-unit-5-svc"));
        assert_eq!(master.volume.claim_name, "computing-unit-5-pvc");
        assert!(!master.limits.contains_key("nvidia.com/gpu"));
    }

    #[test]
    fn worker_set_shares_volume_and_environment() {
        let settings = settings();
        let handle = ClusterHandle::derive(ComputeUnitId::new(5).unwrap(), &settings);
        let workers = WorkerSetSpec::for_unit(&handle, &resources("1"), &settings);

        assert_eq!(workers.replicas, 3);
        assert_eq!(workers.service_name, handle.service_name);
        assert_eq!(workers.template.image, "custom-worker:2");
        assert_eq!(workers.template.volume.claim_name, handle.volume_name);
        assert_eq!(workers.template.env[ENV_MASTER_ADDRESS], handle.master_address);
        assert_eq!(workers.template.limits["nvidia.com/gpu"], "1");
        assert_eq!(workers.selector["role"], "worker");
    }

    #[test]
    fn discovery_service_selects_all_roles() {
        let settings = settings();
        let handle = ClusterHandle::derive(ComputeUnitId::new(9).unwrap(), &settings);
        let service = DiscoveryServiceSpec::for_unit(&handle, &settings);
        assert_eq!(service.name, "computing-unit-9-svc");
        assert_eq!(service.selector.len(), 2);
        assert_eq!(service.port, 2552);
    }
}
