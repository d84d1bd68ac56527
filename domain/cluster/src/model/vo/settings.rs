use serde::{Deserialize, Serialize};

/// Static, externally injected settings every compute unit is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Namespace all unit resources live in.
    #[serde(default = "ClusterSettings::default_namespace")]
    pub namespace: String,
    /// DNS suffix appended after the namespace.
    #[serde(default = "ClusterSettings::default_cluster_domain_suffix")]
    pub cluster_domain_suffix: String,
    /// Image of the master instance unless overridden per unit.
    pub master_image: String,
    /// Image of the worker replicas unless overridden per unit.
    pub worker_image: String,
    pub storage_class_name: String,
    #[serde(default = "ClusterSettings::default_volume_access_mode")]
    pub volume_access_mode: String,
    #[serde(default = "ClusterSettings::default_volume_mount_path")]
    pub volume_mount_path: String,
    /// Extended resource name GPUs are requested under.
    #[serde(default = "ClusterSettings::default_gpu_resource_key")]
    pub gpu_resource_key: String,
    /// Port peers of one unit talk to each other on.
    #[serde(default = "ClusterSettings::default_service_port")]
    pub service_port: u16,
}

impl ClusterSettings {
    fn default_namespace() -> String {
        "default".to_string()
    }

    fn default_cluster_domain_suffix() -> String {
        "svc.cluster.local".to_string()
    }

    fn default_volume_access_mode() -> String {
        "ReadWriteMany".to_string()
    }

    fn default_volume_mount_path() -> String {
        "/data".to_string()
    }

    fn default_gpu_resource_key() -> String {
        "nvidia.com/gpu".to_string()
    }

    fn default_service_port() -> u16 {
        2552
    }
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            namespace: Self::default_namespace(),
            cluster_domain_suffix: Self::default_cluster_domain_suffix(),
            master_image: Default::default(),
            worker_image: Default::default(),
            storage_class_name: Default::default(),
            volume_access_mode: Self::default_volume_access_mode(),
            volume_mount_path: Self::default_volume_mount_path(),
            gpu_resource_key: Self::default_gpu_resource_key(),
            service_port: Self::default_service_port(),
        }
    }
}
