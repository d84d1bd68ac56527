use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{manifest::RESERVED_ENV, Quantity};

/// Resources requested for one compute unit, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeUnitResources {
    pub cpu_limit: Quantity,
    pub memory_limit: Quantity,
    /// Size of the shared volume.
    pub disk_limit: Quantity,
    #[serde(default = "ComputeUnitResources::default_gpu_limit")]
    pub gpu_limit: Quantity,
    /// Master plus workers.
    #[serde(default = "ComputeUnitResources::default_replica_count")]
    pub replica_count: u32,
    #[serde(default)]
    pub images: ImageOverrides,
    /// Extra environment passed to every instance of the unit.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOverrides {
    pub master: Option<String>,
    pub worker: Option<String>,
}

impl ComputeUnitResources {
    fn default_gpu_limit() -> Quantity {
        Quantity::zero()
    }

    fn default_replica_count() -> u32 {
        1
    }

    /// Returns the reason the request cannot be honoured, if any.
    pub fn validate(&self) -> Result<(), String> {
        for (name, quantity) in [
            ("cpuLimit", &self.cpu_limit),
            ("memoryLimit", &self.memory_limit),
            ("diskLimit", &self.disk_limit),
        ] {
            if !quantity.is_positive() {
                return Err(format!("{name} must be positive, got {quantity}"));
            }
        }
        if self.gpu_limit.value() < 0.0 || !self.gpu_limit.is_whole() {
            return Err(format!(
                "gpuLimit must be a non-negative integer, got {}",
                self.gpu_limit
            ));
        }
        if self.replica_count == 0 {
            return Err("replicaCount must be at least 1".to_string());
        }
        if let Some(key) = self.env.keys().find(|key| RESERVED_ENV.contains(&key.as_str())) {
            return Err(format!("environment variable {key} is reserved"));
        }
        Ok(())
    }

    pub fn worker_replicas(&self) -> u32 {
        self.replica_count.saturating_sub(1)
    }

    pub fn requests_gpu(&self) -> bool {
        self.gpu_limit.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> ComputeUnitResources {
        serde_json::from_value(serde_json::json!({
            "cpuLimit": "2",
            "memoryLimit": "4Gi",
            "diskLimit": "10Gi",
            "replicaCount": 3,
        }))
        .unwrap()
    }

    #[test]
    fn defaults_and_validation() {
        let resources = resources();
        assert!(resources.validate().is_ok());
        assert_eq!(resources.worker_replicas(), 2);
        assert!(!resources.requests_gpu());
        assert!(resources.images.master.is_none());
    }

    #[test]
    fn rejects_non_positive_limits() {
        let mut resources = resources();
        resources.cpu_limit = "0".parse().unwrap();
        assert!(resources.validate().unwrap_err().contains("cpuLimit"));

        let mut resources = self::resources();
        resources.replica_count = 0;
        assert!(resources.validate().is_err());

        let mut resources = self::resources();
        resources.gpu_limit = "1.5".parse().unwrap();
        assert!(resources.validate().unwrap_err().contains("gpuLimit"));
    }

    #[test]
    fn rejects_reserved_environment() {
        let mut resources = resources();
        resources
            .env
            .insert("CLUSTERING_MASTER_ADDRESS".to_string(), "elsewhere".to_string());
        assert!(resources.validate().unwrap_err().contains("reserved"));
    }
}
