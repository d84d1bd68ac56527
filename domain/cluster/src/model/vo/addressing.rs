//! Deterministic names and network addresses of a compute unit.
//!
//! Every name derived here is a pure function of the [`ComputeUnitId`] (and, for the
//! master address, the static [`ClusterSettings`]). Nothing is random, so any component
//! can recompute where a unit lives without asking a lookup service, and lifecycle
//! operations can be repeated safely.

use std::{collections::BTreeMap, fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ClusterSettings;

pub const INSTANCE_NAME_PREFIX: &str = "computing-unit";
pub const SERVICE_SUFFIX: &str = "svc";
pub const VOLUME_SUFFIX: &str = "pvc";
pub const WORKER_SET_SUFFIX: &str = "workers";

pub const LABEL_TYPE: &str = "type";
pub const LABEL_UNIT_ID: &str = "cuid";
pub const LABEL_ROLE: &str = "role";
pub const LABEL_TYPE_VALUE: &str = "computing-unit";

/// Identifier of one compute unit. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputeUnitId(NonZeroU32);

#[derive(Debug, Error)]
#[error("compute unit id must be a positive integer, got {0:?}")]
pub struct InvalidComputeUnitId(pub String);

impl ComputeUnitId {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// `computing-unit-<id>`, also the master instance name.
    pub fn instance_name(self) -> String {
        format!("{INSTANCE_NAME_PREFIX}-{}", self.0)
    }

    /// Headless discovery service of the unit.
    pub fn service_name(self) -> String {
        format!("{}-{SERVICE_SUFFIX}", self.instance_name())
    }

    /// Shared persistent volume claim of the unit.
    pub fn volume_name(self) -> String {
        format!("{}-{VOLUME_SUFFIX}", self.instance_name())
    }

    /// Worker replica set of the unit.
    pub fn worker_set_name(self) -> String {
        format!("{}-{WORKER_SET_SUFFIX}", self.instance_name())
    }

    /// Labels shared by every instance of the unit, regardless of role.
    pub fn selector(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_TYPE.to_owned(), LABEL_TYPE_VALUE.to_owned()),
            (LABEL_UNIT_ID.to_owned(), self.to_string()),
        ])
    }

    pub fn labels(self, role: Role) -> BTreeMap<String, String> {
        let mut labels = self.selector();
        labels.insert(LABEL_ROLE.to_owned(), role.as_str().to_owned());
        labels
    }
}

impl fmt::Display for ComputeUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ComputeUnitId {
    type Err = InvalidComputeUnitId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU32>().map(Self).map_err(|_| InvalidComputeUnitId(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Worker,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

/// `<instanceName>.<serviceName>.<namespace>.<clusterDomainSuffix>`
pub fn master_address(unit_id: ComputeUnitId, settings: &ClusterSettings) -> String {
    format!(
        "{}.{}.{}.{}",
        unit_id.instance_name(),
        unit_id.service_name(),
        settings.namespace,
        settings.cluster_domain_suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ClusterSettings {
        ClusterSettings {
            namespace: "compute".to_string(),
            master_image: "engine:latest".to_string(),
            worker_image: "engine:latest".to_string(),
            storage_class_name: "standard".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn derived_names() {
        let id = ComputeUnitId::new(42).unwrap();
        assert_eq!(id.instance_name(), "computing-unit-42");
        assert_eq!(id.service_name(), "computing-unit-42-svc");
        assert_eq!(id.volume_name(), "computing-unit-42-pvc");
        assert_eq!(id.worker_set_name(), "computing-unit-42-workers");
    }

    #[test]
    fn master_address_is_pure() {
        let id = ComputeUnitId::new(7).unwrap();
        let settings = settings();
        let first = master_address(id, &settings);
        let second = master_address(id, &settings);
        assert_eq!(first, second);
        assert_eq!(
            first,
            "computing-unit-7.computing-unit-7-svc.compute.svc.cluster.local"
        );
    }

    #[test]
    fn labels_carry_role() {
        let id = ComputeUnitId::new(3).unwrap();
        let labels = id.labels(Role::Worker);
        assert_eq!(labels["type"], "computing-unit");
        assert_eq!(labels["cuid"], "3");
        assert_eq!(labels["role"], "worker");
        assert!(!id.selector().contains_key("role"));
    }

    #[test]
    fn parse_rejects_zero_and_garbage() {
        assert!("0".parse::<ComputeUnitId>().is_err());
        assert!("-1".parse::<ComputeUnitId>().is_err());
        assert!("abc".parse::<ComputeUnitId>().is_err());
        assert_eq!("12".parse::<ComputeUnitId>().unwrap().get(), 12);
        assert!(serde_json::from_str::<ComputeUnitId>("0").is_err());
    }
}
