pub mod cluster_handle;

#[rustfmt::skip]
pub use {
    cluster_handle::{ClusterHandle, ComputeUnitStatus, InstanceInfo, InstancePhase},
};
