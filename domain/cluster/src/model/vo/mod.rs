pub mod addressing;
pub mod manifest;
pub mod quantity;
pub mod resources;
pub mod settings;

#[rustfmt::skip]
pub use {
    addressing::{master_address, ComputeUnitId, Role},
    manifest::{DiscoveryServiceSpec, InstanceSpec, VolumeClaimSpec, VolumeMount, WorkerSetSpec},
    quantity::Quantity,
    resources::ComputeUnitResources,
    settings::ClusterSettings,
};
