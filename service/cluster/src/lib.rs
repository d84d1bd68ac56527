mod lifecycle;
mod volume;

pub use lifecycle::ClusterLifecycleServiceImpl;
pub use volume::VolumeProvisionServiceImpl;
