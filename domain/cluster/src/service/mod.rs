mod backend;
mod lifecycle;
mod volume;

#[rustfmt::skip]
pub use {
    backend::{BackendError, BackendResult, OrchestrationBackend, ResourceKind},
    lifecycle::ClusterLifecycleService,
    volume::VolumeProvisionService,
};
