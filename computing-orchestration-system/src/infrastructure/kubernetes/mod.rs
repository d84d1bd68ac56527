mod client;
mod manifest;

pub use client::KubernetesBackend;
