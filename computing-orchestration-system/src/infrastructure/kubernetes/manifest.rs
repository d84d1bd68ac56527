//! Kubernetes objects rendered from the backend-neutral specs.

use domain_cluster::model::vo::{
    DiscoveryServiceSpec, InstanceSpec, VolumeClaimSpec, WorkerSetSpec,
};
use serde_json::{json, Value};

const CONTAINER_NAME: &str = "engine";
const VOLUME_NAME: &str = "data";
const PORT_NAME: &str = "cluster";

pub fn pod(spec: &InstanceSpec) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": spec.name,
            "labels": spec.labels,
        },
        "spec": pod_spec(spec),
    })
}

pub fn stateful_set(spec: &WorkerSetSpec) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "StatefulSet",
        "metadata": {
            "name": spec.name,
            "labels": spec.selector,
        },
        "spec": {
            "replicas": spec.replicas,
            "serviceName": spec.service_name,
            "podManagementPolicy": "Parallel",
            "selector": { "matchLabels": spec.selector },
            "template": {
                "metadata": { "labels": spec.template.labels },
                "spec": pod_spec(&spec.template),
            },
        },
    })
}

pub fn headless_service(spec: &DiscoveryServiceSpec) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": spec.name,
            "labels": spec.labels,
        },
        "spec": {
            "clusterIP": "None",
            "publishNotReadyAddresses": true,
            "selector": spec.selector,
            "ports": [{ "name": PORT_NAME, "port": spec.port, "targetPort": spec.port }],
        },
    })
}

pub fn persistent_volume_claim(spec: &VolumeClaimSpec) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": {
            "name": spec.name,
            "labels": spec.labels,
        },
        "spec": {
            "accessModes": [spec.access_mode],
            "storageClassName": spec.storage_class_name,
            "resources": { "requests": { "storage": spec.size } },
        },
    })
}

pub fn delete_options() -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "DeleteOptions",
        "propagationPolicy": "Background",
    })
}

fn pod_spec(spec: &InstanceSpec) -> Value {
    let env = spec
        .env
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect::<Vec<_>>();
    let mut pod_spec = json!({
        "containers": [{
            "name": CONTAINER_NAME,
            "image": spec.image,
            "env": env,
            "ports": [{ "name": PORT_NAME, "containerPort": spec.port }],
            "resources": { "limits": spec.limits, "requests": spec.limits },
            "volumeMounts": [{ "name": VOLUME_NAME, "mountPath": spec.volume.mount_path }],
        }],
        "volumes": [{
            "name": VOLUME_NAME,
            "persistentVolumeClaim": { "claimName": spec.volume.claim_name },
        }],
    });
    if let Some(hostname) = &spec.hostname {
        pod_spec["hostname"] = json!(hostname);
    }
    if let Some(subdomain) = &spec.subdomain {
        pod_spec["subdomain"] = json!(subdomain);
    }
    pod_spec
}
