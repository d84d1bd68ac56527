use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use domain_cluster::{
    model::{
        entity::{InstanceInfo, InstancePhase},
        vo::{DiscoveryServiceSpec, InstanceSpec, Quantity, VolumeClaimSpec, WorkerSetSpec},
    },
    service::{BackendError, BackendResult, OrchestrationBackend, ResourceKind},
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::trace;
use typed_builder::TypedBuilder;

use super::manifest;

/// [`OrchestrationBackend`] on the Kubernetes REST API of one namespace.
#[derive(TypedBuilder)]
pub struct KubernetesBackend {
    http_client: Arc<reqwest::Client>,
    api_server: Url,
    #[builder(default)]
    token: Option<String>,
    namespace: String,
}

#[async_trait]
impl OrchestrationBackend for KubernetesBackend {
    async fn get_instance(&self, name: &str) -> BackendResult<Option<InstanceInfo>> {
        let pod = self.get(ResourceKind::Instance, name).await?;
        Ok(pod.map(|pod| instance_info(name, &pod)))
    }

    async fn create_instance(&self, spec: &InstanceSpec) -> BackendResult<()> {
        self.create(ResourceKind::Instance, &spec.name, &manifest::pod(spec)).await
    }

    async fn delete_instance(&self, name: &str) -> BackendResult<()> {
        self.delete(ResourceKind::Instance, name).await
    }

    async fn create_worker_set(&self, spec: &WorkerSetSpec) -> BackendResult<()> {
        self.create(ResourceKind::WorkerSet, &spec.name, &manifest::stateful_set(spec)).await
    }

    async fn delete_worker_set(&self, name: &str) -> BackendResult<()> {
        self.delete(ResourceKind::WorkerSet, name).await
    }

    async fn create_discovery_service(&self, spec: &DiscoveryServiceSpec) -> BackendResult<()> {
        let service = manifest::headless_service(spec);
        self.create(ResourceKind::DiscoveryService, &spec.name, &service).await
    }

    async fn delete_discovery_service(&self, name: &str) -> BackendResult<()> {
        self.delete(ResourceKind::DiscoveryService, name).await
    }

    async fn volume_claim_exists(&self, name: &str) -> BackendResult<bool> {
        Ok(self.get(ResourceKind::VolumeClaim, name).await?.is_some())
    }

    async fn create_volume_claim(&self, spec: &VolumeClaimSpec) -> BackendResult<()> {
        let claim = manifest::persistent_volume_claim(spec);
        self.create(ResourceKind::VolumeClaim, &spec.name, &claim).await
    }

    async fn delete_volume_claim(&self, name: &str) -> BackendResult<()> {
        self.delete(ResourceKind::VolumeClaim, name).await
    }

    async fn instance_usage(&self, name: &str) -> BackendResult<Option<BTreeMap<String, String>>> {
        let namespace = self.namespace.as_str();
        let url = self.url(
            &["apis", "metrics.k8s.io", "v1beta1", "namespaces", namespace, "pods"],
            Some(name),
        )?;
        let response = self.send(ResourceKind::Instance, name, self.request(Method::GET, url)).await;
        match response {
            Ok(response) => Ok(Some(sum_usage(&json(response).await?))),
            // metrics lag behind a freshly started pod
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl KubernetesBackend {
    fn collection(&self, kind: ResourceKind) -> [&str; 5] {
        let namespace = self.namespace.as_str();
        match kind {
            ResourceKind::Instance => ["api", "v1", "namespaces", namespace, "pods"],
            ResourceKind::WorkerSet => ["apis", "apps/v1", "namespaces", namespace, "statefulsets"],
            ResourceKind::DiscoveryService => ["api", "v1", "namespaces", namespace, "services"],
            ResourceKind::VolumeClaim => {
                ["api", "v1", "namespaces", namespace, "persistentvolumeclaims"]
            }
        }
    }

    fn url(&self, segments: &[&str], name: Option<&str>) -> BackendResult<Url> {
        let mut url = self.api_server.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::Unavailable(anyhow::anyhow!(
                    "api server url {} cannot carry a path",
                    self.api_server
                ))
            })?
            .pop_if_empty()
            .extend(segments.iter().flat_map(|segment| segment.split('/')))
            .extend(name);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        trace!(%method, %url, "Kubernetes request.");
        let request = self.http_client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        kind: ResourceKind,
        name: &str,
        request: RequestBuilder,
    ) -> BackendResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.into()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(classify(kind, name, status, message))
    }

    async fn get(&self, kind: ResourceKind, name: &str) -> BackendResult<Option<Value>> {
        let url = self.url(&self.collection(kind), Some(name))?;
        match self.send(kind, name, self.request(Method::GET, url)).await {
            Ok(response) => Ok(Some(json(response).await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, kind: ResourceKind, name: &str, body: &Value) -> BackendResult<()> {
        let url = self.url(&self.collection(kind), None)?;
        self.send(kind, name, self.request(Method::POST, url).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> BackendResult<()> {
        let url = self.url(&self.collection(kind), Some(name))?;
        let request = self.request(Method::DELETE, url).json(&manifest::delete_options());
        self.send(kind, name, request).await?;
        Ok(())
    }
}

async fn json(response: Response) -> BackendResult<Value> {
    response
        .json()
        .await
        .map_err(|e| BackendError::Unavailable(e.into()))
}

fn classify(kind: ResourceKind, name: &str, status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound {
            kind,
            name: name.to_owned(),
        },
        StatusCode::CONFLICT => BackendError::AlreadyExists {
            kind,
            name: name.to_owned(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::Unavailable(anyhow::anyhow!("{status}: {message}"))
        }
        _ => BackendError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn instance_info(name: &str, pod: &Value) -> InstanceInfo {
    let limits = pod["spec"]["containers"][0]["resources"]["limits"]
        .as_object()
        .map(|limits| {
            limits
                .iter()
                .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_owned())))
                .collect()
        })
        .unwrap_or_default();
    InstanceInfo {
        name: name.to_owned(),
        phase: pod["status"]["phase"].as_str().map(InstancePhase::from).unwrap_or_default(),
        limits,
    }
}

/// Usage per resource. Values of several containers are summed, `cpu` rendered in
/// millicores and everything else in base units.
fn sum_usage(metrics: &Value) -> BTreeMap<String, String> {
    let containers = metrics["containers"].as_array().cloned().unwrap_or_default();
    let usages = containers
        .iter()
        .filter_map(|container| container["usage"].as_object())
        .collect::<Vec<_>>();
    if let [usage] = usages.as_slice() {
        return usage
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_owned())))
            .collect();
    }
    let mut totals = BTreeMap::<String, f64>::new();
    for usage in usages {
        for (key, value) in usage {
            if let Some(quantity) = value.as_str().and_then(|v| v.parse::<Quantity>().ok()) {
                *totals.entry(key.clone()).or_default() += quantity.value();
            }
        }
    }
    totals
        .into_iter()
        .map(|(key, total)| {
            let rendered = if key == "cpu" {
                format!("{}m", (total * 1000.0).round())
            } else {
                format!("{}", total.round())
            };
            (key, rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn backend(api_server: &str) -> KubernetesBackend {
        KubernetesBackend::builder()
            .http_client(Arc::new(reqwest::Client::new()))
            .api_server(api_server.parse().unwrap())
            .namespace("compute".to_string())
            .build()
    }

    #[test]
    fn resource_urls() {
        let backend = backend("https://10.0.0.1:6443/");
        let url = backend
            .url(&backend.collection(ResourceKind::WorkerSet), Some("computing-unit-1-workers"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://10.0.0.1:6443/apis/apps/v1/namespaces/compute/statefulsets/computing-unit-1-workers"
        );
        let url = backend.url(&backend.collection(ResourceKind::VolumeClaim), None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://10.0.0.1:6443/api/v1/namespaces/compute/persistentvolumeclaims"
        );
    }

    #[test]
    fn status_classification() {
        let kind = ResourceKind::Instance;
        assert!(classify(kind, "p", StatusCode::NOT_FOUND, String::new()).is_not_found());
        assert!(classify(kind, "p", StatusCode::CONFLICT, String::new()).is_already_exists());
        assert!(matches!(
            classify(kind, "p", StatusCode::FORBIDDEN, String::new()),
            BackendError::Unavailable(_)
        ));
        assert!(matches!(
            classify(kind, "p", StatusCode::UNPROCESSABLE_ENTITY, "bad".to_string()),
            BackendError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn reads_phase_and_limits() {
        let pod = json!({
            "spec": { "containers": [{ "resources": { "limits": { "cpu": "2", "memory": "4Gi" } } }] },
            "status": { "phase": "Running" }
        });
        let info = instance_info("computing-unit-1", &pod);
        assert_eq!(info.phase, InstancePhase::Running);
        assert_eq!(info.limits["memory"], "4Gi");

        let pending = instance_info("computing-unit-1", &json!({}));
        assert_eq!(pending.phase, InstancePhase::Unknown);
        assert!(pending.limits.is_empty());
    }

    #[test]
    fn sums_usage_of_several_containers() {
        let single = json!({ "containers": [{ "usage": { "cpu": "12m", "memory": "100Mi" } }] });
        assert_eq!(sum_usage(&single)["cpu"], "12m");

        let several = json!({ "containers": [
            { "usage": { "cpu": "250m", "memory": "1Ki" } },
            { "usage": { "cpu": "500000000n", "memory": "1024" } },
        ] });
        let usage = sum_usage(&several);
        assert_eq!(usage["cpu"], "750m");
        assert_eq!(usage["memory"], "2048");
        assert!(sum_usage(&json!({})).is_empty());
    }
}
