use domain_cluster::model::vo::ClusterSettings;
use domain_execution::model::vo::AggregationOptions;
use infrastructure_common::config::CommonConfig;
use serde::Deserialize;

#[derive(Default, Clone, Deserialize, Debug)]
pub struct CosConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub cluster: ClusterSettings,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub worker_rpc: WorkerRpcConfig,
    #[serde(default)]
    pub aggregation: AggregationOptions,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub internal_topics: InternalTopics,
}

#[derive(Clone, Deserialize, Debug)]
pub struct KubernetesConfig {
    #[serde(default = "KubernetesConfig::default_api_server")]
    pub api_server: String,
    /// Bearer token; read from `token_path` when empty.
    #[serde(default)]
    pub token: String,
    #[serde(default = "KubernetesConfig::default_token_path")]
    pub token_path: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "KubernetesConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl KubernetesConfig {
    fn default_api_server() -> String {
        "https://kubernetes.default.svc".to_string()
    }

    fn default_token_path() -> String {
        "/var/run/secrets/kubernetes.io/serviceaccount/token".to_string()
    }

    fn default_request_timeout_secs() -> u64 {
        30
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_server: Self::default_api_server(),
            token: Default::default(),
            token_path: Self::default_token_path(),
            accept_invalid_certs: Default::default(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct WorkerRpcConfig {
    /// Gateway forwarding `workers/{identity}/...` to the worker processes.
    #[serde(default = "WorkerRpcConfig::default_base_url")]
    pub base_url: String,
}

impl WorkerRpcConfig {
    fn default_base_url() -> String {
        "http://localhost:9090".to_string()
    }
}

impl Default for WorkerRpcConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct CoordinatorConfig {
    #[serde(default = "CoordinatorConfig::default_enable")]
    pub enable: bool,
    /// Seconds between two aggregation rounds of one execution.
    #[serde(default = "CoordinatorConfig::default_interval")]
    pub interval: u64,
}

impl CoordinatorConfig {
    fn default_enable() -> bool {
        true
    }

    fn default_interval() -> u64 {
        5
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            enable: Self::default_enable(),
            interval: Self::default_interval(),
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct InternalTopics {
    #[serde(default = "InternalTopics::default_execution_statistics")]
    pub execution_statistics: String,
}

impl InternalTopics {
    fn default_execution_statistics() -> String {
        "execution-statistics".to_string()
    }
}

impl Default for InternalTopics {
    fn default() -> Self {
        Self {
            execution_statistics: Self::default_execution_statistics(),
        }
    }
}
