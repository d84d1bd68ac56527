use std::{collections::HashMap, sync::Arc, time::Duration};

use domain_cluster::service::{ClusterLifecycleService, OrchestrationBackend};
use domain_execution::{
    model::entity::WorkerRegistry,
    service::{StatisticsAggregateService, WorkerRpcService},
};
use getset::Getters;
use infrastructure_common::{
    hosting::BackgroundService,
    message_queue::{InternalMessageQueueConsumer, InternalMessageQueueProducer},
    ConsumerFn,
};
use reqwest::Url;
use service_cluster::{ClusterLifecycleServiceImpl, VolumeProvisionServiceImpl};
use service_execution::StatisticsAggregateServiceImpl;
use typed_builder::TypedBuilder;

use super::{
    config::{CosConfig, KubernetesConfig},
    coordinator::StatisticsCoordinator,
    kubernetes::KubernetesBackend,
    snapshot_channel::{snapshot_consumer, QueueSnapshotPublisher, SnapshotStore},
    worker_rpc::HttpWorkerRpcService,
};

/// Hand wired container of every long lived component.
#[derive(TypedBuilder, Getters)]
#[getset(get = "pub")]
pub struct ServiceProvider {
    #[builder(default)]
    config: CosConfig,
    cluster_lifecycle_service: Arc<dyn ClusterLifecycleService>,
    worker_registry: Arc<WorkerRegistry>,
    statistics_aggregate_service: Arc<dyn StatisticsAggregateService>,
    #[builder(default)]
    internal_message_queue_producer: Arc<InternalMessageQueueProducer>,
    #[builder(default)]
    snapshot_store: Arc<SnapshotStore>,
}

impl ServiceProvider {
    pub fn build(config: config::Config) -> anyhow::Result<Self> {
        let config = config.try_deserialize::<CosConfig>()?;

        let backend: Arc<dyn OrchestrationBackend> = Arc::new(
            KubernetesBackend::builder()
                .http_client(Arc::new(kubernetes_http_client(&config.kubernetes)?))
                .api_server(Url::parse(&config.kubernetes.api_server)?)
                .token(kubernetes_token(&config.kubernetes))
                .namespace(config.cluster.namespace.clone())
                .build(),
        );
        let volume_service = Arc::new(
            VolumeProvisionServiceImpl::builder()
                .backend(backend.clone())
                .settings(config.cluster.clone())
                .build(),
        );
        let cluster_lifecycle_service = Arc::new(
            ClusterLifecycleServiceImpl::builder()
                .backend(backend)
                .volume_service(volume_service)
                .settings(config.cluster.clone())
                .build(),
        );

        let internal_message_queue_producer = Arc::new(InternalMessageQueueProducer::new());
        let worker_registry = Arc::new(WorkerRegistry::new());
        let worker_rpc: Arc<dyn WorkerRpcService> = Arc::new(
            HttpWorkerRpcService::builder()
                .http_client(Arc::new(reqwest::Client::new()))
                .base_url(Url::parse(&config.worker_rpc.base_url)?)
                .build(),
        );
        let publisher = Arc::new(
            QueueSnapshotPublisher::builder()
                .producer(internal_message_queue_producer.clone())
                .topic(config.internal_topics.execution_statistics.clone())
                .build(),
        );
        let statistics_aggregate_service = Arc::new(
            StatisticsAggregateServiceImpl::builder()
                .registry(worker_registry.clone())
                .worker_rpc(worker_rpc)
                .publisher(publisher)
                .options(config.aggregation.clone())
                .build(),
        );

        Ok(Self {
            config,
            cluster_lifecycle_service,
            worker_registry,
            statistics_aggregate_service,
            internal_message_queue_producer,
            snapshot_store: Arc::new(SnapshotStore::default()),
        })
    }

    pub fn background_services(self: &Arc<Self>) -> Vec<Arc<dyn BackgroundService>> {
        let mut fn_mapper: HashMap<String, ConsumerFn<ServiceProvider>> = HashMap::new();
        fn_mapper.insert(
            self.config.internal_topics.execution_statistics.clone(),
            snapshot_consumer,
        );
        let consumer: Arc<dyn BackgroundService> = Arc::new(InternalMessageQueueConsumer::new(
            self.internal_message_queue_producer.get_receiver(),
            self.clone(),
            fn_mapper,
        ));
        let mut tasks = vec![consumer];
        if self.config.coordinator.enable {
            tasks.push(Arc::new(
                StatisticsCoordinator::builder()
                    .registry(self.worker_registry.clone())
                    .aggregate_service(self.statistics_aggregate_service.clone())
                    .interval(Duration::from_secs(self.config.coordinator.interval))
                    .build(),
            ));
        }
        tasks
    }
}

fn kubernetes_http_client(config: &KubernetesConfig) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?)
}

/// The configured token, or the mounted service account token when running in cluster.
fn kubernetes_token(config: &KubernetesConfig) -> Option<String> {
    if !config.token.is_empty() {
        return Some(config.token.clone());
    }
    std::fs::read_to_string(&config.token_path)
        .ok()
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}
