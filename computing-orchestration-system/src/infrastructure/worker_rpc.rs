use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use domain_execution::{
    model::vo::{
        TableProfile, WorkerIdentity, WorkerState, WorkerStatistics, WorkerStatisticsReply,
    },
    service::WorkerRpcService,
};
use reqwest::Url;
use serde::Deserialize;
use typed_builder::TypedBuilder;

/// Reaches workers through an HTTP gateway.
#[derive(TypedBuilder)]
pub struct HttpWorkerRpcService {
    http_client: Arc<reqwest::Client>,
    base_url: Url,
}

#[derive(Deserialize)]
struct StatisticsReplyDto {
    state: i32,
    #[serde(default)]
    statistics: WorkerStatistics,
}

#[async_trait]
impl WorkerRpcService for HttpWorkerRpcService {
    async fn query_statistics(
        &self,
        identity: &WorkerIdentity,
    ) -> anyhow::Result<WorkerStatisticsReply> {
        let reply: StatisticsReplyDto = self.post(identity, "statistics").await?;
        let state = WorkerState::from_code(reply.state)
            .ok_or_else(|| anyhow!("worker {identity} reported unknown state {}", reply.state))?;
        Ok(WorkerStatisticsReply {
            state,
            statistics: reply.statistics,
        })
    }

    async fn query_table_profile(&self, identity: &WorkerIdentity) -> anyhow::Result<TableProfile> {
        self.post(identity, "table-profile").await
    }
}

impl HttpWorkerRpcService {
    fn url(&self, identity: &WorkerIdentity, query: &str) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("worker gateway url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(["workers", identity.as_str(), query]);
        Ok(url)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        identity: &WorkerIdentity,
        query: &str,
    ) -> anyhow::Result<T> {
        Ok(self
            .http_client
            .post(self.url(identity, query)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_one_path_segment() {
        let service = HttpWorkerRpcService::builder()
            .http_client(Arc::new(reqwest::Client::new()))
            .base_url("http://gateway:9090/api/".parse().unwrap())
            .build();
        let url = service
            .url(&WorkerIdentity::new("scan/worker:1"), "statistics")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://gateway:9090/api/workers/scan%2Fworker:1/statistics"
        );
    }

    #[test]
    fn reply_carries_state_code() {
        let reply: StatisticsReplyDto = serde_json::from_value(serde_json::json!({
            "state": 4,
            "statistics": { "inputTupleCount": 7, "outputTupleCount": 3 }
        }))
        .unwrap();
        assert_eq!(WorkerState::from_code(reply.state), Some(WorkerState::Completed));
        assert_eq!(reply.statistics.input_tuple_count, 7);
    }
}
