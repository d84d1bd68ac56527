use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use domain_execution::{
    exception::{ExecutionException, ExecutionResult},
    model::{
        entity::{WorkerRegistry, WorkflowExecutionRecord},
        vo::{
            AggregatedSnapshot, AggregationOptions, FailurePolicy, TableProfileSlot,
            WorkerIdentity, WorkerObservation,
        },
    },
    service::{SnapshotPublisher, StatisticsAggregateService, WorkerRpcService},
};
use futures::future::{join_all, try_join_all};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Scatter-gather over the workers of an execution.
///
/// Every branch lives inside the round future, dropping the round cancels all of
/// them. Records are only written after the last branch returned.
#[derive(TypedBuilder)]
pub struct StatisticsAggregateServiceImpl {
    registry: Arc<WorkerRegistry>,
    worker_rpc: Arc<dyn WorkerRpcService>,
    publisher: Arc<dyn SnapshotPublisher>,
    #[builder(default)]
    options: AggregationOptions,
}

#[async_trait]
impl StatisticsAggregateService for StatisticsAggregateServiceImpl {
    async fn refresh_statistics(
        &self,
        execution_id: Uuid,
        workers: Option<Vec<WorkerIdentity>>,
    ) -> ExecutionResult<AggregatedSnapshot> {
        let execution = self.registry.get(execution_id)?;
        let targets = Self::targets(&execution, workers)?;
        let branches = targets.iter().map(|identity| self.observe(identity));

        match self.options.failure_policy {
            FailurePolicy::RetainStale => {
                let outcomes = join_all(branches).await;
                for (identity, outcome) in targets.iter().zip(outcomes) {
                    match outcome {
                        Ok(observation) => execution.apply(observation)?,
                        Err(e) => {
                            warn!(execution_id = %execution_id, error = %e, "Keeping stale data.");
                            execution.mark_stale(identity)?;
                        }
                    }
                }
            }
            FailurePolicy::AbortRound => {
                let observations = try_join_all(branches).await.map_err(|e| {
                    warn!(execution_id = %execution_id, error = %e, "Aggregation round aborted.");
                    e
                })?;
                for observation in observations {
                    execution.apply(observation)?;
                }
            }
        }

        let snapshot = execution.snapshot(Utc::now());
        self.publisher
            .publish(&snapshot)
            .await
            .map_err(|source| ExecutionException::PublishFailed {
                execution_id,
                source,
            })?;
        debug!(
            execution_id = %execution_id,
            workers = targets.len(),
            stale = snapshot.stale_workers.len(),
            "Statistics snapshot published."
        );
        Ok(snapshot)
    }
}

impl StatisticsAggregateServiceImpl {
    fn targets(
        execution: &WorkflowExecutionRecord,
        workers: Option<Vec<WorkerIdentity>>,
    ) -> ExecutionResult<Vec<WorkerIdentity>> {
        let Some(mut workers) = workers else {
            return Ok(execution.worker_identities());
        };
        if let Some(identity) = workers.iter().find(|identity| !execution.contains(identity)) {
            return Err(ExecutionException::UnknownWorker {
                execution_id: execution.execution_id(),
                identity: identity.clone(),
            });
        }
        let mut seen = HashSet::new();
        workers.retain(|identity| seen.insert(identity.clone()));
        Ok(workers)
    }

    /// One branch: the state query, then the profile query for completed workers.
    async fn observe(&self, identity: &WorkerIdentity) -> ExecutionResult<WorkerObservation> {
        let branch = self.query(identity);
        let outcome = match self.options.worker_timeout() {
            Some(limit) => match tokio::time::timeout(limit, branch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(anyhow::anyhow!("no reply within {} ms", limit.as_millis())),
            },
            None => branch.await,
        };
        outcome.map_err(|source| ExecutionException::WorkerUnreachable {
            identity: identity.clone(),
            source,
        })
    }

    async fn query(&self, identity: &WorkerIdentity) -> anyhow::Result<WorkerObservation> {
        let reply = self.worker_rpc.query_statistics(identity).await?;
        let table_profile = if reply.state.is_completed() {
            TableProfileSlot::Available(self.worker_rpc.query_table_profile(identity).await?)
        } else {
            TableProfileSlot::NotAvailable
        };
        Ok(WorkerObservation {
            identity: identity.clone(),
            state: reply.state,
            statistics: reply.statistics,
            table_profile,
            observed_at: Utc::now(),
        })
    }
}
