use std::{sync::Arc, time::Duration};

use domain_execution::{
    exception::ExecutionException, model::entity::WorkerRegistry,
    service::StatisticsAggregateService,
};
use futures::future::join_all;
use infrastructure_common::hosting::BackgroundService;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn, Instrument};
use typed_builder::TypedBuilder;

/// Runs one aggregation round per registered execution every interval.
#[derive(TypedBuilder)]
pub struct StatisticsCoordinator {
    registry: Arc<WorkerRegistry>,
    aggregate_service: Arc<dyn StatisticsAggregateService>,
    interval: Duration,
}

#[async_trait::async_trait]
impl BackgroundService for StatisticsCoordinator {
    async fn run(&self) {
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.poll_all()
                .instrument(tracing::trace_span!("statistics_coordinator"))
                .await;
        }
    }
}

impl StatisticsCoordinator {
    /// Rounds of different executions run concurrently; a slow execution delays the
    /// next tick instead of overlapping with itself.
    pub async fn poll_all(&self) {
        let rounds = self.registry.execution_ids().into_iter().map(|execution_id| async move {
            match self.aggregate_service.refresh_statistics(execution_id, None).await {
                Ok(_) => {}
                Err(ExecutionException::ExecutionNotFound { .. }) => {
                    debug!(execution_id = %execution_id, "Execution disposed during the round.")
                }
                Err(e) => {
                    warn!(execution_id = %execution_id, error = %e, "Aggregation round failed.")
                }
            }
        });
        join_all(rounds).await;
    }
}

#[cfg(test)]
mod tests {
    use domain_execution::{
        mock::MockStatisticsAggregateService,
        model::vo::{OperatorId, OperatorPlan, PhysicalPlan, RegionPlan, WorkerIdentity},
    };
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn polls_every_registered_execution() {
        let registry = Arc::new(WorkerRegistry::new());
        let plan = PhysicalPlan {
            regions: vec![RegionPlan {
                id: 0,
                operators: vec![OperatorPlan {
                    id: OperatorId::new("op"),
                    workers: vec![WorkerIdentity::new("w1")],
                }],
            }],
        };
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        registry.register(first, &plan).unwrap();
        registry.register(second, &plan).unwrap();

        let mut aggregate_service = MockStatisticsAggregateService::new();
        aggregate_service
            .expect_refresh_statistics()
            .withf(move |id, workers| (*id == first || *id == second) && workers.is_none())
            .times(2)
            .returning(|id, _| Err(ExecutionException::ExecutionNotFound { execution_id: id }));
        let coordinator = StatisticsCoordinator::builder()
            .registry(registry)
            .aggregate_service(Arc::new(aggregate_service))
            .interval(Duration::from_secs(1))
            .build();

        coordinator.poll_all().await;
    }
}
