use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use domain_execution::{
    exception::ExecutionException,
    model::{
        entity::WorkerRegistry,
        vo::{
            AggregatedSnapshot, AggregationOptions, FailurePolicy, GlobalProfile, OperatorId,
            OperatorPlan, PhysicalPlan, RegionPlan, TableProfile, TableProfileSlot,
            WorkerIdentity, WorkerState, WorkerStatistics, WorkerStatisticsReply,
        },
    },
    service::{SnapshotPublisher, StatisticsAggregateService, WorkerRpcService},
};
use service_execution::StatisticsAggregateServiceImpl;
use tokio::sync::Notify;
use uuid::Uuid;

type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Copy)]
enum Behavior {
    Reply(WorkerState),
    Fail,
    Hang,
}

struct ScriptedWorkers {
    behaviors: HashMap<WorkerIdentity, Behavior>,
    hang_on_profile: bool,
    events: EventLog,
    profile_started: Arc<Notify>,
}

struct CancelGuard(EventLog, WorkerIdentity);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.lock().unwrap().push(format!("profile {} cancelled", self.1));
    }
}

#[async_trait]
impl WorkerRpcService for ScriptedWorkers {
    async fn query_statistics(
        &self,
        identity: &WorkerIdentity,
    ) -> anyhow::Result<WorkerStatisticsReply> {
        self.events.lock().unwrap().push(format!("statistics {identity}"));
        match self.behaviors[identity] {
            Behavior::Reply(state) => Ok(WorkerStatisticsReply {
                state,
                statistics: WorkerStatistics {
                    input_tuple_count: 100,
                    output_tuple_count: 40,
                    ..Default::default()
                },
            }),
            Behavior::Fail => Err(anyhow::anyhow!("connection reset")),
            Behavior::Hang => std::future::pending().await,
        }
    }

    async fn query_table_profile(&self, identity: &WorkerIdentity) -> anyhow::Result<TableProfile> {
        if self.hang_on_profile {
            let _guard = CancelGuard(self.events.clone(), identity.clone());
            self.profile_started.notify_one();
            return std::future::pending().await;
        }
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        self.events.lock().unwrap().push(format!("profile {identity}"));
        Ok(TableProfile {
            global_profile: GlobalProfile {
                row_count: 40,
                ..Default::default()
            },
            column_profiles: vec![],
        })
    }
}

struct RecordingPublisher {
    events: EventLog,
    published: Mutex<Vec<AggregatedSnapshot>>,
}

#[async_trait]
impl SnapshotPublisher for RecordingPublisher {
    async fn publish(&self, snapshot: &AggregatedSnapshot) -> anyhow::Result<()> {
        self.events.lock().unwrap().push("publish".to_string());
        self.published.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

struct Fixture {
    registry: Arc<WorkerRegistry>,
    publisher: Arc<RecordingPublisher>,
    events: EventLog,
    profile_started: Arc<Notify>,
    service: StatisticsAggregateServiceImpl,
    execution_id: Uuid,
}

fn worker(name: &str) -> WorkerIdentity {
    WorkerIdentity::new(name)
}

fn fixture(
    behaviors: &[(&str, Behavior)],
    hang_on_profile: bool,
    options: AggregationOptions,
) -> Fixture {
    let events = EventLog::default();
    let profile_started = Arc::new(Notify::new());
    let registry = Arc::new(WorkerRegistry::new());
    let execution_id = Uuid::new_v4();
    let plan = PhysicalPlan {
        regions: vec![RegionPlan {
            id: 0,
            operators: vec![OperatorPlan {
                id: OperatorId::new("scan"),
                workers: behaviors.iter().map(|(name, _)| worker(name)).collect(),
            }],
        }],
    };
    registry.register(execution_id, &plan).unwrap();

    let workers = ScriptedWorkers {
        behaviors: behaviors
            .iter()
            .map(|(name, behavior)| (worker(name), *behavior))
            .collect(),
        hang_on_profile,
        events: events.clone(),
        profile_started: profile_started.clone(),
    };
    let publisher = Arc::new(RecordingPublisher {
        events: events.clone(),
        published: Mutex::new(vec![]),
    });
    let service = StatisticsAggregateServiceImpl::builder()
        .registry(registry.clone())
        .worker_rpc(Arc::new(workers))
        .publisher(publisher.clone())
        .options(options)
        .build();
    Fixture {
        registry,
        publisher,
        events,
        profile_started,
        service,
        execution_id,
    }
}

fn completed_and_running() -> [(&'static str, Behavior); 2] {
    [
        ("w1", Behavior::Reply(WorkerState::Completed)),
        ("w2", Behavior::Reply(WorkerState::Running)),
    ]
}

#[tokio::test]
async fn completed_worker_gets_profile_running_worker_gets_placeholder() {
    let f = fixture(&completed_and_running(), false, AggregationOptions::default());

    let snapshot = f.service.refresh_statistics(f.execution_id, None).await.unwrap();

    let execution = f.registry.get(f.execution_id).unwrap();
    let w1 = execution.record(&worker("w1")).unwrap();
    assert_eq!(w1.state, WorkerState::Completed);
    assert_eq!(
        w1.table_profile.profile().map(|p| p.global_profile.row_count),
        Some(40)
    );
    let w2 = execution.record(&worker("w2")).unwrap();
    assert_eq!(w2.state, WorkerState::Running);
    assert_eq!(w2.table_profile, TableProfileSlot::NotAvailable);

    let scan = &snapshot.operator_statistics[&OperatorId::new("scan")];
    assert_eq!(scan.state, WorkerState::Running);
    assert_eq!(scan.input_count, 200);
    assert!(snapshot.stale_workers.is_empty());
}

#[tokio::test]
async fn snapshot_is_published_once_after_every_branch() {
    let f = fixture(&completed_and_running(), false, AggregationOptions::default());

    f.service.refresh_statistics(f.execution_id, None).await.unwrap();

    let events = f.events.lock().unwrap().clone();
    assert_eq!(events.iter().filter(|e| *e == "publish").count(), 1);
    assert_eq!(events.last().map(String::as_str), Some("publish"));
    assert!(events.contains(&"profile w1".to_string()));
    assert_eq!(f.publisher.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn disjoint_concurrent_rounds_are_independent() {
    let f = fixture(&completed_and_running(), false, AggregationOptions::default());

    let (first, second) = tokio::join!(
        f.service.refresh_statistics(f.execution_id, Some(vec![worker("w1")])),
        f.service.refresh_statistics(f.execution_id, Some(vec![worker("w2")])),
    );
    first.unwrap();
    second.unwrap();

    let execution = f.registry.get(f.execution_id).unwrap();
    let w1 = execution.record(&worker("w1")).unwrap();
    let w2 = execution.record(&worker("w2")).unwrap();
    assert_eq!(w1.state, WorkerState::Completed);
    assert!(matches!(w1.table_profile, TableProfileSlot::Available(_)));
    assert_eq!(w2.state, WorkerState::Running);
    assert_eq!(w2.table_profile, TableProfileSlot::NotAvailable);
    assert_eq!(f.publisher.published.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn timed_out_worker_is_retained_as_stale() {
    let options = AggregationOptions {
        worker_timeout_ms: Some(50),
        failure_policy: FailurePolicy::RetainStale,
    };
    let f = fixture(
        &[
            ("w1", Behavior::Reply(WorkerState::Running)),
            ("w2", Behavior::Hang),
        ],
        false,
        options,
    );

    let snapshot = f.service.refresh_statistics(f.execution_id, None).await.unwrap();

    assert_eq!(snapshot.stale_workers.iter().collect::<Vec<_>>(), vec![&worker("w2")]);
    let w2 = f.registry.get(f.execution_id).unwrap().record(&worker("w2")).unwrap();
    assert!(w2.stale);
    assert_eq!(w2.table_profile, TableProfileSlot::Unchecked);
    assert_eq!(f.publisher.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn aborted_round_publishes_and_commits_nothing() {
    let options = AggregationOptions {
        worker_timeout_ms: Some(1_000),
        failure_policy: FailurePolicy::AbortRound,
    };
    let f = fixture(
        &[
            ("w1", Behavior::Reply(WorkerState::Completed)),
            ("w2", Behavior::Fail),
        ],
        false,
        options,
    );

    let err = f.service.refresh_statistics(f.execution_id, None).await.unwrap_err();

    assert!(
        matches!(err, ExecutionException::WorkerUnreachable { ref identity, .. } if identity == &worker("w2"))
    );
    assert!(f.publisher.published.lock().unwrap().is_empty());
    let execution = f.registry.get(f.execution_id).unwrap();
    assert!(execution
        .records()
        .iter()
        .all(|record| record.table_profile == TableProfileSlot::Unchecked && !record.stale));
}

#[tokio::test]
async fn dropping_the_round_cancels_profile_queries() {
    let options = AggregationOptions {
        worker_timeout_ms: None,
        failure_policy: FailurePolicy::RetainStale,
    };
    let f = fixture(&completed_and_running(), true, options);

    tokio::select! {
        _ = f.service.refresh_statistics(f.execution_id, None) => panic!("round cannot finish"),
        _ = f.profile_started.notified() => {}
    }

    let events = f.events.lock().unwrap().clone();
    assert!(events.contains(&"profile w1 cancelled".to_string()));
    assert!(!events.contains(&"publish".to_string()));
    let w1 = f.registry.get(f.execution_id).unwrap().record(&worker("w1")).unwrap();
    assert_eq!(w1.table_profile, TableProfileSlot::Unchecked);
}

#[tokio::test]
async fn filter_with_foreign_worker_is_rejected() {
    let f = fixture(&completed_and_running(), false, AggregationOptions::default());

    let err = f
        .service
        .refresh_statistics(f.execution_id, Some(vec![worker("w1"), worker("w9")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionException::UnknownWorker { .. }));
    assert!(f.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn later_round_overwrites_earlier_data() {
    let f = fixture(&completed_and_running(), false, AggregationOptions::default());
    f.service.refresh_statistics(f.execution_id, None).await.unwrap();
    f.service.refresh_statistics(f.execution_id, None).await.unwrap();

    let scan = &f.publisher.published.lock().unwrap()[1].operator_statistics
        [&OperatorId::new("scan")];
    assert_eq!(scan.input_count, 200);
    assert_eq!(scan.num_workers, 2);
}

#[tokio::test]
async fn waits_without_limit_when_no_timeout_is_set() {
    let options = AggregationOptions {
        worker_timeout_ms: None,
        failure_policy: FailurePolicy::RetainStale,
    };
    let f = fixture(&[("w1", Behavior::Hang)], false, options);

    let round = f.service.refresh_statistics(f.execution_id, None);
    assert!(tokio::time::timeout(Duration::from_millis(100), round).await.is_err());
    assert!(f.publisher.published.lock().unwrap().is_empty());
}
