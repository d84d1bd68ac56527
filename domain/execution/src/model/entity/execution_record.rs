use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::WorkerExecutionRecord;
use crate::{
    exception::{ExecutionException, ExecutionResult},
    model::vo::{
        AggregatedSnapshot, OperatorId, OperatorStatistics, PhysicalPlan, RegionId, TableProfile,
        WorkerIdentity, WorkerObservation,
    },
};

/// Workers of one operator. Membership never changes after construction.
#[derive(Debug)]
pub struct OperatorExecutionRecord {
    id: OperatorId,
    workers: DashMap<WorkerIdentity, WorkerExecutionRecord>,
}

impl OperatorExecutionRecord {
    fn new(id: OperatorId, workers: &[WorkerIdentity]) -> Self {
        Self {
            id,
            workers: workers
                .iter()
                .map(|identity| (identity.clone(), WorkerExecutionRecord::new(identity.clone())))
                .collect(),
        }
    }

    pub fn id(&self) -> &OperatorId {
        &self.id
    }

    pub fn contains(&self, identity: &WorkerIdentity) -> bool {
        self.workers.contains_key(identity)
    }

    pub fn record(&self, identity: &WorkerIdentity) -> Option<WorkerExecutionRecord> {
        self.workers.get(identity).map(|record| record.value().clone())
    }

    /// Copies of all worker records ordered by identity.
    pub fn records(&self) -> Vec<WorkerExecutionRecord> {
        let mut records = self
            .workers
            .iter()
            .map(|record| record.value().clone())
            .collect::<Vec<_>>();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        records
    }

    pub fn statistics(&self) -> OperatorStatistics {
        let records = self.records();
        OperatorStatistics::aggregate(
            records.iter().map(|record| (record.state, &record.statistics)),
        )
    }

    pub fn profiles(&self) -> BTreeMap<WorkerIdentity, TableProfile> {
        self.workers
            .iter()
            .filter_map(|record| {
                record
                    .table_profile
                    .profile()
                    .map(|profile| (record.identity.clone(), profile.clone()))
            })
            .collect()
    }

    fn apply(&self, observation: WorkerObservation) -> bool {
        match self.workers.get_mut(&observation.identity) {
            Some(mut record) => {
                record.apply(observation);
                true
            }
            None => false,
        }
    }

    fn mark_stale(&self, identity: &WorkerIdentity) -> bool {
        match self.workers.get_mut(identity) {
            Some(mut record) => {
                record.mark_stale();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct RegionExecutionRecord {
    pub id: RegionId,
    pub operators: Vec<OperatorExecutionRecord>,
}

/// Root of the records of one running execution.
#[derive(Debug)]
pub struct WorkflowExecutionRecord {
    execution_id: Uuid,
    regions: Vec<RegionExecutionRecord>,
    /// Worker identities in plan order, with the (region, operator) position owning them.
    locations: Vec<(WorkerIdentity, usize, usize)>,
    index: HashMap<WorkerIdentity, usize>,
}

impl WorkflowExecutionRecord {
    pub fn from_plan(execution_id: Uuid, plan: &PhysicalPlan) -> ExecutionResult<Self> {
        let mut operator_ids = BTreeSet::new();
        let mut locations = vec![];
        let mut index = HashMap::new();
        let mut regions = vec![];
        for (region_pos, region) in plan.regions.iter().enumerate() {
            let mut operators = vec![];
            for (operator_pos, operator) in region.operators.iter().enumerate() {
                if !operator_ids.insert(operator.id.clone()) {
                    return Err(ExecutionException::DuplicateOperator {
                        execution_id,
                        operator_id: operator.id.clone(),
                    });
                }
                for identity in operator.workers.iter() {
                    if index.insert(identity.clone(), locations.len()).is_some() {
                        return Err(ExecutionException::DuplicateWorker {
                            execution_id,
                            identity: identity.clone(),
                        });
                    }
                    locations.push((identity.clone(), region_pos, operator_pos));
                }
                operators.push(OperatorExecutionRecord::new(
                    operator.id.clone(),
                    &operator.workers,
                ));
            }
            regions.push(RegionExecutionRecord {
                id: region.id,
                operators,
            });
        }
        Ok(Self {
            execution_id,
            regions,
            locations,
            index,
        })
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn regions(&self) -> &[RegionExecutionRecord] {
        &self.regions
    }

    pub fn operators(&self) -> impl Iterator<Item = &OperatorExecutionRecord> {
        self.regions.iter().flat_map(|region| region.operators.iter())
    }

    /// Every registered worker in plan order.
    pub fn worker_identities(&self) -> Vec<WorkerIdentity> {
        self.locations.iter().map(|(identity, ..)| identity.clone()).collect()
    }

    pub fn contains(&self, identity: &WorkerIdentity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn record(&self, identity: &WorkerIdentity) -> Option<WorkerExecutionRecord> {
        self.operator_of(identity)?.record(identity)
    }

    pub fn records(&self) -> Vec<WorkerExecutionRecord> {
        self.operators().flat_map(|operator| operator.records()).collect()
    }

    pub fn apply(&self, observation: WorkerObservation) -> ExecutionResult<()> {
        let identity = observation.identity.clone();
        match self.operator_of(&identity) {
            Some(operator) if operator.apply(observation) => Ok(()),
            _ => Err(self.unknown(identity)),
        }
    }

    pub fn mark_stale(&self, identity: &WorkerIdentity) -> ExecutionResult<()> {
        match self.operator_of(identity) {
            Some(operator) if operator.mark_stale(identity) => Ok(()),
            _ => Err(self.unknown(identity.clone())),
        }
    }

    /// Aggregates the current records of every operator.
    pub fn snapshot(&self, published_at: DateTime<Utc>) -> AggregatedSnapshot {
        let mut operator_statistics = BTreeMap::new();
        let mut operator_profiles = BTreeMap::new();
        let mut stale_workers = BTreeSet::new();
        for operator in self.operators() {
            operator_statistics.insert(operator.id().clone(), operator.statistics());
            let profiles = operator.profiles();
            if !profiles.is_empty() {
                operator_profiles.insert(operator.id().clone(), profiles);
            }
            stale_workers.extend(
                operator
                    .records()
                    .into_iter()
                    .filter(|record| record.stale)
                    .map(|record| record.identity),
            );
        }
        AggregatedSnapshot {
            execution_id: self.execution_id,
            published_at,
            operator_statistics,
            operator_profiles,
            stale_workers,
        }
    }

    fn operator_of(&self, identity: &WorkerIdentity) -> Option<&OperatorExecutionRecord> {
        let (_, region, operator) = self.locations.get(*self.index.get(identity)?)?;
        self.regions.get(*region)?.operators.get(*operator)
    }

    fn unknown(&self, identity: WorkerIdentity) -> ExecutionException {
        ExecutionException::UnknownWorker {
            execution_id: self.execution_id,
            identity,
        }
    }
}
