use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    OperatorId, OperatorStatistics, TableProfile, TableProfileSlot, WorkerIdentity, WorkerState,
    WorkerStatistics,
};

/// What one successful branch of a round learned about its worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerObservation {
    pub identity: WorkerIdentity,
    pub state: WorkerState,
    pub statistics: WorkerStatistics,
    /// Never [`TableProfileSlot::Unchecked`].
    pub table_profile: TableProfileSlot,
    pub observed_at: DateTime<Utc>,
}

/// Consistent view of an execution published once per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSnapshot {
    pub execution_id: Uuid,
    pub published_at: DateTime<Utc>,
    pub operator_statistics: BTreeMap<OperatorId, OperatorStatistics>,
    /// Profiles of completed workers, grouped by operator.
    pub operator_profiles: BTreeMap<OperatorId, BTreeMap<WorkerIdentity, TableProfile>>,
    /// Workers whose data is older than this round.
    pub stale_workers: BTreeSet<WorkerIdentity>,
}
