use chrono::{DateTime, Utc};

use crate::model::vo::{
    TableProfileSlot, WorkerIdentity, WorkerObservation, WorkerState, WorkerStatistics,
};

/// Latest known data of one worker of an execution.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerExecutionRecord {
    pub identity: WorkerIdentity,
    pub state: WorkerState,
    pub statistics: WorkerStatistics,
    pub table_profile: TableProfileSlot,
    /// Set when the last round could not reach the worker.
    pub stale: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl WorkerExecutionRecord {
    pub fn new(identity: WorkerIdentity) -> Self {
        Self {
            identity,
            state: WorkerState::default(),
            statistics: WorkerStatistics::default(),
            table_profile: TableProfileSlot::default(),
            stale: false,
            last_refreshed: None,
        }
    }

    /// Replaces every observed field, nothing of the previous round survives.
    pub fn apply(&mut self, observation: WorkerObservation) {
        self.state = observation.state;
        self.statistics = observation.statistics;
        self.table_profile = observation.table_profile;
        self.stale = false;
        self.last_refreshed = Some(observation.observed_at);
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vo::TableProfile;

    #[test]
    fn apply_overwrites_and_clears_stale() {
        let mut record = WorkerExecutionRecord::new(WorkerIdentity::new("w1"));
        record.apply(WorkerObservation {
            identity: record.identity.clone(),
            state: WorkerState::Completed,
            statistics: WorkerStatistics {
                input_tuple_count: 3,
                ..Default::default()
            },
            table_profile: TableProfileSlot::Available(TableProfile::default()),
            observed_at: Utc::now(),
        });
        record.mark_stale();
        assert!(record.stale);

        record.apply(WorkerObservation {
            identity: record.identity.clone(),
            state: WorkerState::Running,
            statistics: WorkerStatistics::default(),
            table_profile: TableProfileSlot::NotAvailable,
            observed_at: Utc::now(),
        });
        assert!(!record.stale);
        assert_eq!(record.state, WorkerState::Running);
        assert_eq!(record.statistics.input_tuple_count, 0);
        assert_eq!(record.table_profile, TableProfileSlot::NotAvailable);
    }
}
