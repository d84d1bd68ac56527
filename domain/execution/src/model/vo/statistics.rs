use serde::{Deserialize, Serialize};

use super::WorkerState;

/// Counters reported by one worker. Times are nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerStatistics {
    pub input_tuple_count: u64,
    pub output_tuple_count: u64,
    pub data_processing_time: u64,
    pub control_processing_time: u64,
    pub idle_time: u64,
}

/// Reply to the state and statistics query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatisticsReply {
    pub state: WorkerState,
    pub statistics: WorkerStatistics,
}

/// Statistics of one operator, summed over its workers. Sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStatistics {
    pub state: WorkerState,
    pub input_count: u64,
    pub output_count: u64,
    pub num_workers: u64,
    pub data_processing_time: u64,
    pub control_processing_time: u64,
    pub idle_time: u64,
}

impl OperatorStatistics {
    pub fn aggregate<'a>(
        workers: impl IntoIterator<Item = (WorkerState, &'a WorkerStatistics)>,
    ) -> Self {
        let mut states = vec![];
        let mut aggregated = Self::default();
        for (state, statistics) in workers {
            states.push(state);
            aggregated.input_count = aggregated
                .input_count
                .saturating_add(statistics.input_tuple_count);
            aggregated.output_count = aggregated
                .output_count
                .saturating_add(statistics.output_tuple_count);
            aggregated.data_processing_time = aggregated
                .data_processing_time
                .saturating_add(statistics.data_processing_time);
            aggregated.control_processing_time = aggregated
                .control_processing_time
                .saturating_add(statistics.control_processing_time);
            aggregated.idle_time = aggregated.idle_time.saturating_add(statistics.idle_time);
        }
        aggregated.num_workers = states.len() as u64;
        aggregated.state = aggregate_state(&states);
        aggregated
    }
}

/// State of an operator as seen from the states of its workers.
pub fn aggregate_state(states: &[WorkerState]) -> WorkerState {
    if states.is_empty() {
        return WorkerState::Uninitialized;
    }
    if states.iter().all(|state| state.is_completed()) {
        return WorkerState::Completed;
    }
    if states.contains(&WorkerState::Running) {
        return WorkerState::Running;
    }
    let mut unfinished = states.iter().filter(|state| !state.is_completed());
    let first = unfinished.next().copied().unwrap_or_default();
    if unfinished.all(|state| *state == first) {
        return first;
    }
    if states.contains(&WorkerState::Paused) {
        WorkerState::Paused
    } else {
        WorkerState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkerState::*;

    #[test]
    fn operator_state() {
        assert_eq!(aggregate_state(&[]), Uninitialized);
        assert_eq!(aggregate_state(&[Completed, Completed]), Completed);
        assert_eq!(aggregate_state(&[Completed, Running, Paused]), Running);
        assert_eq!(aggregate_state(&[Completed, Paused, Paused]), Paused);
        assert_eq!(aggregate_state(&[Ready, Paused, Uninitialized]), Paused);
        assert_eq!(aggregate_state(&[Ready, Uninitialized]), Ready);
    }

    #[test]
    fn sums_counters() {
        let a = WorkerStatistics {
            input_tuple_count: 10,
            output_tuple_count: 5,
            data_processing_time: 100,
            control_processing_time: 7,
            idle_time: 3,
        };
        let b = WorkerStatistics {
            input_tuple_count: 1,
            output_tuple_count: 2,
            ..Default::default()
        };
        let operator = OperatorStatistics::aggregate([(Completed, &a), (Running, &b)]);
        assert_eq!(operator.state, Running);
        assert_eq!(operator.num_workers, 2);
        assert_eq!(operator.input_count, 11);
        assert_eq!(operator.output_count, 7);
        assert_eq!(operator.data_processing_time, 100);
    }

    #[test]
    fn saturates_on_huge_counters() {
        let huge = WorkerStatistics {
            input_tuple_count: u64::MAX / 2 + 1,
            idle_time: u64::MAX,
            ..Default::default()
        };
        let operator = OperatorStatistics::aggregate([(Running, &huge), (Running, &huge)]);
        assert_eq!(operator.input_count, u64::MAX);
        assert_eq!(operator.idle_time, u64::MAX);
        assert_eq!(operator.output_count, 0);
        assert_eq!(operator.num_workers, 2);
    }
}
