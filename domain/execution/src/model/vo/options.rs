use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a round does with a worker whose branch failed or timed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the previous data of the worker, flag it stale and still publish.
    #[default]
    RetainStale,
    /// Cancel the other branches and publish nothing.
    AbortRound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Bound on one worker branch, both queries included. `None` waits indefinitely.
    #[serde(default = "AggregationOptions::default_worker_timeout_ms")]
    pub worker_timeout_ms: Option<u64>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl AggregationOptions {
    fn default_worker_timeout_ms() -> Option<u64> {
        Some(10_000)
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            worker_timeout_ms: Self::default_worker_timeout_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}
