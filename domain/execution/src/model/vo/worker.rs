use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Stable logical address of one worker process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerIdentity(String);

impl WorkerIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id of a physical operator within one execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(String);

impl OperatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type RegionId = u32;

/// Worker lifecycle state, carried on the wire as its integer code.
#[derive(
    FromPrimitive,
    ToPrimitive,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Default,
    Debug,
    Hash,
    PartialEq,
    Eq,
)]
pub enum WorkerState {
    #[default]
    Uninitialized = 0,
    Ready = 1,
    Running = 2,
    Paused = 3,
    /// Terminal. Only completed workers have a table profile.
    Completed = 4,
    Terminated = 5,
}

impl WorkerState {
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_i32(code)
    }

    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[cfg(test)]
mod tests {
    use num_traits::ToPrimitive;

    use super::*;

    #[test]
    fn wire_codes() {
        assert_eq!(WorkerState::from_code(4), Some(WorkerState::Completed));
        assert_eq!(WorkerState::from_code(2), Some(WorkerState::Running));
        assert_eq!(WorkerState::from_code(42), None);
        assert_eq!(WorkerState::Paused.to_i32(), Some(3));
    }
}
