use serde::{Deserialize, Serialize};

use super::{OperatorId, RegionId, WorkerIdentity};

/// Worker layout of an execution, fixed when the execution starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalPlan {
    pub regions: Vec<RegionPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPlan {
    pub id: RegionId,
    pub operators: Vec<OperatorPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorPlan {
    pub id: OperatorId,
    pub workers: Vec<WorkerIdentity>,
}
