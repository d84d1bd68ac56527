use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use super::WorkflowExecutionRecord;
use crate::{
    exception::{ExecutionException, ExecutionResult},
    model::vo::PhysicalPlan,
};

/// Records of every running execution, keyed by execution id.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    executions: DashMap<Uuid, Arc<WorkflowExecutionRecord>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        execution_id: Uuid,
        plan: &PhysicalPlan,
    ) -> ExecutionResult<Arc<WorkflowExecutionRecord>> {
        let record = Arc::new(WorkflowExecutionRecord::from_plan(execution_id, plan)?);
        match self.executions.entry(execution_id) {
            Entry::Occupied(_) => Err(ExecutionException::DuplicateExecution { execution_id }),
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    pub fn get(&self, execution_id: Uuid) -> ExecutionResult<Arc<WorkflowExecutionRecord>> {
        self.executions
            .get(&execution_id)
            .map(|record| record.value().clone())
            .ok_or(ExecutionException::ExecutionNotFound { execution_id })
    }

    /// Drops the records of an execution. Returns whether it was registered.
    pub fn dispose(&self, execution_id: Uuid) -> bool {
        self.executions.remove(&execution_id).is_some()
    }

    pub fn execution_ids(&self) -> Vec<Uuid> {
        let mut ids = self.executions.iter().map(|entry| *entry.key()).collect::<Vec<_>>();
        ids.sort();
        ids
    }
}
