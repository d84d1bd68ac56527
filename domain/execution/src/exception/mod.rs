use thiserror::Error;
use uuid::Uuid;

use crate::model::vo::{OperatorId, WorkerIdentity};

pub type ExecutionResult<T> = Result<T, ExecutionException>;

#[derive(Error, Debug)]
pub enum ExecutionException {
    #[error("There is no execution with id: {execution_id}.")]
    ExecutionNotFound { execution_id: Uuid },

    #[error("Execution {execution_id} is already registered.")]
    DuplicateExecution { execution_id: Uuid },

    #[error("Worker {identity} appears more than once in execution {execution_id}.")]
    DuplicateWorker {
        execution_id: Uuid,
        identity: WorkerIdentity,
    },

    #[error("Operator {operator_id} appears more than once in execution {execution_id}.")]
    DuplicateOperator {
        execution_id: Uuid,
        operator_id: OperatorId,
    },

    #[error("Worker {identity} does not belong to execution {execution_id}.")]
    UnknownWorker {
        execution_id: Uuid,
        identity: WorkerIdentity,
    },

    #[error("Worker {identity} is unreachable: {source}")]
    WorkerUnreachable {
        identity: WorkerIdentity,
        source: anyhow::Error,
    },

    #[error("Unable to publish the snapshot of execution {execution_id}: {source}")]
    PublishFailed {
        execution_id: Uuid,
        source: anyhow::Error,
    },

    #[error(transparent)]
    InternalError(#[from] anyhow::Error),
}
