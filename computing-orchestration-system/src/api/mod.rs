use std::str::FromStr;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use domain_cluster::{exception::ClusterException, model::vo::ComputeUnitId};
use domain_execution::exception::ExecutionException;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod compute_unit;
pub mod execution;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Cluster(#[from] ClusterException),

    #[error(transparent)]
    Execution(#[from] ExecutionException),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Cluster(e) => match e {
                ClusterException::InvalidResources { .. } => "InvalidResources",
                ClusterException::ResourceConflict { .. } => "ResourceConflict",
                ClusterException::BackendUnavailable { .. } => "BackendUnavailable",
                ClusterException::PartialCreation { .. } => "PartialCreation",
                ClusterException::Backend { .. } => "BackendError",
            },
            ApiError::Execution(e) => match e {
                ExecutionException::ExecutionNotFound { .. } => "ExecutionNotFound",
                ExecutionException::DuplicateExecution { .. } => "DuplicateExecution",
                ExecutionException::DuplicateWorker { .. } => "DuplicateWorker",
                ExecutionException::DuplicateOperator { .. } => "DuplicateOperator",
                ExecutionException::UnknownWorker { .. } => "UnknownWorker",
                ExecutionException::WorkerUnreachable { .. } => "WorkerUnreachable",
                ExecutionException::PublishFailed { .. } => "PublishFailed",
                ExecutionException::InternalError(_) => "InternalError",
            },
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::NotFound(_) => "NotFound",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Cluster(e) => match e {
                ClusterException::InvalidResources { .. } => StatusCode::BAD_REQUEST,
                ClusterException::ResourceConflict { .. } => StatusCode::CONFLICT,
                ClusterException::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ClusterException::PartialCreation { .. } | ClusterException::Backend { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            },
            ApiError::Execution(e) => match e {
                ExecutionException::ExecutionNotFound { .. } => StatusCode::NOT_FOUND,
                ExecutionException::DuplicateExecution { .. } => StatusCode::CONFLICT,
                ExecutionException::DuplicateWorker { .. }
                | ExecutionException::DuplicateOperator { .. }
                | ExecutionException::UnknownWorker { .. } => StatusCode::BAD_REQUEST,
                ExecutionException::WorkerUnreachable { .. } => StatusCode::BAD_GATEWAY,
                ExecutionException::PublishFailed { .. }
                | ExecutionException::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(compute_unit::create_compute_unit)
        .service(compute_unit::delete_compute_unit)
        .service(compute_unit::get_compute_unit)
        .service(compute_unit::get_compute_unit_metrics)
        .service(compute_unit::get_compute_unit_limits)
        .service(execution::register_execution)
        .service(execution::dispose_execution)
        .service(execution::refresh_statistics)
        .service(execution::get_statistics);
}

fn extract_uuid(s: &str) -> ApiResult<Uuid> {
    Uuid::from_str(s).map_err(|e| {
        ApiError::InvalidRequest(format!(r#"error when parse uuid from "{s}": {e}"#))
    })
}

fn extract_unit_id(s: &str) -> ApiResult<ComputeUnitId> {
    ComputeUnitId::from_str(s).map_err(|e| {
        ApiError::InvalidRequest(format!(r#"error when parse compute unit id from "{s}": {e}"#))
    })
}
