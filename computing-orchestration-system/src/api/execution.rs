use actix_web::{delete, get, post, web, HttpResponse};
use domain_execution::model::vo::{PhysicalPlan, WorkerIdentity};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{extract_uuid, ApiError, ApiResult};
use crate::infrastructure::ServiceProvider;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredExecution {
    execution_id: Uuid,
    workers: Vec<WorkerIdentity>,
}

#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    /// Every worker of the execution when absent.
    #[serde(default)]
    pub workers: Option<Vec<WorkerIdentity>>,
}

#[post("executions/{id}")]
pub async fn register_execution(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
    plan: web::Json<PhysicalPlan>,
) -> ApiResult<HttpResponse> {
    let execution_id = extract_uuid(&id)?;
    let record = sp.worker_registry().register(execution_id, &plan)?;
    let workers = record.worker_identities();
    info!(%execution_id, workers = workers.len(), "Execution registered.");
    Ok(HttpResponse::Created().json(RegisteredExecution {
        execution_id,
        workers,
    }))
}

#[delete("executions/{id}")]
pub async fn dispose_execution(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let execution_id = extract_uuid(&id)?;
    let disposed = sp.worker_registry().dispose(execution_id);
    sp.snapshot_store().remove(execution_id);
    if !disposed {
        return Err(ApiError::NotFound(format!(
            "Execution {execution_id} is not registered."
        )));
    }
    info!(%execution_id, "Execution disposed.");
    Ok(HttpResponse::NoContent().finish())
}

#[post("executions/{id}/statistics")]
pub async fn refresh_statistics(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let execution_id = extract_uuid(&id)?;
    let workers = parse_refresh_request(&body)?.workers;
    let snapshot = sp
        .statistics_aggregate_service()
        .refresh_statistics(execution_id, workers)
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// An empty body refreshes every worker; anything else must be a valid [`RefreshRequest`].
fn parse_refresh_request(body: &[u8]) -> ApiResult<RefreshRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefreshRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidRequest(format!("malformed refresh request: {e}")))
}

#[get("executions/{id}/statistics")]
pub async fn get_statistics(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let execution_id = extract_uuid(&id)?;
    let snapshot = sp.snapshot_store().get(execution_id).ok_or_else(|| {
        ApiError::NotFound(format!("No statistics published for execution {execution_id}."))
    })?;
    Ok(HttpResponse::Ok().json(snapshot))
}
