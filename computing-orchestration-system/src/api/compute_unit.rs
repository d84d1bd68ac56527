use actix_web::{delete, get, post, web, HttpResponse};
use domain_cluster::model::vo::ComputeUnitResources;

use super::{extract_unit_id, ApiError, ApiResult};
use crate::infrastructure::ServiceProvider;

#[post("compute-units/{id}")]
pub async fn create_compute_unit(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
    resources: web::Json<ComputeUnitResources>,
) -> ApiResult<HttpResponse> {
    let unit_id = extract_unit_id(&id)?;
    let handle = sp.cluster_lifecycle_service().create_cluster(unit_id, &resources).await?;
    Ok(HttpResponse::Created().json(handle))
}

#[delete("compute-units/{id}")]
pub async fn delete_compute_unit(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let unit_id = extract_unit_id(&id)?;
    sp.cluster_lifecycle_service().delete_cluster(unit_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("compute-units/{id}")]
pub async fn get_compute_unit(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let unit_id = extract_unit_id(&id)?;
    let status = sp
        .cluster_lifecycle_service()
        .get_cluster_status(unit_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Compute unit {unit_id} does not exist.")))?;
    Ok(HttpResponse::Ok().json(status))
}

#[get("compute-units/{id}/metrics")]
pub async fn get_compute_unit_metrics(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let unit_id = extract_unit_id(&id)?;
    let metrics = sp.cluster_lifecycle_service().get_pod_metrics(unit_id).await;
    Ok(HttpResponse::Ok().json(metrics))
}

#[get("compute-units/{id}/limits")]
pub async fn get_compute_unit_limits(
    sp: web::Data<ServiceProvider>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let unit_id = extract_unit_id(&id)?;
    let limits = sp.cluster_lifecycle_service().get_resource_limits(unit_id).await;
    Ok(HttpResponse::Ok().json(limits))
}
