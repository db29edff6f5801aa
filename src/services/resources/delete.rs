use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ResourceService;
use crate::models::{ApiResponse, ErrorCode, resources::ResourceKind};
use crate::services::error_response;

pub async fn delete_resource(
    service: &ResourceService,
    kind: ResourceKind,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    match storage.delete_resource(kind, id).await {
        Ok(true) => {
            info!("Deleted {} {}", kind, id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(format!(
                "{kind} deleted successfully"
            ))))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ResourceNotFound,
            format!("{kind} {id} not found"),
        ))),
        Err(e) => Ok(error_response(&e, ErrorCode::ResourceDeleteFailed)),
    }
}
