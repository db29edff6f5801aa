use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ResourceService, visibility_for};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, resources::ResourceKind};
use crate::services::error_response;

pub async fn get_resource(
    service: &ResourceService,
    kind: ResourceKind,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let principal = RequireJWT::extract_principal(request);
    let visibility = visibility_for(kind, &principal);

    let storage = service.get_storage(request);
    match storage.get_resource(kind, id, &visibility).await {
        Ok(Some(resource)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            resource,
            format!("{kind} retrieved successfully"),
        ))),
        // 不可见与不存在返回相同结果
        Ok(None) => {
            info!("{} {} not found or not visible to {:?}", kind, id, principal);
            Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ResourceNotFound,
                format!("{kind} {id} not found"),
            )))
        }
        Err(e) => Ok(error_response(&e, ErrorCode::InternalServerError)),
    }
}
