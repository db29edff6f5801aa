use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ResourceService;
use crate::errors::UmsError;
use crate::models::{
    ApiResponse, ErrorCode,
    resources::{CreateResourceRequest, ResourceKind},
};
use crate::services::error_response;

pub async fn create_resource(
    service: &ResourceService,
    kind: ResourceKind,
    body: serde_json::Value,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let create_request = match CreateResourceRequest::parse(kind, body) {
        Ok(req) => req,
        Err(e) => return Ok(error_response(&e, ErrorCode::BadRequest)),
    };

    let storage = service.get_storage(request);
    match storage.create_resource(create_request).await {
        Ok(resource) => {
            info!("Created {} {}", kind, resource.id());
            Ok(HttpResponse::Created().json(ApiResponse::success(
                resource,
                format!("{kind} created successfully"),
            )))
        }
        // 引用了不存在的记录
        Err(UmsError::Validation(msg)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::ResourceReferenceInvalid, msg),
        )),
        Err(e) => Ok(error_response(&e, ErrorCode::ResourceCreationFailed)),
    }
}
