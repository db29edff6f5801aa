use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{ResourceService, visibility_for};
use crate::middlewares::RequireJWT;
use crate::models::{ErrorCode, PaginationQuery};
use crate::models::{ApiResponse, resources::ResourceKind};
use crate::services::error_response;

pub async fn list_resources(
    service: &ResourceService,
    kind: ResourceKind,
    query: PaginationQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let principal = RequireJWT::extract_principal(request);
    let visibility = visibility_for(kind, &principal);
    debug!("Listing {} with visibility {:?}", kind, visibility);

    let storage = service.get_storage(request);
    match storage.list_resources(kind, &visibility, query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            page,
            format!("{kind} retrieved successfully"),
        ))),
        Err(e) => Ok(error_response(&e, ErrorCode::InternalServerError)),
    }
}
