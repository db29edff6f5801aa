pub mod analytics;
pub mod auth;
pub mod resources;
pub mod users;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use resources::ResourceService;
pub use users::UserService;

use actix_web::HttpResponse;
use tracing::error;

use crate::errors::UmsError;
use crate::models::{ApiResponse, ErrorCode};

/// 把业务错误转换为统一响应；服务端故障使用 `fallback` 错误码
pub(crate) fn error_response(err: &UmsError, fallback: ErrorCode) -> HttpResponse {
    match err {
        UmsError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg.as_str())),
        UmsError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::NotFound, msg.as_str())),
        UmsError::Conflict(msg) => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::Conflict, msg.as_str())),
        UmsError::Authentication(msg) => HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::AuthFailed, msg.as_str())),
        UmsError::Authorization(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::Forbidden, msg.as_str())),
        _ => {
            error!("{}", err.format_simple());
            HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(fallback, err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (UmsError::validation("bad"), StatusCode::BAD_REQUEST),
            (UmsError::not_found("gone"), StatusCode::NOT_FOUND),
            (UmsError::conflict("dup"), StatusCode::CONFLICT),
            (UmsError::authentication("who"), StatusCode::UNAUTHORIZED),
            (UmsError::authorization("no"), StatusCode::FORBIDDEN),
            (UmsError::database_operation("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(
                error_response(&err, ErrorCode::InternalServerError).status(),
                status
            );
        }
    }
}
