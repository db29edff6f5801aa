//! 路径参数提取器
//!
//! 非法 id 直接返回统一格式的 400 响应，处理函数拿到的一定是正整数。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_positive_i64(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req.match_info().get(name).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                format!("Invalid path parameter {name}: '{raw}'"),
            ));
            Err(InternalError::from_response(format!("invalid {name}"), response).into())
        }
    }
}

/// `{id}`
pub struct SafeIDI64(pub i64);

impl FromRequest for SafeIDI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse_positive_i64(req, "id").map(SafeIDI64))
    }
}

/// `{program_id}`
pub struct SafeProgramIdI64(pub i64);

impl FromRequest for SafeProgramIdI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse_positive_i64(req, "program_id").map(SafeProgramIdI64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_positive_ids() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "17")
            .to_http_parts();
        let SafeIDI64(id) = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id, 17);
    }

    #[actix_web::test]
    async fn test_rejects_invalid_ids() {
        for raw in ["0", "-3", "abc"] {
            let (req, mut payload) = TestRequest::default()
                .param("program_id", raw)
                .to_http_parts();
            assert!(
                SafeProgramIdI64::from_request(&req, &mut payload)
                    .await
                    .is_err()
            );
        }
    }
}
