/*!
 * JWT 认证中间件
 *
 * 验证 access token，并把请求方解析为 [`Principal`]，供访问过滤使用。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::RequireJWT;
 *
 * App::new().service(
 *     web::scope("/api/v1/courses")
 *         .wrap(RequireJWT)
 *         .route("", web::get().to(list_handler)),
 * )
 * ```
 *
 * 在处理程序中：
 *
 * ```rust,ignore
 * async fn list_handler(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let principal = RequireJWT::extract_principal(&req);
 *     // ...
 * }
 * ```
 *
 * ## 认证流程
 *
 * 1. 客户端在请求头中包含 `Authorization: Bearer <JWT_TOKEN>`
 * 2. 校验签名、过期时间与 token 类型
 * 3. 先查缓存 `auth:{token}` 中的用户，未命中时从存储加载并写回缓存
 * 4. 每次请求按用户角色重新加载档案得到 Principal，档案增删即时生效
 * 5. 用户与 Principal 放入请求扩展；任一步失败返回 401
 */

use crate::access::Principal;
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole, UserStatus};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

struct Authenticated {
    user: User,
    principal: Principal,
}

fn auth_cache_key(token: &str) -> String {
    format!("auth:{token}")
}

// 辅助函数：提取并验证 JWT access token，解析出请求方
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<Authenticated, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone();

    let cached = match &cache {
        Some(cache) => cache.get_json::<User>(&auth_cache_key(token)).await,
        None => None,
    };

    let user = match cached {
        Some(user) => user,
        None => {
            let user_id = claims
                .user_id()
                .ok_or_else(|| "Invalid user ID in JWT".to_string())?;

            let user = storage
                .get_user_by_id(user_id)
                .await
                .map_err(|_| "Failed to retrieve user from storage".to_string())?
                .ok_or_else(|| "User not found".to_string())?;

            if user.status != UserStatus::Active {
                return Err("User is not active".to_string());
            }

            if let Some(cache) = &cache {
                cache
                    .insert_json(
                        auth_cache_key(token),
                        &user,
                        AppConfig::get().cache.default_ttl,
                    )
                    .await;
            }
            user
        }
    };

    // 档案不进缓存
    let principal = Principal::load(storage.as_ref(), &user)
        .await
        .map_err(|_| "Failed to resolve user profile".to_string())?;

    Ok(Authenticated { user, principal })
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(Authenticated { user, principal }) => {
                    debug!(
                        "JWT authentication successful for ID: {} as {:?}",
                        user.id, principal
                    );
                    req.extensions_mut().insert(user);
                    req.extensions_mut().insert(principal);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取用户信息
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }

    /// 请求方身份；没有经过本中间件时按无权限处理
    pub fn extract_principal(req: &HttpRequest) -> Principal {
        req.extensions()
            .get::<Principal>()
            .copied()
            .unwrap_or(Principal::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::MokaCacheWrapper;
    use crate::models::resources::{CreateResourceRequest, ResourceKind};
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::sea_orm_storage::test_support::memory_storage;
    use actix_web::test::{TestRequest, call_and_read_body_json, call_service, init_service};
    use actix_web::{App, HttpResponse};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().json(RequireJWT::extract_principal(&req))
    }

    async fn app_state() -> (Arc<dyn Storage>, Arc<dyn ObjectCache>) {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(AppConfig::get()));
        (storage, cache)
    }

    async fn create_user(storage: &Arc<dyn Storage>, username: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@uni.edu"),
                password: "hashed".to_string(),
                role,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn test_missing_or_bad_token_is_rejected() {
        let (storage, cache) = app_state().await;
        let app = init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .service(web::resource("/me").wrap(RequireJWT).to(whoami)),
        )
        .await;

        let req = TestRequest::get().uri("/me").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_token_resolves_principal() {
        let (storage, cache) = app_state().await;
        let admin = create_user(&storage, "root", UserRole::Admin).await;
        let stray = create_user(&storage, "stray", UserRole::Student).await;

        let app = init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache.clone()))
                .service(web::resource("/me").wrap(RequireJWT).to(whoami)),
        )
        .await;

        let token = JwtUtils::generate_access_token(admin.id, "admin").unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = call_and_read_body_json(&app, req).await;
        assert_eq!(body["kind"], "admin");
        assert!(
            cache
                .get_json::<User>(&auth_cache_key(&token))
                .await
                .is_some()
        );

        // 学生角色但没有学生档案
        let token = JwtUtils::generate_access_token(stray.id, "student").unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = call_and_read_body_json(&app, req).await;
        assert_eq!(body["kind"], "unlinked");
        assert_eq!(body["role"], "student");
    }

    #[actix_web::test]
    async fn test_linked_profile_applies_to_cached_token() {
        let (storage, cache) = app_state().await;
        let student = create_user(&storage, "late_link", UserRole::Student).await;

        let app = init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(cache.clone()))
                .service(web::resource("/me").wrap(RequireJWT).to(whoami)),
        )
        .await;

        let token = JwtUtils::generate_access_token(student.id, "student").unwrap();
        let call = || {
            TestRequest::get()
                .uri("/me")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request()
        };

        let body: serde_json::Value = call_and_read_body_json(&app, call()).await;
        assert_eq!(body["kind"], "unlinked");
        assert!(cache.get_json::<User>(&auth_cache_key(&token)).await.is_some());

        // 用户已在缓存中，关联档案后同一 token 立即得到学生身份
        let req = CreateResourceRequest::parse(
            ResourceKind::Students,
            serde_json::json!({"user_id": student.id, "enrollment_date": "2024-09-01"}),
        )
        .unwrap();
        let profile = storage.create_resource(req).await.unwrap();

        let body: serde_json::Value = call_and_read_body_json(&app, call()).await;
        assert_eq!(body["kind"], "student");
        assert_eq!(body["student_id"], profile.id());

        storage
            .delete_resource(ResourceKind::Students, profile.id())
            .await
            .unwrap();
        let body: serde_json::Value = call_and_read_body_json(&app, call()).await;
        assert_eq!(body["kind"], "unlinked");
    }

    #[test]
    fn test_extract_principal_defaults_to_other() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(RequireJWT::extract_principal(&req), Principal::Other);
    }
}
