/*!
 * 基于角色的访问控制中间件
 *
 * 此中间件必须在 RequireJWT 中间件之后使用，用于验证用户是否具有特定角色权限。
 * 数据范围由访问过滤负责，这里只判断能否调用接口（管理员专属的写操作与报表）。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::{RequireJWT, RequireRole};
 * use crate::models::users::entities::UserRole;
 *
 * App::new().service(
 *     web::scope("/api/v1/analytics")
 *         .wrap(RequireRole::new(&UserRole::Admin)) // 再验证角色
 *         .wrap(RequireJWT)                         // 先验证JWT
 *         .route("/top-students", web::get().to(top_students_handler)),
 * )
 * ```
 *
 * 或者验证多个角色：
 *
 * ```rust,ignore
 * .wrap(RequireRole::new_any(UserRole::admin_roles()))  // 任一角色即可
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::{
    middlewares::RequireJWT,
    models::{ErrorCode, users::entities::UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    required_roles: Rc<[UserRole]>,
    require_all: bool, // true表示需要所有角色，false表示任一角色即可
}

impl RequireRole {
    /// 创建需要特定角色的中间件
    pub fn new(role: &UserRole) -> Self {
        Self {
            required_roles: Rc::from([*role]),
            require_all: true,
        }
    }

    /// 创建需要任一角色的中间件
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            required_roles: roles.iter().map(|r| **r).collect(),
            require_all: false,
        }
    }

    fn permits(&self, role: UserRole) -> bool {
        if self.require_all {
            self.required_roles.iter().all(|r| *r == role)
        } else {
            self.required_roles.contains(&role)
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            rule: self.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    rule: RequireRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let rule = self.rule.clone();

        Box::pin(async move {
            let Some(user_id) = RequireJWT::extract_user_id(req.request()) else {
                info!(
                    "Role check failed: No user found in request. Make sure RequireJWT middleware is applied first."
                );
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            let user_role = RequireJWT::extract_user_role(req.request());
            if user_role.is_some_and(|role| rule.permits(role)) {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            info!(
                "Access denied for user {} (role: {:?}). Required roles: {:?}",
                user_id, user_role, rule.required_roles
            );
            Ok(req.into_response(
                create_error_response(
                    StatusCode::FORBIDDEN,
                    ErrorCode::Forbidden,
                    "Access denied.",
                )
                .map_into_right_body(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{User, UserStatus};
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, HttpMessage, HttpResponse, web};

    fn user(role: UserRole) -> User {
        User {
            id: 1,
            username: "someone".into(),
            email: "someone@uni.edu".into(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            first_name: String::new(),
            last_name: String::new(),
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_permits() {
        let admin_only = RequireRole::new(&UserRole::Admin);
        assert!(admin_only.permits(UserRole::Admin));
        assert!(!admin_only.permits(UserRole::Faculty));

        let staff = RequireRole::new_any(&[&UserRole::Admin, &UserRole::Faculty]);
        assert!(staff.permits(UserRole::Faculty));
        assert!(!staff.permits(UserRole::Student));
    }

    #[actix_web::test]
    async fn test_middleware_statuses() {
        let app = init_service(
            App::new().service(
                web::resource("/admin")
                    .wrap(RequireRole::new(&UserRole::Admin))
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        let anonymous = TestRequest::get().uri("/admin").to_request();
        let resp = call_service(&app, anonymous).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let student = TestRequest::get().uri("/admin").to_request();
        student.extensions_mut().insert(user(UserRole::Student));
        let resp = call_service(&app, student).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let admin = TestRequest::get().uri("/admin").to_request();
        admin.extensions_mut().insert(user(UserRole::Admin));
        let resp = call_service(&app, admin).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
