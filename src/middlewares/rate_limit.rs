/*!
 * 速率限制中间件
 *
 * 固定窗口计数，额度由 [`ThrottlePolicy`] 按请求方决定。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::{RateLimit, RequireJWT};
 *
 * App::new()
 *     .service(
 *         web::scope("/api/v1/auth")
 *             .wrap(RateLimit::login())  // 5次/分钟/IP
 *             .route("/login", web::post().to(login_handler))
 *     )
 *     .service(
 *         web::scope("/api/v1/courses")
 *             .wrap(RateLimit::per_role()) // 按角色取额度，需要先解析身份
 *             .wrap(RequireJWT)
 *             .route("", web::get().to(list_handler))
 *     )
 * ```
 *
 * ## 限制规则
 *
 * - 已认证请求以用户 ID 为键，否则以客户端 IP 为键
 * - 超过限制返回 429 Too Many Requests，`Retry-After` 为窗口剩余秒数
 * - 策略返回 `None` 时不限流
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::access::Principal;
use crate::config::{AppConfig, ThrottleConfig};
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};

/// 全局速率限制缓存
/// 键: 前缀:身份，值: (窗口内计数, 窗口开始时间)
static RATE_LIMIT_CACHE: Lazy<Cache<String, (u32, Instant)>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

/// 一个窗口内的额度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// 按请求方给出额度
pub trait ThrottlePolicy: Send + Sync {
    fn limit(&self, principal: Option<&Principal>) -> Option<Throttle>;
}

/// 对所有请求方使用同一额度
#[derive(Debug, Clone, Copy)]
pub struct FixedThrottle(pub Throttle);

impl ThrottlePolicy for FixedThrottle {
    fn limit(&self, _principal: Option<&Principal>) -> Option<Throttle> {
        Some(self.0)
    }
}

/// 管理员、教师、学生各自一档；其他角色和匿名请求不限流
#[derive(Debug, Clone, Copy)]
pub struct RoleThrottle {
    pub admin: u32,
    pub faculty: u32,
    pub student: u32,
    pub window_secs: u64,
}

impl RoleThrottle {
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self {
            admin: config.admin,
            faculty: config.faculty,
            student: config.student,
            window_secs: config.window_secs,
        }
    }
}

impl ThrottlePolicy for RoleThrottle {
    fn limit(&self, principal: Option<&Principal>) -> Option<Throttle> {
        let max_requests = match principal?.role() {
            UserRole::Admin => self.admin,
            UserRole::Faculty => self.faculty,
            UserRole::Student => self.student,
            UserRole::Other => return None,
        };
        Some(Throttle {
            max_requests,
            window_secs: self.window_secs,
        })
    }
}

/// 速率限制配置
#[derive(Clone)]
pub struct RateLimit {
    policy: Arc<dyn ThrottlePolicy>,
    /// 限制键前缀（用于区分不同端点）
    key_prefix: String,
}

impl RateLimit {
    pub fn new(policy: impl ThrottlePolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
            key_prefix: String::new(),
        }
    }

    /// 设置限制键前缀
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录端点限制：默认 5次/分钟/IP
    pub fn login() -> Self {
        let config = &AppConfig::get().throttle;
        Self::new(FixedThrottle(Throttle {
            max_requests: config.login,
            window_secs: config.window_secs,
        }))
        .with_prefix("login")
    }

    /// 已认证 API，按角色取额度
    pub fn per_role() -> Self {
        Self::new(RoleThrottle::from_config(&AppConfig::get().throttle)).with_prefix("api")
    }
}

/// 从请求中提取客户端 IP
///
/// 部署在反向代理后面时，需要代理正确设置 X-Forwarded-For / X-Real-IP
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    // 只取第一个 IP（最接近客户端的）
    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP")
        && let Ok(ip) = real_ip.to_str()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    use std::net::IpAddr;
    ip.parse::<IpAddr>().is_ok()
}

/// 创建速率限制错误响应
fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
}

/// 窗口检查结果
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Allowed { remaining: u32, reset: u64 },
    Limited { retry_after: u64 },
}

async fn check_window(key: &str, throttle: Throttle) -> Decision {
    let now = Instant::now();
    let window = Duration::from_secs(throttle.window_secs);

    let (count, started) = match RATE_LIMIT_CACHE.get(key).await {
        Some((count, started)) if now.duration_since(started) < window => (count, started),
        // 窗口已过或首次访问
        _ => (0, now),
    };
    let reset = (window
        .saturating_sub(now.duration_since(started))
        .as_secs_f64()
        .ceil() as u64)
        .max(1);

    if count >= throttle.max_requests {
        return Decision::Limited { retry_after: reset };
    }

    RATE_LIMIT_CACHE
        .insert(key.to_string(), (count + 1, started))
        .await;
    Decision::Allowed {
        remaining: throttle.max_requests.saturating_sub(count + 1),
        reset,
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            policy: self.policy.clone(),
            key_prefix: self.key_prefix.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    policy: Arc<dyn ThrottlePolicy>,
    key_prefix: String,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let policy = self.policy.clone();
        let key_prefix = self.key_prefix.clone();

        Box::pin(async move {
            let principal = req.extensions().get::<Principal>().copied();
            let Some(throttle) = policy.limit(principal.as_ref()) else {
                return Ok(srv.call(req).await?.map_into_left_body());
            };

            // 构建限制键
            let user_id = req.extensions().get::<User>().map(|user| user.id);
            let identifier = user_id
                .map(|id| format!("user:{id}"))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));
            let cache_key = if key_prefix.is_empty() {
                identifier
            } else {
                format!("{key_prefix}:{identifier}")
            };

            match check_window(&cache_key, throttle).await {
                Decision::Limited { retry_after } => {
                    warn!(
                        "Rate limit exceeded for key: {} (limit: {}/{}s)",
                        cache_key, throttle.max_requests, throttle.window_secs
                    );
                    Ok(req.into_response(
                        create_rate_limit_response(retry_after).map_into_right_body(),
                    ))
                }
                Decision::Allowed { remaining, reset } => {
                    req.extensions_mut().insert(RateLimitInfo {
                        remaining,
                        limit: throttle.max_requests,
                        reset,
                    });
                    let mut res = srv.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(remaining),
                    );
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}

/// 速率限制信息，放在请求扩展中
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    pub reset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{FacultyProfile, StudentProfile};
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, web};

    fn config() -> ThrottleConfig {
        ThrottleConfig {
            window_secs: 60,
            admin: 1000,
            faculty: 100,
            student: 50,
            login: 5,
        }
    }

    #[test]
    fn test_role_throttle_picks_quota_by_role() {
        let policy = RoleThrottle::from_config(&config());
        let faculty = Principal::Faculty(FacultyProfile {
            faculty_id: 1,
            user_id: 1,
            department_id: None,
        });
        let student = Principal::Student(StudentProfile {
            student_id: 1,
            user_id: 2,
            department_id: None,
            program_id: None,
        });

        assert_eq!(policy.limit(Some(&Principal::Admin)).map(|t| t.max_requests), Some(1000));
        assert_eq!(policy.limit(Some(&faculty)).map(|t| t.max_requests), Some(100));
        assert_eq!(policy.limit(Some(&student)).map(|t| t.max_requests), Some(50));
        // 没有档案的学生仍按学生限流
        assert_eq!(
            policy
                .limit(Some(&Principal::Unlinked {
                    role: UserRole::Student
                }))
                .map(|t| t.max_requests),
            Some(50)
        );
        assert_eq!(policy.limit(Some(&Principal::Other)), None);
        assert_eq!(policy.limit(None), None);
    }

    #[tokio::test]
    async fn test_fixed_window_counts_down() {
        let throttle = Throttle {
            max_requests: 2,
            window_secs: 60,
        };
        let key = "test:window:counts";
        assert_eq!(
            check_window(key, throttle).await,
            Decision::Allowed {
                remaining: 1,
                reset: 60
            }
        );
        assert!(matches!(
            check_window(key, throttle).await,
            Decision::Allowed { remaining: 0, .. }
        ));
        assert!(matches!(
            check_window(key, throttle).await,
            Decision::Limited { retry_after } if retry_after <= 60
        ));
    }

    #[actix_web::test]
    async fn test_third_request_gets_429() {
        let limit = RateLimit::new(FixedThrottle(Throttle {
            max_requests: 2,
            window_secs: 60,
        }))
        .with_prefix("test-429");
        let app = init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(limit)
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        for expected_remaining in ["1", "0"] {
            let req = TestRequest::get().uri("/ping").to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers().get("X-RateLimit-Remaining").unwrap(),
                expected_remaining
            );
        }

        let req = TestRequest::get().uri("/ping").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = resp
            .headers()
            .get("Retry-After")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
    }

    #[actix_web::test]
    async fn test_unthrottled_principal_passes() {
        let app = init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(RateLimit::new(RoleThrottle::from_config(&config())).with_prefix("test-other"))
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        for _ in 0..3 {
            let req = TestRequest::get().uri("/ping").to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().get("X-RateLimit-Remaining").is_none());
        }
    }
}
