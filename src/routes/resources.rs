use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::PaginationQuery;
use crate::models::resources::ResourceKind;
use crate::models::users::entities::UserRole;
use crate::services::ResourceService;
use crate::utils::SafeIDI64;

// 懒加载的全局 ResourceService 实例
static RESOURCE_SERVICE: Lazy<ResourceService> = Lazy::new(ResourceService::new_lazy);

pub async fn list_resources(
    req: HttpRequest,
    kind: web::Data<ResourceKind>,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE
        .list(**kind, query.into_inner(), &req)
        .await
}

pub async fn get_resource(
    req: HttpRequest,
    kind: web::Data<ResourceKind>,
    id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE.get(**kind, id.0, &req).await
}

pub async fn create_resource(
    req: HttpRequest,
    kind: web::Data<ResourceKind>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE
        .create(**kind, body.into_inner(), &req)
        .await
}

pub async fn delete_resource(
    req: HttpRequest,
    kind: web::Data<ResourceKind>,
    id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE.delete(**kind, id.0, &req).await
}

// 配置路由：每类资源一个 scope，共用同一组处理程序
pub fn configure_resource_routes(cfg: &mut web::ServiceConfig) {
    for kind in ResourceKind::ALL {
        cfg.service(
            web::scope(&format!("/api/v1/{}", kind.as_str()))
                .app_data(web::Data::new(kind))
                .wrap(middlewares::RateLimit::per_role())
                .wrap(middlewares::RequireJWT)
                .service(
                    web::resource("")
                        // 所有登录用户可访问，结果按身份过滤
                        .route(web::get().to(list_resources))
                        // 仅管理员
                        .route(
                            web::post()
                                .to(create_resource)
                                .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                        ),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(get_resource))
                        .route(
                            web::delete()
                                .to(delete_resource)
                                .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                        ),
                ),
        );
    }
}
