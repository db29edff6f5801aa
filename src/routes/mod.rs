pub mod analytics;

pub mod auth;

pub mod resources;

pub mod users;

pub use analytics::configure_analytics_routes;
pub use auth::configure_auth_routes;
pub use resources::configure_resource_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 API 路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_resource_routes)
        .configure(configure_analytics_routes);
}
