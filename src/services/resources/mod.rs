//! 十类教务资源的通用 CRUD
//!
//! 读接口按请求方的 [`Visibility`] 过滤，写接口仅对管理员开放（在路由层限制）。

pub mod create;
pub mod delete;
pub mod get;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::access::{Principal, Visibility, visible};
use crate::models::PaginationQuery;
use crate::models::resources::ResourceKind;
use crate::storage::Storage;

pub struct ResourceService {
    storage: Option<Arc<dyn Storage>>,
}

impl ResourceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn list(
        &self,
        kind: ResourceKind,
        query: PaginationQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_resources(self, kind, query, request).await
    }

    pub async fn get(
        &self,
        kind: ResourceKind,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_resource(self, kind, id, request).await
    }

    pub async fn create(
        &self,
        kind: ResourceKind,
        body: serde_json::Value,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_resource(self, kind, body, request).await
    }

    pub async fn delete(
        &self,
        kind: ResourceKind,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_resource(self, kind, id, request).await
    }
}

/// 院系与专业不受过滤
pub(crate) fn visibility_for(kind: ResourceKind, principal: &Principal) -> Visibility {
    kind.entity_kind()
        .map_or(Visibility::All, |entity| visible(entity, principal))
}
