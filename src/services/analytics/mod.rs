//! 统计报表
//!
//! 每次调用加载一份 [`ReportDataset`] 快照，再交给 [`ReportEngine`] 在内存中计算。
//! 报表只对管理员开放，不经过访问过滤。

pub mod engine;
pub mod report;

pub use engine::ReportEngine;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;

use crate::models::analytics::{GroupLevel, ReportScope, ScopeParams};
use crate::storage::Storage;

pub struct AnalyticsService {
    storage: Option<Arc<dyn Storage>>,
}

impl AnalyticsService {
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

    /// 报表 1-10 与 18-20：可选的院系或专业范围
    pub async fn scoped<T, F>(
        &self,
        params: &ScopeParams,
        label: &str,
        request: &HttpRequest,
        compute: F,
    ) -> ActixResult<HttpResponse>
    where
        T: Serialize,
        F: FnOnce(&ReportEngine<'_>, ReportScope) -> T,
    {
        report::handle_scoped(self, params, label, request, compute).await
    }

    /// 报表 12-14：按院系或专业分组
    pub async fn grouped<T, F>(
        &self,
        level: &str,
        label: &str,
        request: &HttpRequest,
        compute: F,
    ) -> ActixResult<HttpResponse>
    where
        T: Serialize,
        F: FnOnce(&ReportEngine<'_>, GroupLevel) -> T,
    {
        report::handle_grouped(self, level, label, request, compute).await
    }

    /// 报表 11、15-17：指定专业
    pub async fn for_program<T, F>(
        &self,
        program_id: i64,
        label: &str,
        request: &HttpRequest,
        compute: F,
    ) -> ActixResult<HttpResponse>
    where
        T: Serialize,
        F: FnOnce(&ReportEngine<'_>, i64) -> T,
    {
        report::handle_report(self, label, request, |engine| compute(engine, program_id)).await
    }
}
