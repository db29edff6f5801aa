use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error};

use super::{AnalyticsService, ReportEngine};
use crate::models::analytics::{GroupLevel, ReportScope, ScopeParams};
use crate::models::{ApiResponse, ErrorCode};

pub async fn handle_report<T, F>(
    service: &AnalyticsService,
    label: &str,
    request: &HttpRequest,
    compute: F,
) -> ActixResult<HttpResponse>
where
    T: Serialize,
    F: FnOnce(&ReportEngine<'_>) -> T,
{
    let storage = service.get_storage(request);
    let started = Instant::now();

    let dataset = match storage.load_report_dataset().await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to load data for report '{}': {}", label, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ReportFailed,
                    format!("Failed to compute {label}: {e}"),
                )),
            );
        }
    };

    let rows = compute(&ReportEngine::new(&dataset));
    debug!("Report '{}' computed in {:?}", label, started.elapsed());

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        rows,
        format!("{label} retrieved successfully"),
    )))
}

pub async fn handle_scoped<T, F>(
    service: &AnalyticsService,
    params: &ScopeParams,
    label: &str,
    request: &HttpRequest,
    compute: F,
) -> ActixResult<HttpResponse>
where
    T: Serialize,
    F: FnOnce(&ReportEngine<'_>, ReportScope) -> T,
{
    let scope = match ReportScope::from_params(params) {
        Ok(scope) => scope,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ReportScopeInvalid,
                e.message(),
            )));
        }
    };
    handle_report(service, label, request, |engine| compute(engine, scope)).await
}

pub async fn handle_grouped<T, F>(
    service: &AnalyticsService,
    level: &str,
    label: &str,
    request: &HttpRequest,
    compute: F,
) -> ActixResult<HttpResponse>
where
    T: Serialize,
    F: FnOnce(&ReportEngine<'_>, GroupLevel) -> T,
{
    let level = match level.parse::<GroupLevel>() {
        Ok(level) => level,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ReportScopeInvalid, msg)));
        }
    };
    handle_report(service, label, request, |engine| compute(engine, level)).await
}
