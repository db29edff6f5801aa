//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，负责 API 的输入输出结构。

pub mod academics;
pub mod analytics;
pub mod auth;
pub mod common;
pub mod people;
pub mod records;
pub mod resources;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间，用于启动耗时统计
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
