//! 访问过滤
//!
//! 请求进入时由 JWT 中间件把用户解析为 [`Principal`]，之后所有列表与详情查询
//! 都先经过 [`visible`] 得到 [`Visibility`]，再由存储层翻译为 SQL 条件。

pub mod principal;
pub mod visibility;

pub use principal::{FacultyProfile, Principal, StudentProfile};
pub use visibility::{EntityKind, Visibility, visible};
