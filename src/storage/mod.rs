use std::sync::Arc;

use crate::access::Visibility;
use crate::models::{
    PaginatedResponse, PaginationQuery,
    analytics::ReportDataset,
    people::entities::{Faculty, Student},
    resources::{CreateResourceRequest, Resource, ResourceKind},
    users::{
        entities::User,
        requests::{CreateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段为已哈希的密码）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 档案查询，用于解析请求方身份
    async fn get_faculty_by_user_id(&self, user_id: i64) -> Result<Option<Faculty>>;
    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>>;

    /// 资源方法，列表与详情按 Visibility 过滤
    async fn list_resources(
        &self,
        kind: ResourceKind,
        visibility: &Visibility,
        query: PaginationQuery,
    ) -> Result<PaginatedResponse<Resource>>;
    async fn get_resource(
        &self,
        kind: ResourceKind,
        id: i64,
        visibility: &Visibility,
    ) -> Result<Option<Resource>>;
    async fn create_resource(&self, req: CreateResourceRequest) -> Result<Resource>;
    async fn delete_resource(&self, kind: ResourceKind, id: i64) -> Result<bool>;

    /// 报表快照
    async fn load_report_dataset(&self) -> Result<ReportDataset>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
