use crate::access::Principal;
use crate::models::users::entities::User;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// 秒
    pub expires_in: i64,
    pub user: User,
    pub principal: Principal,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub principal: Principal,
}
