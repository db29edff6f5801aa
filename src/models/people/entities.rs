use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
    /// 院系或专业被删除后置空
    pub department_id: Option<i64>,
    pub program_id: Option<i64>,
    pub enrollment_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faculty {
    pub id: i64,
    pub user_id: i64,
    pub department_id: Option<i64>,
}
