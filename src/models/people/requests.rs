use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    pub user_id: i64,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub program_id: Option<i64>,
    pub enrollment_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFacultyRequest {
    pub user_id: i64,
    #[serde(default)]
    pub department_id: Option<i64>,
}
