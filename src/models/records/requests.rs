use chrono::NaiveDate;
use serde::Deserialize;

use super::entities::AttendanceStatus;
use crate::errors::Result;
use crate::utils::validate::validate_grade;

// 选课与退课日期由服务端在创建时写入
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_id: i64,
    pub course_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub student_id: i64,
    pub course_id: i64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGradeRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub grade: f64,
}

impl CreateGradeRequest {
    pub fn validate(&self) -> Result<()> {
        validate_grade(self.grade)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttendanceRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}
