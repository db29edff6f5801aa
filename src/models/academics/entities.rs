use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub department_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub program_id: i64,
    /// 授课教师，教师档案删除后为空
    pub faculty_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timetable {
    pub id: i64,
    pub course_id: i64,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
