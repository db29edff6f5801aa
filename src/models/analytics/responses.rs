//! 报表输出行
//!
//! 字段名即 JSON 键名，报表对外格式保持稳定。

use serde::Serialize;

use crate::models::records::entities::AttendanceStatus;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepartmentCount {
    pub department_id: Option<i64>,
    pub department: Option<String>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgramCount {
    pub program_id: Option<i64>,
    pub program: Option<String>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusCount {
    pub status: AttendanceStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradeValueCount {
    pub grade: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseCount {
    pub course_id: i64,
    pub course: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentAverage {
    pub student_id: i64,
    pub username: String,
    pub name: String,
    pub average_grade: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentAbsences {
    pub student_id: i64,
    pub username: String,
    pub name: String,
    pub absences: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FacultyLoad {
    /// 未分配教师的课程归入空组
    pub faculty_id: Option<i64>,
    pub username: Option<String>,
    pub total_courses: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepartmentTopStudents {
    pub department_id: i64,
    pub department: String,
    pub top_students: Vec<StudentAverage>,
}

/// 报表 12-14 的分组键
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GroupKey {
    Department { department_id: i64, department: String },
    Program { program_id: i64, program: String },
}

impl GroupKey {
    pub fn id(&self) -> i64 {
        match self {
            GroupKey::Department { department_id, .. } => *department_id,
            GroupKey::Program { program_id, .. } => *program_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupAverage {
    #[serde(flatten)]
    pub group: GroupKey,
    pub average_grade: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupCount {
    #[serde(flatten)]
    pub group: GroupKey,
    pub withdrawals: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupAttendance {
    #[serde(flatten)]
    pub group: GroupKey,
    pub average_attendance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseAverage {
    pub course_id: i64,
    pub course: String,
    pub average_grade: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentCourseAbsences {
    pub student_id: i64,
    pub username: String,
    pub course_id: i64,
    pub course: String,
    pub absences: i64,
}
