use crate::models::academics::entities::{Course, Department, Program};
use crate::models::people::entities::{Faculty, Student};
use crate::models::records::entities::{Attendance, Enrollment, Grade, Withdrawal};

/// 报表计算所需的全表快照
#[derive(Debug, Clone, Default)]
pub struct ReportDataset {
    pub departments: Vec<Department>,
    pub programs: Vec<Program>,
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
    pub faculty: Vec<Faculty>,
    pub users: Vec<ReportUser>,
    pub enrollments: Vec<Enrollment>,
    pub withdrawals: Vec<Withdrawal>,
    pub grades: Vec<Grade>,
    pub attendance: Vec<Attendance>,
}

/// 报表只用到用户的标识与姓名，不读取口令等字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl ReportUser {
    /// 与 `User::full_name` 同样的回退规则
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}
