use sea_orm::{EntityTrait, QueryOrder, QuerySelect};

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{
    attendance, courses, departments, enrollments, faculty, grades, programs, students, users,
    withdrawals,
};
use crate::errors::{Result, UmsError};
use crate::models::analytics::{ReportDataset, ReportUser};

impl SeaOrmStorage {
    /// 读取报表需要的全部表，按 id 排序
    pub async fn load_report_dataset_impl(&self) -> Result<ReportDataset> {
        let load_err = |table: &'static str| {
            move |e: sea_orm::DbErr| UmsError::database_operation(format!("读取{table}失败: {e}"))
        };

        let departments = Departments::find()
            .order_by_asc(departments::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("departments"))?;
        let programs = Programs::find()
            .order_by_asc(programs::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("programs"))?;
        let courses = Courses::find()
            .order_by_asc(courses::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("courses"))?;
        let students = Students::find()
            .order_by_asc(students::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("students"))?;
        let faculty = Faculty::find()
            .order_by_asc(faculty::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("faculty"))?;
        let users = Users::find()
            .select_only()
            .columns([
                users::Column::Id,
                users::Column::Username,
                users::Column::FirstName,
                users::Column::LastName,
            ])
            .order_by_asc(users::Column::Id)
            .into_tuple::<(i64, String, String, String)>()
            .all(&self.db)
            .await
            .map_err(load_err("users"))?;
        let enrollments = Enrollments::find()
            .order_by_asc(enrollments::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("enrollments"))?;
        let withdrawals = Withdrawals::find()
            .order_by_asc(withdrawals::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("withdrawals"))?;
        let grades = Grades::find()
            .order_by_asc(grades::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("grades"))?;
        let attendance = Attendance::find()
            .order_by_asc(attendance::Column::Id)
            .all(&self.db)
            .await
            .map_err(load_err("attendance"))?;

        Ok(ReportDataset {
            departments: departments.into_iter().map(|m| m.into_department()).collect(),
            programs: programs.into_iter().map(|m| m.into_program()).collect(),
            courses: courses.into_iter().map(|m| m.into_course()).collect(),
            students: students.into_iter().map(|m| m.into_student()).collect(),
            faculty: faculty.into_iter().map(|m| m.into_faculty()).collect(),
            users: users
                .into_iter()
                .map(|(id, username, first_name, last_name)| ReportUser {
                    id,
                    username,
                    first_name,
                    last_name,
                })
                .collect(),
            enrollments: enrollments.into_iter().map(|m| m.into_enrollment()).collect(),
            withdrawals: withdrawals.into_iter().map(|m| m.into_withdrawal()).collect(),
            grades: grades.into_iter().map(|m| m.into_grade()).collect(),
            attendance: attendance.into_iter().map(|m| m.into_attendance()).collect(),
        })
    }
}
