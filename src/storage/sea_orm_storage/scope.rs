//! 可见性到 SQL 条件的翻译
//!
//! 归属关系一律写成 `IN (子查询)`，结果不会因连接而重复。

use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{ColumnTrait, Condition};

use crate::access::Visibility;
use crate::entity::{
    attendance, courses, enrollments, faculty, grades, students, timetables, withdrawals,
};
use crate::models::resources::ResourceKind;

#[derive(Debug, Clone)]
pub(super) enum Scope {
    /// 不加条件
    Unrestricted,
    /// 没有可见行，不必查询
    Empty,
    Filter(Condition),
}

// 教师所授课程
fn courses_taught_by(faculty_id: i64) -> SelectStatement {
    Query::select()
        .column(courses::Column::Id)
        .from(courses::Entity)
        .and_where(courses::Column::FacultyId.eq(faculty_id))
        .to_owned()
}

// 学生所选课程
fn courses_enrolled_by(student_id: i64) -> SelectStatement {
    Query::select()
        .column(enrollments::Column::CourseId)
        .from(enrollments::Entity)
        .and_where(enrollments::Column::StudentId.eq(student_id))
        .to_owned()
}

// 选了该教师课程的学生
fn students_taught_by(faculty_id: i64) -> SelectStatement {
    Query::select()
        .column(enrollments::Column::StudentId)
        .from(enrollments::Entity)
        .and_where(enrollments::Column::CourseId.in_subquery(courses_taught_by(faculty_id)))
        .to_owned()
}

/// 按 (资源, 可见性) 生成查询范围，无法对应的组合视为不可见
pub(super) fn scope_for(kind: ResourceKind, visibility: &Visibility) -> Scope {
    use ResourceKind as K;
    use Visibility as V;

    let condition = match (kind, *visibility) {
        (_, V::All) => return Scope::Unrestricted,
        (_, V::Nothing) => return Scope::Empty,

        (K::Courses, V::TaughtBy(f)) => courses::Column::FacultyId.eq(f),
        (K::Courses, V::EnrolledIn(s)) => courses::Column::Id.in_subquery(courses_enrolled_by(s)),

        (K::Timetables, V::TaughtBy(f)) => {
            timetables::Column::CourseId.in_subquery(courses_taught_by(f))
        }
        (K::Timetables, V::EnrolledIn(s)) => {
            timetables::Column::CourseId.in_subquery(courses_enrolled_by(s))
        }

        (K::Students, V::OwnedBy(s)) => students::Column::Id.eq(s),
        (K::Students, V::TaughtStudents(f)) => {
            students::Column::Id.in_subquery(students_taught_by(f))
        }

        (K::Faculty, V::SameDepartment(d)) => faculty::Column::DepartmentId.eq(d),

        (K::Enrollments, V::TaughtBy(f)) => {
            enrollments::Column::CourseId.in_subquery(courses_taught_by(f))
        }
        (K::Enrollments, V::OwnedBy(s)) => enrollments::Column::StudentId.eq(s),
        (K::Withdrawals, V::TaughtBy(f)) => {
            withdrawals::Column::CourseId.in_subquery(courses_taught_by(f))
        }
        (K::Withdrawals, V::OwnedBy(s)) => withdrawals::Column::StudentId.eq(s),
        (K::Grades, V::TaughtBy(f)) => grades::Column::CourseId.in_subquery(courses_taught_by(f)),
        (K::Grades, V::OwnedBy(s)) => grades::Column::StudentId.eq(s),
        (K::Attendance, V::TaughtBy(f)) => {
            attendance::Column::CourseId.in_subquery(courses_taught_by(f))
        }
        (K::Attendance, V::OwnedBy(s)) => attendance::Column::StudentId.eq(s),

        _ => return Scope::Empty,
    };

    Scope::Filter(Condition::all().add(condition))
}
