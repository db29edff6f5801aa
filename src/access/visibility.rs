use serde::Serialize;

use super::principal::Principal;

/// 受访问过滤约束的实体
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    Student,
    Faculty,
    Enrollment,
    Withdrawal,
    Grade,
    Attendance,
    Timetable,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Course,
        EntityKind::Student,
        EntityKind::Faculty,
        EntityKind::Enrollment,
        EntityKind::Withdrawal,
        EntityKind::Grade,
        EntityKind::Attendance,
        EntityKind::Timetable,
    ];
}

/// 可见行的谓词，由存储层按实体翻译
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    Nothing,
    /// 课程（或课程下的记录）的授课教师是该教师
    TaughtBy(i64),
    /// 记录属于该学生，学生表中即本人
    OwnedBy(i64),
    /// 该学生选修的课程
    EnrolledIn(i64),
    /// 选修了该教师所授课程的学生
    TaughtStudents(i64),
    /// 同院系教师
    SameDepartment(i64),
}

impl Visibility {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Visibility::Nothing)
    }
}

/// 访问过滤表
pub fn visible(kind: EntityKind, principal: &Principal) -> Visibility {
    use EntityKind::*;

    match principal {
        Principal::Admin => Visibility::All,
        Principal::Faculty(profile) => match kind {
            Student => Visibility::TaughtStudents(profile.faculty_id),
            Faculty => profile
                .department_id
                .map_or(Visibility::Nothing, Visibility::SameDepartment),
            Course | Enrollment | Withdrawal | Grade | Attendance | Timetable => {
                Visibility::TaughtBy(profile.faculty_id)
            }
        },
        Principal::Student(profile) => match kind {
            Course | Timetable => Visibility::EnrolledIn(profile.student_id),
            Faculty => profile
                .department_id
                .map_or(Visibility::Nothing, Visibility::SameDepartment),
            Student | Enrollment | Withdrawal | Grade | Attendance => {
                Visibility::OwnedBy(profile.student_id)
            }
        },
        // 无档案或未知角色一律不可见
        Principal::Unlinked { .. } | Principal::Other => Visibility::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::principal::{FacultyProfile, StudentProfile};
    use crate::models::users::entities::UserRole;

    fn faculty(department_id: Option<i64>) -> Principal {
        Principal::Faculty(FacultyProfile {
            faculty_id: 5,
            user_id: 50,
            department_id,
        })
    }

    fn student(department_id: Option<i64>) -> Principal {
        Principal::Student(StudentProfile {
            student_id: 9,
            user_id: 90,
            department_id,
            program_id: Some(2),
        })
    }

    #[test]
    fn test_admin_sees_everything() {
        for kind in EntityKind::ALL {
            assert_eq!(visible(kind, &Principal::Admin), Visibility::All);
        }
    }

    #[test]
    fn test_faculty_table() {
        let p = faculty(Some(1));
        assert_eq!(visible(EntityKind::Course, &p), Visibility::TaughtBy(5));
        assert_eq!(visible(EntityKind::Grade, &p), Visibility::TaughtBy(5));
        assert_eq!(visible(EntityKind::Timetable, &p), Visibility::TaughtBy(5));
        assert_eq!(
            visible(EntityKind::Student, &p),
            Visibility::TaughtStudents(5)
        );
        assert_eq!(
            visible(EntityKind::Faculty, &p),
            Visibility::SameDepartment(1)
        );
    }

    #[test]
    fn test_student_table() {
        let p = student(Some(1));
        assert_eq!(visible(EntityKind::Course, &p), Visibility::EnrolledIn(9));
        assert_eq!(
            visible(EntityKind::Timetable, &p),
            Visibility::EnrolledIn(9)
        );
        assert_eq!(visible(EntityKind::Student, &p), Visibility::OwnedBy(9));
        assert_eq!(visible(EntityKind::Grade, &p), Visibility::OwnedBy(9));
        assert_eq!(visible(EntityKind::Withdrawal, &p), Visibility::OwnedBy(9));
        assert_eq!(
            visible(EntityKind::Faculty, &p),
            Visibility::SameDepartment(1)
        );
    }

    #[test]
    fn test_detached_department_sees_no_faculty() {
        assert!(visible(EntityKind::Faculty, &faculty(None)).is_nothing());
        assert!(visible(EntityKind::Faculty, &student(None)).is_nothing());
    }

    #[test]
    fn test_unlinked_and_other_are_denied() {
        let unlinked = Principal::Unlinked {
            role: UserRole::Student,
        };
        for kind in EntityKind::ALL {
            assert!(visible(kind, &unlinked).is_nothing());
            assert!(visible(kind, &Principal::Other).is_nothing());
        }
    }
}
