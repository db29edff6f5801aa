use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::people::entities::{Faculty, Student};
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacultyProfile {
    pub faculty_id: i64,
    pub user_id: i64,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentProfile {
    pub student_id: i64,
    pub user_id: i64,
    pub department_id: Option<i64>,
    pub program_id: Option<i64>,
}

/// 请求方身份
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Admin,
    Faculty(FacultyProfile),
    Student(StudentProfile),
    /// 角色是教师或学生，但没有关联档案
    Unlinked { role: UserRole },
    Other,
}

impl Principal {
    /// 先看角色，再找对应档案；档案缺失视为未关联
    pub fn resolve(user: &User, faculty: Option<&Faculty>, student: Option<&Student>) -> Self {
        match user.role {
            UserRole::Admin => Principal::Admin,
            UserRole::Faculty => match faculty {
                Some(f) => Principal::Faculty(FacultyProfile {
                    faculty_id: f.id,
                    user_id: f.user_id,
                    department_id: f.department_id,
                }),
                None => Principal::Unlinked { role: user.role },
            },
            UserRole::Student => match student {
                Some(s) => Principal::Student(StudentProfile {
                    student_id: s.id,
                    user_id: s.user_id,
                    department_id: s.department_id,
                    program_id: s.program_id,
                }),
                None => Principal::Unlinked { role: user.role },
            },
            UserRole::Other => Principal::Other,
        }
    }

    /// 只查询与角色对应的档案
    pub async fn load(storage: &dyn Storage, user: &User) -> Result<Self> {
        let principal = match user.role {
            UserRole::Faculty => {
                let faculty = storage.get_faculty_by_user_id(user.id).await?;
                Self::resolve(user, faculty.as_ref(), None)
            }
            UserRole::Student => {
                let student = storage.get_student_by_user_id(user.id).await?;
                Self::resolve(user, None, student.as_ref())
            }
            _ => Self::resolve(user, None, None),
        };
        Ok(principal)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin)
    }

    /// 限流等按角色区分的场景使用
    pub fn role(&self) -> UserRole {
        match self {
            Principal::Admin => UserRole::Admin,
            Principal::Faculty(_) => UserRole::Faculty,
            Principal::Student(_) => UserRole::Student,
            Principal::Unlinked { role } => *role,
            Principal::Other => UserRole::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;
    use chrono::NaiveDate;

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            username: "u7".into(),
            email: "u7@example.edu".into(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            first_name: String::new(),
            last_name: String::new(),
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn faculty() -> Faculty {
        Faculty {
            id: 3,
            user_id: 7,
            department_id: Some(1),
        }
    }

    fn student() -> Student {
        Student {
            id: 11,
            user_id: 7,
            department_id: Some(1),
            program_id: Some(2),
            enrollment_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_admin_ignores_profiles() {
        let p = Principal::resolve(&user(UserRole::Admin), Some(&faculty()), None);
        assert_eq!(p, Principal::Admin);
    }

    #[test]
    fn test_role_decides_which_profile_counts() {
        // 学生角色即使挂了教师档案也不会得到教师视野
        let p = Principal::resolve(&user(UserRole::Student), Some(&faculty()), None);
        assert_eq!(
            p,
            Principal::Unlinked {
                role: UserRole::Student
            }
        );

        let p = Principal::resolve(&user(UserRole::Student), Some(&faculty()), Some(&student()));
        assert!(matches!(p, Principal::Student(s) if s.student_id == 11));

        let p = Principal::resolve(&user(UserRole::Faculty), Some(&faculty()), Some(&student()));
        assert!(matches!(p, Principal::Faculty(f) if f.faculty_id == 3));

        let p = Principal::resolve(&user(UserRole::Faculty), None, Some(&student()));
        assert_eq!(
            p,
            Principal::Unlinked {
                role: UserRole::Faculty
            }
        );
    }

    #[test]
    fn test_other_role_ignores_profiles() {
        let p = Principal::resolve(&user(UserRole::Other), Some(&faculty()), Some(&student()));
        assert_eq!(p, Principal::Other);
        assert_eq!(
            crate::access::visible(crate::access::EntityKind::Grade, &p),
            crate::access::Visibility::Nothing
        );
    }

    #[test]
    fn test_student_profile() {
        let p = Principal::resolve(&user(UserRole::Student), None, Some(&student()));
        assert_eq!(
            p,
            Principal::Student(StudentProfile {
                student_id: 11,
                user_id: 7,
                department_id: Some(1),
                program_id: Some(2),
            })
        );
    }

    #[test]
    fn test_missing_profile_is_unlinked() {
        let p = Principal::resolve(&user(UserRole::Faculty), None, None);
        assert_eq!(
            p,
            Principal::Unlinked {
                role: UserRole::Faculty
            }
        );
        assert_eq!(p.role(), UserRole::Faculty);
        assert_eq!(
            Principal::resolve(&user(UserRole::Other), None, None),
            Principal::Other
        );
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Principal::resolve(
            &user(UserRole::Student),
            None,
            Some(&student()),
        ))
        .unwrap();
        assert_eq!(value["kind"], "student");
        assert_eq!(value["student_id"], 11);

        let back: Principal = serde_json::from_value(value).unwrap();
        assert!(matches!(back, Principal::Student(_)));
    }
}
