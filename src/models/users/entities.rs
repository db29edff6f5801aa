use serde::{Deserialize, Serialize};

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,   // 管理员
    Faculty, // 教师
    Student, // 学生
    Other,   // 其他（无任何数据可见）
}

impl UserRole {
    pub const ADMIN: &'static str = "admin";
    pub const FACULTY: &'static str = "faculty";
    pub const STUDENT: &'static str = "student";
    pub const OTHER: &'static str = "other";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }

    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Faculty, &Self::Student, &Self::Other]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid user role: '{s}'. Supported roles: admin, faculty, student, other"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
            UserRole::Faculty => write!(f, "{}", UserRole::FACULTY),
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Other => write!(f, "{}", UserRole::OTHER),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::ADMIN => Ok(UserRole::Admin),
            UserRole::FACULTY => Ok(UserRole::Faculty),
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::OTHER => Ok(UserRole::Other),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(format!("Invalid user status: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub first_name: String,
    pub last_name: String,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// "名 姓"，两者都为空时回退到用户名
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("faculty".parse::<UserRole>(), Ok(UserRole::Faculty));
        assert!("teacher".parse::<UserRole>().is_err());
        assert!(serde_json::from_str::<UserRole>("\"dean\"").is_err());
        assert_eq!(
            serde_json::to_string(&UserRole::Student).unwrap(),
            "\"student\""
        );
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let mut user = User {
            id: 1,
            username: "jdoe".into(),
            email: "jdoe@example.edu".into(),
            password_hash: String::new(),
            role: UserRole::Student,
            status: UserStatus::Active,
            first_name: String::new(),
            last_name: String::new(),
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(user.full_name(), "jdoe");

        user.first_name = "Jane".into();
        user.last_name = "Doe".into();
        assert_eq!(user.full_name(), "Jane Doe");
    }
}
