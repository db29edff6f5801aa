//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_ums_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum UmsError {
            $($variant(String),)*
        }

        impl UmsError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(UmsError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(UmsError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(UmsError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl UmsError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        UmsError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_ums_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    DatabaseConfig("E002", "Database Configuration Error"),
    DatabaseConnection("E003", "Database Connection Error"),
    DatabaseOperation("E004", "Database Operation Error"),
    Io("E005", "IO Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Conflict("E008", "Resource Conflict"),
    Serialization("E009", "Serialization Error"),
    Authentication("E010", "Authentication Error"),
    Authorization("E011", "Authorization Error"),
}

impl UmsError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否由调用方输入引起（而非服务端故障）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UmsError::Validation(_)
                | UmsError::NotFound(_)
                | UmsError::Conflict(_)
                | UmsError::Authentication(_)
                | UmsError::Authorization(_)
        )
    }
}

impl fmt::Display for UmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for UmsError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for UmsError {
    fn from(err: sea_orm::DbErr) -> Self {
        UmsError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for UmsError {
    fn from(err: std::io::Error) -> Self {
        UmsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for UmsError {
    fn from(err: serde_json::Error) -> Self {
        UmsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(UmsError::cache_connection("test").code(), "E001");
        assert_eq!(UmsError::database_operation("test").code(), "E004");
        assert_eq!(UmsError::validation("test").code(), "E006");
        assert_eq!(UmsError::conflict("test").code(), "E008");
        assert_eq!(UmsError::authorization("test").code(), "E011");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(UmsError::not_found("x").error_type(), "Resource Not Found");
        assert_eq!(UmsError::validation("x").error_type(), "Validation Error");
    }

    #[test]
    fn test_client_error_split() {
        assert!(UmsError::validation("bad grade").is_client_error());
        assert!(UmsError::conflict("dup").is_client_error());
        assert!(!UmsError::database_operation("boom").is_client_error());
        assert!(!UmsError::io("disk").is_client_error());
    }

    #[test]
    fn test_db_error_conversion() {
        let err: UmsError = sea_orm::DbErr::Custom("broken".into()).into();
        assert_eq!(err.code(), "E004");
        assert!(err.format_simple().contains("broken"));
    }
}
