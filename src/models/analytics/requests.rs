use serde::{Deserialize, Serialize};

use crate::errors::{Result, UmsError};

// 报表范围查询参数（来自HTTP请求）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeParams {
    pub department_id: Option<i64>,
    pub program_id: Option<i64>,
}

/// 报表 1-10 的可选范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportScope {
    #[default]
    All,
    Department(i64),
    Program(i64),
}

impl ReportScope {
    /// 院系与专业二选一，同时给出视为参数错误
    pub fn from_params(params: &ScopeParams) -> Result<Self> {
        match (params.department_id, params.program_id) {
            (None, None) => Ok(ReportScope::All),
            (Some(id), None) => Ok(ReportScope::Department(id)),
            (None, Some(id)) => Ok(ReportScope::Program(id)),
            (Some(_), Some(_)) => Err(UmsError::validation(
                "department_id and program_id cannot be combined",
            )),
        }
    }
}

/// 报表 12-14 的分组层级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupLevel {
    Department,
    Program,
}

impl std::str::FromStr for GroupLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "department" => Ok(GroupLevel::Department),
            "program" => Ok(GroupLevel::Program),
            _ => Err(format!("Invalid group level: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_params() {
        assert_eq!(
            ReportScope::from_params(&ScopeParams::default()).unwrap(),
            ReportScope::All
        );
        let params = ScopeParams {
            department_id: None,
            program_id: Some(4),
        };
        assert_eq!(
            ReportScope::from_params(&params).unwrap(),
            ReportScope::Program(4)
        );
        let both = ScopeParams {
            department_id: Some(1),
            program_id: Some(4),
        };
        assert!(ReportScope::from_params(&both).is_err());
    }

    #[test]
    fn test_group_level_parse() {
        assert_eq!("program".parse(), Ok(GroupLevel::Program));
        assert!("faculty".parse::<GroupLevel>().is_err());
    }
}
