//! 通用资源模型
//!
//! 十类资源共用一套列表/详情/创建/删除接口，`ResourceKind` 决定具体表，
//! `Resource` 与 `CreateResourceRequest` 是对应的输出与输入载体。

use serde::{Deserialize, Serialize};

use crate::access::EntityKind;
use crate::errors::{Result, UmsError};
use crate::models::academics::entities::{Course, Department, Program, Timetable};
use crate::models::academics::requests::{
    CreateCourseRequest, CreateDepartmentRequest, CreateProgramRequest, CreateTimetableRequest,
};
use crate::models::people::entities::{Faculty, Student};
use crate::models::people::requests::{CreateFacultyRequest, CreateStudentRequest};
use crate::models::records::entities::{Attendance, Enrollment, Grade, Withdrawal};
use crate::models::records::requests::{
    CreateAttendanceRequest, CreateEnrollmentRequest, CreateGradeRequest, CreateWithdrawalRequest,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Departments,
    Programs,
    Courses,
    Students,
    Faculty,
    Enrollments,
    Withdrawals,
    Grades,
    Attendance,
    Timetables,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Departments,
        ResourceKind::Programs,
        ResourceKind::Courses,
        ResourceKind::Students,
        ResourceKind::Faculty,
        ResourceKind::Enrollments,
        ResourceKind::Withdrawals,
        ResourceKind::Grades,
        ResourceKind::Attendance,
        ResourceKind::Timetables,
    ];

    /// URL 路径段
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Departments => "departments",
            ResourceKind::Programs => "programs",
            ResourceKind::Courses => "courses",
            ResourceKind::Students => "students",
            ResourceKind::Faculty => "faculty",
            ResourceKind::Enrollments => "enrollments",
            ResourceKind::Withdrawals => "withdrawals",
            ResourceKind::Grades => "grades",
            ResourceKind::Attendance => "attendance",
            ResourceKind::Timetables => "timetables",
        }
    }

    /// 受访问过滤约束的实体类型，院系与专业对所有登录用户开放
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            ResourceKind::Departments | ResourceKind::Programs => None,
            ResourceKind::Courses => Some(EntityKind::Course),
            ResourceKind::Students => Some(EntityKind::Student),
            ResourceKind::Faculty => Some(EntityKind::Faculty),
            ResourceKind::Enrollments => Some(EntityKind::Enrollment),
            ResourceKind::Withdrawals => Some(EntityKind::Withdrawal),
            ResourceKind::Grades => Some(EntityKind::Grade),
            ResourceKind::Attendance => Some(EntityKind::Attendance),
            ResourceKind::Timetables => Some(EntityKind::Timetable),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Invalid resource kind: {s}"))
    }
}

// 资源输出
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Resource {
    Department(Department),
    Program(Program),
    Course(Course),
    Student(Student),
    Faculty(Faculty),
    Enrollment(Enrollment),
    Withdrawal(Withdrawal),
    Grade(Grade),
    Attendance(Attendance),
    Timetable(Timetable),
}

impl Resource {
    pub fn id(&self) -> i64 {
        match self {
            Resource::Department(r) => r.id,
            Resource::Program(r) => r.id,
            Resource::Course(r) => r.id,
            Resource::Student(r) => r.id,
            Resource::Faculty(r) => r.id,
            Resource::Enrollment(r) => r.id,
            Resource::Withdrawal(r) => r.id,
            Resource::Grade(r) => r.id,
            Resource::Attendance(r) => r.id,
            Resource::Timetable(r) => r.id,
        }
    }
}

// 资源创建请求
#[derive(Debug, Clone)]
pub enum CreateResourceRequest {
    Department(CreateDepartmentRequest),
    Program(CreateProgramRequest),
    Course(CreateCourseRequest),
    Student(CreateStudentRequest),
    Faculty(CreateFacultyRequest),
    Enrollment(CreateEnrollmentRequest),
    Withdrawal(CreateWithdrawalRequest),
    Grade(CreateGradeRequest),
    Attendance(CreateAttendanceRequest),
    Timetable(CreateTimetableRequest),
}

impl CreateResourceRequest {
    /// 按资源类型解析请求体并做字段校验
    pub fn parse(kind: ResourceKind, body: serde_json::Value) -> Result<Self> {
        fn from<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T> {
            serde_json::from_value(body).map_err(|e| UmsError::validation(e.to_string()))
        }

        let request = match kind {
            ResourceKind::Departments => Self::Department(from(body)?),
            ResourceKind::Programs => Self::Program(from(body)?),
            ResourceKind::Courses => Self::Course(from(body)?),
            ResourceKind::Students => Self::Student(from(body)?),
            ResourceKind::Faculty => Self::Faculty(from(body)?),
            ResourceKind::Enrollments => Self::Enrollment(from(body)?),
            ResourceKind::Withdrawals => Self::Withdrawal(from(body)?),
            ResourceKind::Grades => Self::Grade(from(body)?),
            ResourceKind::Attendance => Self::Attendance(from(body)?),
            ResourceKind::Timetables => Self::Timetable(from(body)?),
        };
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Department(req) => req.validate(),
            Self::Program(req) => req.validate(),
            Self::Course(req) => req.validate(),
            Self::Grade(req) => req.validate(),
            Self::Timetable(req) => req.validate(),
            Self::Student(_)
            | Self::Faculty(_)
            | Self::Enrollment(_)
            | Self::Withdrawal(_)
            | Self::Attendance(_) => Ok(()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Department(_) => ResourceKind::Departments,
            Self::Program(_) => ResourceKind::Programs,
            Self::Course(_) => ResourceKind::Courses,
            Self::Student(_) => ResourceKind::Students,
            Self::Faculty(_) => ResourceKind::Faculty,
            Self::Enrollment(_) => ResourceKind::Enrollments,
            Self::Withdrawal(_) => ResourceKind::Withdrawals,
            Self::Grade(_) => ResourceKind::Grades,
            Self::Attendance(_) => ResourceKind::Attendance,
            Self::Timetable(_) => ResourceKind::Timetables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_path_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("homeworks".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_only_reference_tables_are_unfiltered() {
        let unfiltered: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(|k| k.entity_kind().is_none())
            .collect();
        assert_eq!(
            unfiltered,
            vec![ResourceKind::Departments, ResourceKind::Programs]
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_grade() {
        let err = CreateResourceRequest::parse(
            ResourceKind::Grades,
            json!({"student_id": 1, "course_id": 2, "grade": 101.5}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "E006");

        let ok = CreateResourceRequest::parse(
            ResourceKind::Grades,
            json!({"student_id": 1, "course_id": 2, "grade": 88}),
        )
        .unwrap();
        assert_eq!(ok.kind(), ResourceKind::Grades);
    }

    #[test]
    fn test_parse_timetable_checks_day_and_times() {
        let bad_day = CreateResourceRequest::parse(
            ResourceKind::Timetables,
            json!({"course_id": 1, "day": "Someday", "start_time": "09:00:00", "end_time": "10:00:00"}),
        );
        assert!(bad_day.is_err());

        let reversed = CreateResourceRequest::parse(
            ResourceKind::Timetables,
            json!({"course_id": 1, "day": "Monday", "start_time": "11:00:00", "end_time": "10:00:00"}),
        );
        assert!(reversed.is_err());

        let ok = CreateResourceRequest::parse(
            ResourceKind::Timetables,
            json!({"course_id": 1, "day": "monday", "start_time": "09:00:00", "end_time": "10:30:00"}),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_parse_reports_missing_fields_as_validation() {
        let err = CreateResourceRequest::parse(ResourceKind::Enrollments, json!({"student_id": 1}))
            .unwrap_err();
        assert_eq!(err.code(), "E006");
    }
}
