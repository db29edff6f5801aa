use chrono::NaiveTime;
use serde::Deserialize;

use crate::errors::{Result, UmsError};
use crate::utils::validate::{validate_name, validate_weekday};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

impl CreateDepartmentRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramRequest {
    pub name: String,
    pub department_id: i64,
}

impl CreateProgramRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub name: String,
    pub code: String,
    pub program_id: i64,
    #[serde(default)]
    pub faculty_id: Option<i64>,
}

impl CreateCourseRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        validate_name("code", &self.code)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimetableRequest {
    pub course_id: i64,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl CreateTimetableRequest {
    pub fn validate(&self) -> Result<()> {
        validate_weekday(&self.day)?;
        if self.end_time <= self.start_time {
            return Err(UmsError::validation("end_time must be after start_time"));
        }
        Ok(())
    }
}
