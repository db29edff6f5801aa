use super::SeaOrmStorage;
use crate::entity::prelude::{Faculty as FacultyEntity, Students};
use crate::entity::{faculty, students};
use crate::errors::{Result, UmsError};
use crate::models::people::entities::{Faculty, Student};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

impl SeaOrmStorage {
    /// 通过用户 ID 获取教师档案
    pub async fn get_faculty_by_user_id_impl(&self, user_id: i64) -> Result<Option<Faculty>> {
        let result = FacultyEntity::find()
            .filter(faculty::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| UmsError::database_operation(format!("查询教师档案失败: {e}")))?;

        Ok(result.map(|m| m.into_faculty()))
    }

    /// 通过用户 ID 获取学生档案
    pub async fn get_student_by_user_id_impl(&self, user_id: i64) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(students::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| UmsError::database_operation(format!("查询学生档案失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }
}
