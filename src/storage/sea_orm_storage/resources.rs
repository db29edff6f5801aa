use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use super::SeaOrmStorage;
use super::scope::{Scope, scope_for};
use crate::access::Visibility;
use crate::entity::prelude::*;
use crate::entity::{
    attendance, courses, departments, enrollments, faculty, grades, programs, students,
    timetables, withdrawals,
};
use crate::errors::{Result, UmsError};
use crate::models::{
    PaginatedResponse, PaginationInfo, PaginationQuery,
    resources::{CreateResourceRequest, Resource, ResourceKind},
    users::entities::UserRole,
};

fn into_page<M>(
    rows: Vec<M>,
    pagination: PaginationInfo,
    convert: impl FnMut(M) -> Resource,
) -> PaginatedResponse<Resource> {
    PaginatedResponse {
        items: rows.into_iter().map(convert).collect(),
        pagination,
    }
}

// 星期统一为首字母大写
fn normalize_weekday(day: &str) -> String {
    let day = day.trim().to_ascii_lowercase();
    let mut chars = day.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl SeaOrmStorage {
    /// 按范围分页查询单表，按 id 升序
    async fn fetch_scoped_page<E>(
        &self,
        kind: ResourceKind,
        scope: Scope,
        query: &PaginationQuery,
        id_col: E::Column,
    ) -> Result<(Vec<E::Model>, PaginationInfo)>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        let (page, size) = query.normalized();

        let mut select = E::find();
        match scope {
            Scope::Empty => {
                return Ok((
                    Vec::new(),
                    PaginationInfo {
                        page: page as i64,
                        page_size: size as i64,
                        total: 0,
                        total_pages: 0,
                    },
                ));
            }
            Scope::Filter(condition) => select = select.filter(condition),
            Scope::Unrestricted => {}
        }

        let paginator = select.order_by_asc(id_col).paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| UmsError::database_operation(format!("查询{kind}总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| UmsError::database_operation(format!("查询{kind}页数失败: {e}")))?;
        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| UmsError::database_operation(format!("查询{kind}列表失败: {e}")))?;

        Ok((
            rows,
            PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        ))
    }

    /// 按范围查询单行
    async fn find_scoped<E>(
        &self,
        kind: ResourceKind,
        scope: Scope,
        id_col: E::Column,
        id: i64,
    ) -> Result<Option<E::Model>>
    where
        E: EntityTrait,
    {
        let select = match scope {
            Scope::Empty => return Ok(None),
            Scope::Filter(condition) => E::find().filter(condition),
            Scope::Unrestricted => E::find(),
        };

        select
            .filter(id_col.eq(id))
            .one(&self.db)
            .await
            .map_err(|e| UmsError::database_operation(format!("查询{kind}失败: {e}")))
    }

    /// 引用的行必须存在
    async fn ensure_exists<E>(&self, id_col: E::Column, id: i64, what: &str) -> Result<()>
    where
        E: EntityTrait,
    {
        let found = E::find()
            .filter(id_col.eq(id))
            .one(&self.db)
            .await
            .map_err(|e| UmsError::database_operation(format!("查询{what}失败: {e}")))?;

        match found {
            Some(_) => Ok(()),
            None => Err(UmsError::validation(format!("{what} {id} does not exist"))),
        }
    }

    /// 档案只能挂在对应角色的用户上
    async fn ensure_user_role(&self, user_id: i64, role: UserRole, what: &str) -> Result<()> {
        match self.get_user_by_id_impl(user_id).await? {
            None => Err(UmsError::validation(format!("user {user_id} does not exist"))),
            Some(user) if user.role != role => Err(UmsError::validation(format!(
                "user {user_id} has role {}, cannot hold a {what} profile",
                user.role
            ))),
            Some(_) => Ok(()),
        }
    }

    async fn ensure_optional<E>(&self, id_col: E::Column, id: Option<i64>, what: &str) -> Result<()>
    where
        E: EntityTrait,
    {
        match id {
            Some(id) => self.ensure_exists::<E>(id_col, id, what).await,
            None => Ok(()),
        }
    }

    async fn delete_by_column<E>(&self, kind: ResourceKind, id_col: E::Column, id: i64) -> Result<bool>
    where
        E: EntityTrait,
    {
        let result = E::delete_many()
            .filter(id_col.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| UmsError::database_operation(format!("删除{kind}失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 分页列出资源
    pub async fn list_resources_impl(
        &self,
        kind: ResourceKind,
        visibility: &Visibility,
        query: PaginationQuery,
    ) -> Result<PaginatedResponse<Resource>> {
        let scope = scope_for(kind, visibility);

        let page = match kind {
            ResourceKind::Departments => {
                let (rows, info) = self
                    .fetch_scoped_page::<Departments>(kind, scope, &query, departments::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Department(m.into_department()))
            }
            ResourceKind::Programs => {
                let (rows, info) = self
                    .fetch_scoped_page::<Programs>(kind, scope, &query, programs::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Program(m.into_program()))
            }
            ResourceKind::Courses => {
                let (rows, info) = self
                    .fetch_scoped_page::<Courses>(kind, scope, &query, courses::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Course(m.into_course()))
            }
            ResourceKind::Students => {
                let (rows, info) = self
                    .fetch_scoped_page::<Students>(kind, scope, &query, students::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Student(m.into_student()))
            }
            ResourceKind::Faculty => {
                let (rows, info) = self
                    .fetch_scoped_page::<Faculty>(kind, scope, &query, faculty::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Faculty(m.into_faculty()))
            }
            ResourceKind::Enrollments => {
                let (rows, info) = self
                    .fetch_scoped_page::<Enrollments>(kind, scope, &query, enrollments::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Enrollment(m.into_enrollment()))
            }
            ResourceKind::Withdrawals => {
                let (rows, info) = self
                    .fetch_scoped_page::<Withdrawals>(kind, scope, &query, withdrawals::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Withdrawal(m.into_withdrawal()))
            }
            ResourceKind::Grades => {
                let (rows, info) = self
                    .fetch_scoped_page::<Grades>(kind, scope, &query, grades::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Grade(m.into_grade()))
            }
            ResourceKind::Attendance => {
                let (rows, info) = self
                    .fetch_scoped_page::<Attendance>(kind, scope, &query, attendance::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Attendance(m.into_attendance()))
            }
            ResourceKind::Timetables => {
                let (rows, info) = self
                    .fetch_scoped_page::<Timetables>(kind, scope, &query, timetables::Column::Id)
                    .await?;
                into_page(rows, info, |m| Resource::Timetable(m.into_timetable()))
            }
        };

        Ok(page)
    }

    /// 获取单个资源，不可见时与不存在一样返回 None
    pub async fn get_resource_impl(
        &self,
        kind: ResourceKind,
        id: i64,
        visibility: &Visibility,
    ) -> Result<Option<Resource>> {
        let scope = scope_for(kind, visibility);

        let resource = match kind {
            ResourceKind::Departments => self
                .find_scoped::<Departments>(kind, scope, departments::Column::Id, id)
                .await?
                .map(|m| Resource::Department(m.into_department())),
            ResourceKind::Programs => self
                .find_scoped::<Programs>(kind, scope, programs::Column::Id, id)
                .await?
                .map(|m| Resource::Program(m.into_program())),
            ResourceKind::Courses => self
                .find_scoped::<Courses>(kind, scope, courses::Column::Id, id)
                .await?
                .map(|m| Resource::Course(m.into_course())),
            ResourceKind::Students => self
                .find_scoped::<Students>(kind, scope, students::Column::Id, id)
                .await?
                .map(|m| Resource::Student(m.into_student())),
            ResourceKind::Faculty => self
                .find_scoped::<Faculty>(kind, scope, faculty::Column::Id, id)
                .await?
                .map(|m| Resource::Faculty(m.into_faculty())),
            ResourceKind::Enrollments => self
                .find_scoped::<Enrollments>(kind, scope, enrollments::Column::Id, id)
                .await?
                .map(|m| Resource::Enrollment(m.into_enrollment())),
            ResourceKind::Withdrawals => self
                .find_scoped::<Withdrawals>(kind, scope, withdrawals::Column::Id, id)
                .await?
                .map(|m| Resource::Withdrawal(m.into_withdrawal())),
            ResourceKind::Grades => self
                .find_scoped::<Grades>(kind, scope, grades::Column::Id, id)
                .await?
                .map(|m| Resource::Grade(m.into_grade())),
            ResourceKind::Attendance => self
                .find_scoped::<Attendance>(kind, scope, attendance::Column::Id, id)
                .await?
                .map(|m| Resource::Attendance(m.into_attendance())),
            ResourceKind::Timetables => self
                .find_scoped::<Timetables>(kind, scope, timetables::Column::Id, id)
                .await?
                .map(|m| Resource::Timetable(m.into_timetable())),
        };

        Ok(resource)
    }

    /// 创建资源，先校验引用
    pub async fn create_resource_impl(&self, req: CreateResourceRequest) -> Result<Resource> {
        let kind = req.kind();
        let insert_err = |e: sea_orm::DbErr| UmsError::database_operation(format!("创建{kind}失败: {e}"));
        let today = Utc::now().date_naive();

        let resource = match req {
            CreateResourceRequest::Department(r) => {
                let model = departments::ActiveModel {
                    name: Set(r.name.trim().to_string()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Department(model.into_department())
            }
            CreateResourceRequest::Program(r) => {
                self.ensure_exists::<Departments>(departments::Column::Id, r.department_id, "department")
                    .await?;
                let model = programs::ActiveModel {
                    name: Set(r.name.trim().to_string()),
                    department_id: Set(r.department_id),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Program(model.into_program())
            }
            CreateResourceRequest::Course(r) => {
                self.ensure_exists::<Programs>(programs::Column::Id, r.program_id, "program")
                    .await?;
                self.ensure_optional::<Faculty>(faculty::Column::Id, r.faculty_id, "faculty")
                    .await?;
                let model = courses::ActiveModel {
                    name: Set(r.name.trim().to_string()),
                    code: Set(r.code.trim().to_string()),
                    program_id: Set(r.program_id),
                    faculty_id: Set(r.faculty_id),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Course(model.into_course())
            }
            CreateResourceRequest::Student(r) => {
                self.ensure_user_role(r.user_id, UserRole::Student, "student").await?;
                if self.get_student_by_user_id_impl(r.user_id).await?.is_some() {
                    return Err(UmsError::conflict(format!(
                        "user {} already has a student profile",
                        r.user_id
                    )));
                }
                self.ensure_optional::<Departments>(departments::Column::Id, r.department_id, "department")
                    .await?;
                self.ensure_optional::<Programs>(programs::Column::Id, r.program_id, "program")
                    .await?;
                let model = students::ActiveModel {
                    user_id: Set(r.user_id),
                    department_id: Set(r.department_id),
                    program_id: Set(r.program_id),
                    enrollment_date: Set(r.enrollment_date),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Student(model.into_student())
            }
            CreateResourceRequest::Faculty(r) => {
                self.ensure_user_role(r.user_id, UserRole::Faculty, "faculty").await?;
                if self.get_faculty_by_user_id_impl(r.user_id).await?.is_some() {
                    return Err(UmsError::conflict(format!(
                        "user {} already has a faculty profile",
                        r.user_id
                    )));
                }
                self.ensure_optional::<Departments>(departments::Column::Id, r.department_id, "department")
                    .await?;
                let model = faculty::ActiveModel {
                    user_id: Set(r.user_id),
                    department_id: Set(r.department_id),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Faculty(model.into_faculty())
            }
            CreateResourceRequest::Enrollment(r) => {
                self.ensure_student_and_course(r.student_id, r.course_id).await?;
                let model = enrollments::ActiveModel {
                    student_id: Set(r.student_id),
                    course_id: Set(r.course_id),
                    enrolled_on: Set(today),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Enrollment(model.into_enrollment())
            }
            CreateResourceRequest::Withdrawal(r) => {
                self.ensure_student_and_course(r.student_id, r.course_id).await?;
                let model = withdrawals::ActiveModel {
                    student_id: Set(r.student_id),
                    course_id: Set(r.course_id),
                    reason: Set(r.reason),
                    date: Set(today),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Withdrawal(model.into_withdrawal())
            }
            CreateResourceRequest::Grade(r) => {
                self.ensure_student_and_course(r.student_id, r.course_id).await?;
                let model = grades::ActiveModel {
                    student_id: Set(r.student_id),
                    course_id: Set(r.course_id),
                    grade: Set(r.grade),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Grade(model.into_grade())
            }
            CreateResourceRequest::Attendance(r) => {
                self.ensure_student_and_course(r.student_id, r.course_id).await?;
                let model = attendance::ActiveModel {
                    student_id: Set(r.student_id),
                    course_id: Set(r.course_id),
                    date: Set(r.date),
                    status: Set(r.status.to_string()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Attendance(model.into_attendance())
            }
            CreateResourceRequest::Timetable(r) => {
                self.ensure_exists::<Courses>(courses::Column::Id, r.course_id, "course")
                    .await?;
                let model = timetables::ActiveModel {
                    course_id: Set(r.course_id),
                    day: Set(normalize_weekday(&r.day)),
                    start_time: Set(r.start_time),
                    end_time: Set(r.end_time),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(insert_err)?;
                Resource::Timetable(model.into_timetable())
            }
        };

        Ok(resource)
    }

    async fn ensure_student_and_course(&self, student_id: i64, course_id: i64) -> Result<()> {
        self.ensure_exists::<Students>(students::Column::Id, student_id, "student")
            .await?;
        self.ensure_exists::<Courses>(courses::Column::Id, course_id, "course")
            .await
    }

    /// 删除资源，依赖行由外键级联处理
    pub async fn delete_resource_impl(&self, kind: ResourceKind, id: i64) -> Result<bool> {
        match kind {
            ResourceKind::Departments => {
                self.delete_by_column::<Departments>(kind, departments::Column::Id, id)
                    .await
            }
            ResourceKind::Programs => {
                self.delete_by_column::<Programs>(kind, programs::Column::Id, id)
                    .await
            }
            ResourceKind::Courses => {
                self.delete_by_column::<Courses>(kind, courses::Column::Id, id)
                    .await
            }
            ResourceKind::Students => {
                self.delete_by_column::<Students>(kind, students::Column::Id, id)
                    .await
            }
            ResourceKind::Faculty => {
                self.delete_by_column::<Faculty>(kind, faculty::Column::Id, id)
                    .await
            }
            ResourceKind::Enrollments => {
                self.delete_by_column::<Enrollments>(kind, enrollments::Column::Id, id)
                    .await
            }
            ResourceKind::Withdrawals => {
                self.delete_by_column::<Withdrawals>(kind, withdrawals::Column::Id, id)
                    .await
            }
            ResourceKind::Grades => {
                self.delete_by_column::<Grades>(kind, grades::Column::Id, id)
                    .await
            }
            ResourceKind::Attendance => {
                self.delete_by_column::<Attendance>(kind, attendance::Column::Id, id)
                    .await
            }
            ResourceKind::Timetables => {
                self.delete_by_column::<Timetables>(kind, timetables::Column::Id, id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SeaOrmStorage;
    use super::super::test_support::memory_storage;
    use crate::access::{EntityKind, Principal, visible};
    use crate::errors::UmsError;
    use crate::models::PaginationQuery;
    use crate::models::resources::{CreateResourceRequest, Resource, ResourceKind};
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::CreateUserRequest;
    use serde_json::json;

    struct Campus {
        cs: i64,
        math: i64,
        cs_program: i64,
        turing: Principal,
        noether: Principal,
        alice: Principal,
        alice_id: i64,
        bob_id: i64,
        compilers: i64,
        algebra: i64,
    }

    async fn create(storage: &SeaOrmStorage, kind: ResourceKind, body: serde_json::Value) -> i64 {
        let req = CreateResourceRequest::parse(kind, body).unwrap();
        storage.create_resource_impl(req).await.unwrap().id()
    }

    async fn user(storage: &SeaOrmStorage, username: &str, role: UserRole) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@uni.edu"),
                password: "hashed".to_string(),
                role,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    async fn principal_for(storage: &SeaOrmStorage, user_id: i64) -> Principal {
        let user = storage.get_user_by_id_impl(user_id).await.unwrap().unwrap();
        let faculty = storage.get_faculty_by_user_id_impl(user_id).await.unwrap();
        let student = storage.get_student_by_user_id_impl(user_id).await.unwrap();
        Principal::resolve(&user, faculty.as_ref(), student.as_ref())
    }

    // 两个院系；turing 教 compilers，noether 教 algebra；alice 只选 compilers，bob 两门都选
    async fn campus(storage: &SeaOrmStorage) -> Campus {
        let cs = create(storage, ResourceKind::Departments, json!({"name": "CS"})).await;
        let math = create(storage, ResourceKind::Departments, json!({"name": "Math"})).await;
        let cs_program = create(
            storage,
            ResourceKind::Programs,
            json!({"name": "BSc CS", "department_id": cs}),
        )
        .await;
        let math_program = create(
            storage,
            ResourceKind::Programs,
            json!({"name": "BSc Math", "department_id": math}),
        )
        .await;

        let turing_user = user(storage, "turing", UserRole::Faculty).await;
        let noether_user = user(storage, "noether", UserRole::Faculty).await;
        let alice_user = user(storage, "alice", UserRole::Student).await;
        let bob_user = user(storage, "bob_s", UserRole::Student).await;

        let turing = create(
            storage,
            ResourceKind::Faculty,
            json!({"user_id": turing_user, "department_id": cs}),
        )
        .await;
        let noether = create(
            storage,
            ResourceKind::Faculty,
            json!({"user_id": noether_user, "department_id": math}),
        )
        .await;
        let alice_id = create(
            storage,
            ResourceKind::Students,
            json!({"user_id": alice_user, "department_id": cs, "program_id": cs_program, "enrollment_date": "2024-09-01"}),
        )
        .await;
        let bob_id = create(
            storage,
            ResourceKind::Students,
            json!({"user_id": bob_user, "department_id": math, "program_id": math_program, "enrollment_date": "2024-09-01"}),
        )
        .await;

        let compilers = create(
            storage,
            ResourceKind::Courses,
            json!({"name": "Compilers", "code": "CS401", "program_id": cs_program, "faculty_id": turing}),
        )
        .await;
        let algebra = create(
            storage,
            ResourceKind::Courses,
            json!({"name": "Algebra", "code": "MA201", "program_id": math_program, "faculty_id": noether}),
        )
        .await;

        for (student, course) in [(alice_id, compilers), (bob_id, compilers), (bob_id, compilers), (bob_id, algebra)] {
            create(
                storage,
                ResourceKind::Enrollments,
                json!({"student_id": student, "course_id": course}),
            )
            .await;
        }
        for (student, course, grade) in [(alice_id, compilers, 91.0), (bob_id, compilers, 65.0), (bob_id, algebra, 72.5)] {
            create(
                storage,
                ResourceKind::Grades,
                json!({"student_id": student, "course_id": course, "grade": grade}),
            )
            .await;
        }
        create(
            storage,
            ResourceKind::Timetables,
            json!({"course_id": compilers, "day": "monday", "start_time": "09:00:00", "end_time": "10:30:00"}),
        )
        .await;
        create(
            storage,
            ResourceKind::Timetables,
            json!({"course_id": algebra, "day": "Tuesday", "start_time": "11:00:00", "end_time": "12:00:00"}),
        )
        .await;

        Campus {
            cs,
            math,
            cs_program,
            turing: principal_for(storage, turing_user).await,
            noether: principal_for(storage, noether_user).await,
            alice: principal_for(storage, alice_user).await,
            alice_id,
            bob_id,
            compilers,
            algebra,
        }
    }

    async fn list(
        storage: &SeaOrmStorage,
        kind: ResourceKind,
        principal: &Principal,
    ) -> Vec<Resource> {
        let visibility = kind
            .entity_kind()
            .map_or(crate::access::Visibility::All, |e| visible(e, principal));
        storage
            .list_resources_impl(
                kind,
                &visibility,
                PaginationQuery {
                    page: 1,
                    size: 100,
                },
            )
            .await
            .unwrap()
            .items
    }

    fn ids(items: &[Resource]) -> Vec<i64> {
        items.iter().map(Resource::id).collect()
    }

    #[tokio::test]
    async fn test_admin_sees_full_collections() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        assert_eq!(list(&storage, ResourceKind::Courses, &Principal::Admin).await.len(), 2);
        assert_eq!(list(&storage, ResourceKind::Grades, &Principal::Admin).await.len(), 3);
        assert_eq!(
            list(&storage, ResourceKind::Enrollments, &Principal::Admin).await.len(),
            4
        );
        assert!(campus.cs_program > 0);
    }

    #[tokio::test]
    async fn test_faculty_scope() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        let courses = list(&storage, ResourceKind::Courses, &campus.turing).await;
        assert_eq!(ids(&courses), vec![campus.compilers]);

        let grades = list(&storage, ResourceKind::Grades, &campus.turing).await;
        assert_eq!(grades.len(), 2);
        assert!(grades.iter().all(|g| matches!(g, Resource::Grade(g) if g.course_id == campus.compilers)));

        // bob 选了两次 compilers，仍只出现一次
        let students = list(&storage, ResourceKind::Students, &campus.turing).await;
        assert_eq!(ids(&students), vec![campus.alice_id, campus.bob_id]);

        let students = list(&storage, ResourceKind::Students, &campus.noether).await;
        assert_eq!(ids(&students), vec![campus.bob_id]);

        let colleagues = list(&storage, ResourceKind::Faculty, &campus.turing).await;
        assert_eq!(colleagues.len(), 1);

        let timetables = list(&storage, ResourceKind::Timetables, &campus.noether).await;
        assert!(matches!(&timetables[..], [Resource::Timetable(t)] if t.course_id == campus.algebra));
    }

    #[tokio::test]
    async fn test_student_scope() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        let grades = list(&storage, ResourceKind::Grades, &campus.alice).await;
        assert!(matches!(&grades[..], [Resource::Grade(g)] if g.student_id == campus.alice_id));

        let courses = list(&storage, ResourceKind::Courses, &campus.alice).await;
        assert_eq!(ids(&courses), vec![campus.compilers]);

        let me = list(&storage, ResourceKind::Students, &campus.alice).await;
        assert_eq!(ids(&me), vec![campus.alice_id]);

        let timetables = list(&storage, ResourceKind::Timetables, &campus.alice).await;
        assert!(matches!(&timetables[..], [Resource::Timetable(t)] if t.day == "Monday"));

        // 院系与专业不过滤
        assert_eq!(list(&storage, ResourceKind::Departments, &campus.alice).await.len(), 2);
    }

    #[tokio::test]
    async fn test_unlinked_principal_sees_nothing() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;
        let ghost = principal_for(&storage, user(&storage, "ghost", UserRole::Student).await).await;
        assert!(matches!(ghost, Principal::Unlinked { .. }));

        for kind in crate::models::resources::ResourceKind::ALL {
            if kind.entity_kind().is_some() {
                assert!(list(&storage, kind, &ghost).await.is_empty(), "{kind}");
                assert!(list(&storage, kind, &Principal::Other).await.is_empty(), "{kind}");
            }
        }

        let page = storage
            .list_resources_impl(
                ResourceKind::Grades,
                &visible(EntityKind::Grade, &ghost),
                PaginationQuery::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 0);
        assert!(campus.cs > 0);
    }

    #[tokio::test]
    async fn test_get_resource_respects_visibility() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        let hidden = storage
            .get_resource_impl(
                ResourceKind::Courses,
                campus.algebra,
                &visible(EntityKind::Course, &campus.alice),
            )
            .await
            .unwrap();
        assert!(hidden.is_none());

        let shown = storage
            .get_resource_impl(
                ResourceKind::Courses,
                campus.compilers,
                &visible(EntityKind::Course, &campus.alice),
            )
            .await
            .unwrap();
        assert!(matches!(shown, Some(Resource::Course(c)) if c.code == "CS401"));
    }

    #[tokio::test]
    async fn test_create_checks_references() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        let missing = CreateResourceRequest::parse(
            ResourceKind::Grades,
            json!({"student_id": 9999, "course_id": campus.compilers, "grade": 50}),
        )
        .unwrap();
        assert!(matches!(
            storage.create_resource_impl(missing).await,
            Err(UmsError::Validation(_))
        ));

        let alice_user = match campus.alice {
            Principal::Student(p) => p.user_id,
            _ => unreachable!(),
        };
        let duplicate = CreateResourceRequest::parse(
            ResourceKind::Students,
            json!({"user_id": alice_user, "enrollment_date": "2024-09-01"}),
        )
        .unwrap();
        assert!(matches!(
            storage.create_resource_impl(duplicate).await,
            Err(UmsError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_must_match_user_role() {
        let storage = memory_storage().await;
        let student_user = user(&storage, "carol", UserRole::Student).await;
        let faculty_user = user(&storage, "hopper", UserRole::Faculty).await;
        let other_user = user(&storage, "visitor", UserRole::Other).await;

        let cases = [
            (ResourceKind::Faculty, json!({"user_id": student_user})),
            (ResourceKind::Faculty, json!({"user_id": other_user})),
            (
                ResourceKind::Students,
                json!({"user_id": faculty_user, "enrollment_date": "2024-09-01"}),
            ),
        ];
        for (kind, body) in cases {
            let req = CreateResourceRequest::parse(kind, body).unwrap();
            assert!(matches!(
                storage.create_resource_impl(req).await,
                Err(UmsError::Validation(_))
            ));
        }

        // 角色一致时正常创建，且解析为对应身份
        create(&storage, ResourceKind::Faculty, json!({"user_id": faculty_user})).await;
        assert!(matches!(
            principal_for(&storage, faculty_user).await,
            Principal::Faculty(_)
        ));
        assert_eq!(
            principal_for(&storage, student_user).await,
            Principal::Unlinked {
                role: UserRole::Student
            }
        );
    }

    #[tokio::test]
    async fn test_enrollment_date_is_stamped() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        let enrollments = list(&storage, ResourceKind::Enrollments, &campus.alice).await;
        let today = chrono::Utc::now().date_naive();
        assert!(matches!(&enrollments[..], [Resource::Enrollment(e)] if e.enrolled_on == today));
    }

    #[tokio::test]
    async fn test_deletes_cascade_and_detach() {
        let storage = memory_storage().await;
        let campus = campus(&storage).await;

        assert!(
            storage
                .delete_resource_impl(ResourceKind::Courses, campus.compilers)
                .await
                .unwrap()
        );
        let grades = list(&storage, ResourceKind::Grades, &Principal::Admin).await;
        assert!(grades.iter().all(|g| matches!(g, Resource::Grade(g) if g.course_id == campus.algebra)));
        assert_eq!(list(&storage, ResourceKind::Timetables, &Principal::Admin).await.len(), 1);

        assert!(
            storage
                .delete_resource_impl(ResourceKind::Departments, campus.math)
                .await
                .unwrap()
        );
        let bob = storage
            .get_resource_impl(ResourceKind::Students, campus.bob_id, &crate::access::Visibility::All)
            .await
            .unwrap();
        assert!(matches!(bob, Some(Resource::Student(s)) if s.department_id.is_none() && s.program_id.is_none()));

        assert!(
            !storage
                .delete_resource_impl(ResourceKind::Departments, campus.math)
                .await
                .unwrap()
        );
    }
}
