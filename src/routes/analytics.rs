use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::analytics::ScopeParams;
use crate::models::users::entities::UserRole;
use crate::services::AnalyticsService;
use crate::utils::SafeProgramIdI64;

// 懒加载的全局 AnalyticsService 实例
static ANALYTICS_SERVICE: Lazy<AnalyticsService> = Lazy::new(AnalyticsService::new_lazy);

// 带可选院系/专业范围的报表
macro_rules! scoped_report {
    ($name:ident, $label:literal, $method:ident) => {
        pub async fn $name(
            req: HttpRequest,
            query: web::Query<ScopeParams>,
        ) -> ActixResult<HttpResponse> {
            ANALYTICS_SERVICE
                .scoped(&query, $label, &req, |engine, scope| engine.$method(scope))
                .await
        }
    };
}

// 指定专业的报表
macro_rules! program_report {
    ($name:ident, $label:literal, $method:ident) => {
        pub async fn $name(req: HttpRequest, program: SafeProgramIdI64) -> ActixResult<HttpResponse> {
            ANALYTICS_SERVICE
                .for_program(program.0, $label, &req, |engine, id| engine.$method(id))
                .await
        }
    };
}

// 按院系或专业分组的报表
macro_rules! grouped_report {
    ($name:ident, $label:literal, $method:ident) => {
        pub async fn $name(req: HttpRequest, level: web::Path<String>) -> ActixResult<HttpResponse> {
            ANALYTICS_SERVICE
                .grouped(&level, $label, &req, |engine, level| engine.$method(level))
                .await
        }
    };
}

scoped_report!(students_per_department, "Students per department", students_per_department);
scoped_report!(faculty_per_department, "Faculty per department", faculty_per_department);
scoped_report!(enrollment_per_program, "Enrollment per program", enrollment_per_program);
scoped_report!(attendance_distribution, "Attendance distribution", attendance_distribution);
scoped_report!(grade_distribution, "Grade distribution", grade_distribution);
scoped_report!(withdrawals_per_course, "Withdrawals per course", withdrawals_per_course);
scoped_report!(top_students, "Top performing students", top_students);
scoped_report!(low_attendance_students, "Low attendance students", low_attendance_students);
scoped_report!(popular_courses, "Popular courses", popular_courses);
scoped_report!(faculty_teaching_load, "Faculty teaching load", faculty_teaching_load);
scoped_report!(students_per_program, "Students per program", students_per_program);
scoped_report!(student_gpa, "Student GPA", student_gpa);
scoped_report!(absence_summary, "Absence summary", absence_summary);

program_report!(top_students_by_department, "Top students by department", top_students_by_department);
program_report!(top_courses_by_program, "Top courses by program", top_courses_by_program);
program_report!(low_performing_students, "Low performing students", low_performing_students);
program_report!(top_students_by_program, "Top students by program", top_students_by_program);

grouped_report!(average_grade, "Average grade", average_grade_by);
grouped_report!(withdrawal_rate, "Withdrawal rate", withdrawals_by);
grouped_report!(attendance_summary, "Attendance summary", attendance_summary_by);

// 配置路由
pub fn configure_analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/analytics")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RateLimit::per_role())
            .wrap(middlewares::RequireJWT)
            .route("/students-per-department", web::get().to(students_per_department))
            .route("/faculty-per-department", web::get().to(faculty_per_department))
            .route("/enrollment-per-program", web::get().to(enrollment_per_program))
            .route("/attendance-distribution", web::get().to(attendance_distribution))
            .route("/grades-distribution", web::get().to(grade_distribution))
            .route("/withdrawals-per-course", web::get().to(withdrawals_per_course))
            .route("/top-performing-students", web::get().to(top_students))
            .route("/low-attendance-students", web::get().to(low_attendance_students))
            .route("/popular-courses", web::get().to(popular_courses))
            .route("/faculty-teaching-load", web::get().to(faculty_teaching_load))
            .route(
                "/top-students/program/{program_id}",
                web::get().to(top_students_by_department),
            )
            // {level}: department | program
            .route("/average-grades/{level}", web::get().to(average_grade))
            .route("/withdrawal-rate/{level}", web::get().to(withdrawal_rate))
            .route("/attendance-summary/{level}", web::get().to(attendance_summary))
            .route(
                "/top-courses/program/{program_id}",
                web::get().to(top_courses_by_program),
            )
            .route(
                "/low-performing-students/program/{program_id}",
                web::get().to(low_performing_students),
            )
            .route(
                "/programs/{program_id}/top-students",
                web::get().to(top_students_by_program),
            )
            .route("/students-per-program", web::get().to(students_per_program))
            .route("/student-gpa", web::get().to(student_gpa))
            .route("/absence-summary", web::get().to(absence_summary)),
    );
}
