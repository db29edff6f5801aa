//! 预导入模块，方便使用

pub use super::attendance::{
    ActiveModel as AttendanceActiveModel, Entity as Attendance, Model as AttendanceModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::departments::{
    ActiveModel as DepartmentActiveModel, Entity as Departments, Model as DepartmentModel,
};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
pub use super::faculty::{ActiveModel as FacultyActiveModel, Entity as Faculty, Model as FacultyModel};
pub use super::grades::{ActiveModel as GradeActiveModel, Entity as Grades, Model as GradeModel};
pub use super::programs::{
    ActiveModel as ProgramActiveModel, Entity as Programs, Model as ProgramModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::timetables::{
    ActiveModel as TimetableActiveModel, Entity as Timetables, Model as TimetableModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
pub use super::withdrawals::{
    ActiveModel as WithdrawalActiveModel, Entity as Withdrawals, Model as WithdrawalModel,
};
