//! 报表计算
//!
//! 纯内存计算，输入为 [`ReportDataset`] 快照。所有排序都是全序：
//! 先按统计值，再按分组 id 升序，空值排最后；两位小数的舍入在排序之后进行。

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::academics::entities::{Course, Department, Program};
use crate::models::analytics::{
    CourseAverage, CourseCount, DepartmentCount, DepartmentTopStudents, FacultyLoad, GradeValueCount,
    GroupAttendance, GroupAverage, GroupCount, GroupKey, GroupLevel, ProgramCount, ReportDataset,
    ReportScope, ReportUser, StatusCount, StudentAbsences, StudentAverage, StudentCourseAbsences,
};
use crate::models::people::entities::{Faculty, Student};
use crate::models::records::entities::AttendanceStatus;

const TOP_STUDENTS_LIMIT: usize = 10;
const LOW_ATTENDANCE_LIMIT: usize = 10;
const POPULAR_COURSES_LIMIT: usize = 10;
const DEPARTMENT_TOP_LIMIT: usize = 3;
const PROGRAM_TOP_COURSES_LIMIT: usize = 5;
const PROGRAM_TOP_STUDENTS_LIMIT: usize = 3;
const LOW_PERFORMANCE_THRESHOLD: f64 = 50.0;

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// 有值的 id 升序，空值在后
fn nulls_last(a: &Option<i64>, b: &Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// 均值降序，空值在后
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: i64,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, i64> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn mean_by<K: Ord>(rows: impl Iterator<Item = (K, f64)>) -> BTreeMap<K, Mean> {
    let mut means: BTreeMap<K, Mean> = BTreeMap::new();
    for (key, value) in rows {
        means.entry(key).or_default().push(value);
    }
    means
}

// 计数降序，同数按键升序
fn ranked_counts<K: Ord>(counts: BTreeMap<K, i64>) -> Vec<(K, i64)> {
    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

pub struct ReportEngine<'a> {
    ds: &'a ReportDataset,
    departments: HashMap<i64, &'a Department>,
    programs: HashMap<i64, &'a Program>,
    courses: HashMap<i64, &'a Course>,
    students: HashMap<i64, &'a Student>,
    faculty: HashMap<i64, &'a Faculty>,
    users: HashMap<i64, &'a ReportUser>,
}

impl<'a> ReportEngine<'a> {
    pub fn new(ds: &'a ReportDataset) -> Self {
        Self {
            ds,
            departments: ds.departments.iter().map(|d| (d.id, d)).collect(),
            programs: ds.programs.iter().map(|p| (p.id, p)).collect(),
            courses: ds.courses.iter().map(|c| (c.id, c)).collect(),
            students: ds.students.iter().map(|s| (s.id, s)).collect(),
            faculty: ds.faculty.iter().map(|f| (f.id, f)).collect(),
            users: ds.users.iter().map(|u| (u.id, u)).collect(),
        }
    }

    // ---------- 范围判断 ----------

    fn student_in(&self, student_id: i64, scope: ReportScope) -> bool {
        let Some(student) = self.students.get(&student_id) else {
            return false;
        };
        match scope {
            ReportScope::All => true,
            ReportScope::Department(id) => student.department_id == Some(id),
            ReportScope::Program(id) => student.program_id == Some(id),
        }
    }

    fn course_in(&self, course_id: i64, scope: ReportScope) -> bool {
        let Some(course) = self.courses.get(&course_id) else {
            return false;
        };
        match scope {
            ReportScope::All => true,
            ReportScope::Department(id) => self
                .programs
                .get(&course.program_id)
                .is_some_and(|p| p.department_id == id),
            ReportScope::Program(id) => course.program_id == id,
        }
    }

    // 按专业筛选时取该专业所属院系
    fn faculty_in(&self, faculty: &Faculty, scope: ReportScope) -> bool {
        match scope {
            ReportScope::All => true,
            ReportScope::Department(id) => faculty.department_id == Some(id),
            ReportScope::Program(id) => self
                .programs
                .get(&id)
                .is_some_and(|p| faculty.department_id == Some(p.department_id)),
        }
    }

    // ---------- 名称查找 ----------

    fn department_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.departments.get(&id))
            .map(|d| d.name.clone())
    }

    fn program_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.programs.get(&id)).map(|p| p.name.clone())
    }

    fn course_name(&self, id: i64) -> String {
        self.courses
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn student_user(&self, student_id: i64) -> Option<&'a ReportUser> {
        self.students
            .get(&student_id)
            .and_then(|s| self.users.get(&s.user_id))
            .copied()
    }

    fn student_average(&self, student_id: i64, average: f64) -> StudentAverage {
        let user = self.student_user(student_id);
        StudentAverage {
            student_id,
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            name: user.map(|u| u.full_name()).unwrap_or_default(),
            average_grade: round2(average),
        }
    }

    /// 学生平均分，降序，同分按学生 id 升序
    fn ranked_student_means(&self, include: impl Fn(&Student) -> bool) -> Vec<(i64, f64)> {
        let means = mean_by(
            self.ds
                .grades
                .iter()
                .filter(|g| self.students.get(&g.student_id).is_some_and(|s| include(*s)))
                .map(|g| (g.student_id, g.grade)),
        );
        let mut rows: Vec<(i64, f64)> = means
            .into_iter()
            .filter_map(|(id, mean)| mean.value().map(|v| (id, v)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    fn department_counts(&self, keys: impl Iterator<Item = Option<i64>>) -> Vec<DepartmentCount> {
        let mut rows: Vec<_> = count_by(keys).into_iter().collect();
        rows.sort_by(|a, b| nulls_last(&a.0, &b.0));
        rows.into_iter()
            .map(|(id, total)| DepartmentCount {
                department_id: id,
                department: self.department_name(id),
                total,
            })
            .collect()
    }

    // ---------- 1-10 ----------

    /// 1. 各院系学生数
    pub fn students_per_department(&self, scope: ReportScope) -> Vec<DepartmentCount> {
        self.department_counts(
            self.ds
                .students
                .iter()
                .filter(|s| self.student_in(s.id, scope))
                .map(|s| s.department_id),
        )
    }

    /// 2. 各院系教师数
    pub fn faculty_per_department(&self, scope: ReportScope) -> Vec<DepartmentCount> {
        self.department_counts(
            self.ds
                .faculty
                .iter()
                .filter(|f| self.faculty_in(f, scope))
                .map(|f| f.department_id),
        )
    }

    /// 3. 各专业选课数，按课程所属专业归组
    pub fn enrollment_per_program(&self, scope: ReportScope) -> Vec<ProgramCount> {
        let counts = count_by(
            self.ds
                .enrollments
                .iter()
                .filter(|e| self.course_in(e.course_id, scope))
                .filter_map(|e| self.courses.get(&e.course_id))
                .map(|c| c.program_id),
        );
        counts
            .into_iter()
            .map(|(id, total)| ProgramCount {
                program_id: Some(id),
                program: self.program_name(Some(id)),
                total,
            })
            .collect()
    }

    /// 4. 出勤状态分布
    pub fn attendance_distribution(&self, scope: ReportScope) -> Vec<StatusCount> {
        count_by(
            self.ds
                .attendance
                .iter()
                .filter(|a| self.course_in(a.course_id, scope))
                .map(|a| a.status),
        )
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
    }

    /// 5. 成绩分布，按分值精确归组，分值降序
    pub fn grade_distribution(&self, scope: ReportScope) -> Vec<GradeValueCount> {
        let mut values: Vec<f64> = self
            .ds
            .grades
            .iter()
            .filter(|g| self.course_in(g.course_id, scope))
            .map(|g| g.grade)
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));

        let mut rows: Vec<GradeValueCount> = Vec::new();
        for value in values {
            match rows.last_mut() {
                Some(last) if last.grade == value => last.count += 1,
                _ => rows.push(GradeValueCount {
                    grade: value,
                    count: 1,
                }),
            }
        }
        rows
    }

    /// 6. 各课程退课数
    pub fn withdrawals_per_course(&self, scope: ReportScope) -> Vec<CourseCount> {
        let counts = count_by(
            self.ds
                .withdrawals
                .iter()
                .filter(|w| self.course_in(w.course_id, scope))
                .map(|w| w.course_id),
        );
        self.course_counts(ranked_counts(counts))
    }

    fn course_counts(&self, rows: Vec<(i64, i64)>) -> Vec<CourseCount> {
        rows.into_iter()
            .map(|(course_id, total)| CourseCount {
                course_id,
                course: self.course_name(course_id),
                total,
            })
            .collect()
    }

    /// 7. 平均分最高的学生
    pub fn top_students(&self, scope: ReportScope) -> Vec<StudentAverage> {
        self.ranked_student_means(|s| self.student_in(s.id, scope))
            .into_iter()
            .take(TOP_STUDENTS_LIMIT)
            .map(|(id, avg)| self.student_average(id, avg))
            .collect()
    }

    fn absences_by_student(&self, scope: ReportScope) -> Vec<(i64, i64)> {
        ranked_counts(count_by(
            self.ds
                .attendance
                .iter()
                .filter(|a| a.status == AttendanceStatus::Absent)
                .filter(|a| self.student_in(a.student_id, scope))
                .map(|a| a.student_id),
        ))
    }

    /// 8. 缺勤最多的学生
    pub fn low_attendance_students(&self, scope: ReportScope) -> Vec<StudentAbsences> {
        self.absences_by_student(scope)
            .into_iter()
            .take(LOW_ATTENDANCE_LIMIT)
            .map(|(student_id, absences)| {
                let user = self.student_user(student_id);
                StudentAbsences {
                    student_id,
                    username: user.map(|u| u.username.clone()).unwrap_or_default(),
                    name: user.map(|u| u.full_name()).unwrap_or_default(),
                    absences,
                }
            })
            .collect()
    }

    /// 9. 选课人数最多的课程
    pub fn popular_courses(&self, scope: ReportScope) -> Vec<CourseCount> {
        let counts = count_by(
            self.ds
                .enrollments
                .iter()
                .filter(|e| self.course_in(e.course_id, scope))
                .map(|e| e.course_id),
        );
        let mut rows = ranked_counts(counts);
        rows.truncate(POPULAR_COURSES_LIMIT);
        self.course_counts(rows)
    }

    /// 10. 教师授课门数，未分配教师的课程单独成组
    pub fn faculty_teaching_load(&self, scope: ReportScope) -> Vec<FacultyLoad> {
        let mut rows: Vec<_> = count_by(
            self.ds
                .courses
                .iter()
                .filter(|c| self.course_in(c.id, scope))
                .map(|c| c.faculty_id),
        )
        .into_iter()
        .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| nulls_last(&a.0, &b.0)));

        rows.into_iter()
            .map(|(faculty_id, total_courses)| FacultyLoad {
                faculty_id,
                username: faculty_id
                    .and_then(|id| self.faculty.get(&id))
                    .and_then(|f| self.users.get(&f.user_id))
                    .map(|u| u.username.clone()),
                total_courses,
            })
            .collect()
    }

    // ---------- 11-17 ----------

    /// 11. 专业所属院系的前三名学生，专业不存在时为空
    pub fn top_students_by_department(&self, program_id: i64) -> Vec<DepartmentTopStudents> {
        let Some(department) = self
            .programs
            .get(&program_id)
            .and_then(|p| self.departments.get(&p.department_id))
        else {
            return Vec::new();
        };

        let top_students = self
            .ranked_student_means(|s| s.department_id == Some(department.id))
            .into_iter()
            .take(DEPARTMENT_TOP_LIMIT)
            .map(|(id, avg)| self.student_average(id, avg))
            .collect();

        vec![DepartmentTopStudents {
            department_id: department.id,
            department: department.name.clone(),
            top_students,
        }]
    }

    fn groups(&self, level: GroupLevel) -> Vec<GroupKey> {
        match level {
            GroupLevel::Department => self
                .ds
                .departments
                .iter()
                .map(|d| GroupKey::Department {
                    department_id: d.id,
                    department: d.name.clone(),
                })
                .collect(),
            GroupLevel::Program => self
                .ds
                .programs
                .iter()
                .map(|p| GroupKey::Program {
                    program_id: p.id,
                    program: p.name.clone(),
                })
                .collect(),
        }
    }

    // 记录通过学生的院系或专业归组
    fn student_group(&self, student_id: i64, level: GroupLevel) -> Option<i64> {
        let student = self.students.get(&student_id)?;
        match level {
            GroupLevel::Department => student.department_id,
            GroupLevel::Program => student.program_id,
        }
    }

    /// 12. 各组平均分，无成绩的组为 null
    pub fn average_grade_by(&self, level: GroupLevel) -> Vec<GroupAverage> {
        let means = mean_by(self.ds.grades.iter().filter_map(|g| {
            self.student_group(g.student_id, level)
                .map(|group| (group, g.grade))
        }));

        let mut rows: Vec<(GroupKey, Option<f64>)> = self
            .groups(level)
            .into_iter()
            .map(|group| {
                let avg = means.get(&group.id()).and_then(Mean::value);
                (group, avg)
            })
            .collect();
        rows.sort_by(|a, b| desc_nulls_last(a.1, b.1).then_with(|| a.0.id().cmp(&b.0.id())));

        rows.into_iter()
            .map(|(group, avg)| GroupAverage {
                group,
                average_grade: avg.map(round2),
            })
            .collect()
    }

    /// 13. 各组退课数
    pub fn withdrawals_by(&self, level: GroupLevel) -> Vec<GroupCount> {
        let counts = count_by(
            self.ds
                .withdrawals
                .iter()
                .filter_map(|w| self.student_group(w.student_id, level)),
        );

        let mut rows: Vec<GroupCount> = self
            .groups(level)
            .into_iter()
            .map(|group| GroupCount {
                withdrawals: counts.get(&group.id()).copied().unwrap_or(0),
                group,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.withdrawals
                .cmp(&a.withdrawals)
                .then_with(|| a.group.id().cmp(&b.group.id()))
        });
        rows
    }

    /// 14. 各组出勤率（出勤次数 / 总记录数 × 100）
    pub fn attendance_summary_by(&self, level: GroupLevel) -> Vec<GroupAttendance> {
        let rates = mean_by(self.ds.attendance.iter().filter_map(|a| {
            let present = if a.status == AttendanceStatus::Present {
                100.0
            } else {
                0.0
            };
            self.student_group(a.student_id, level)
                .map(|group| (group, present))
        }));

        let mut rows: Vec<(GroupKey, Option<f64>)> = self
            .groups(level)
            .into_iter()
            .map(|group| {
                let rate = rates.get(&group.id()).and_then(Mean::value);
                (group, rate)
            })
            .collect();
        rows.sort_by(|a, b| desc_nulls_last(a.1, b.1).then_with(|| a.0.id().cmp(&b.0.id())));

        rows.into_iter()
            .map(|(group, rate)| GroupAttendance {
                group,
                average_attendance: rate.map(round2),
            })
            .collect()
    }

    /// 15. 专业内平均分最高的课程（按学生所属专业筛选）
    pub fn top_courses_by_program(&self, program_id: i64) -> Vec<CourseAverage> {
        let means = mean_by(
            self.ds
                .grades
                .iter()
                .filter(|g| {
                    self.students
                        .get(&g.student_id)
                        .is_some_and(|s| s.program_id == Some(program_id))
                })
                .map(|g| (g.course_id, g.grade)),
        );
        let mut rows: Vec<(i64, f64)> = means
            .into_iter()
            .filter_map(|(id, mean)| mean.value().map(|v| (id, v)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        rows.into_iter()
            .take(PROGRAM_TOP_COURSES_LIMIT)
            .map(|(course_id, avg)| CourseAverage {
                course_id,
                course: self.course_name(course_id),
                average_grade: round2(avg),
            })
            .collect()
    }

    /// 16. 专业内平均分低于 50 的学生，升序
    pub fn low_performing_students(&self, program_id: i64) -> Vec<StudentAverage> {
        let mut rows: Vec<(i64, f64)> = self
            .ranked_student_means(|s| s.program_id == Some(program_id))
            .into_iter()
            .filter(|(_, avg)| *avg < LOW_PERFORMANCE_THRESHOLD)
            .collect();
        rows.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        rows.into_iter()
            .map(|(id, avg)| self.student_average(id, avg))
            .collect()
    }

    /// 17. 专业内前三名学生
    pub fn top_students_by_program(&self, program_id: i64) -> Vec<StudentAverage> {
        self.ranked_student_means(|s| s.program_id == Some(program_id))
            .into_iter()
            .take(PROGRAM_TOP_STUDENTS_LIMIT)
            .map(|(id, avg)| self.student_average(id, avg))
            .collect()
    }

    // ---------- 补充报表 ----------

    /// 各专业学生数，降序
    pub fn students_per_program(&self, scope: ReportScope) -> Vec<ProgramCount> {
        let mut rows: Vec<_> = count_by(
            self.ds
                .students
                .iter()
                .filter(|s| self.student_in(s.id, scope))
                .map(|s| s.program_id),
        )
        .into_iter()
        .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| nulls_last(&a.0, &b.0)));

        rows.into_iter()
            .map(|(id, total)| ProgramCount {
                program_id: id,
                program: self.program_name(id),
                total,
            })
            .collect()
    }

    /// 全部学生平均分，不截断
    pub fn student_gpa(&self, scope: ReportScope) -> Vec<StudentAverage> {
        self.ranked_student_means(|s| self.student_in(s.id, scope))
            .into_iter()
            .map(|(id, avg)| self.student_average(id, avg))
            .collect()
    }

    /// 按 (学生, 课程) 统计缺勤
    pub fn absence_summary(&self, scope: ReportScope) -> Vec<StudentCourseAbsences> {
        let counts = count_by(
            self.ds
                .attendance
                .iter()
                .filter(|a| a.status == AttendanceStatus::Absent)
                .filter(|a| self.student_in(a.student_id, scope))
                .map(|a| (a.student_id, a.course_id)),
        );

        ranked_counts(counts)
            .into_iter()
            .map(|((student_id, course_id), absences)| StudentCourseAbsences {
                student_id,
                username: self
                    .student_user(student_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                course_id,
                course: self.course_name(course_id),
                absences,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::entities::{Attendance, Enrollment, Grade, Withdrawal};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn user(id: i64, username: &str) -> ReportUser {
        ReportUser {
            id,
            username: username.into(),
            first_name: username.to_uppercase(),
            last_name: "Test".into(),
        }
    }

    struct Builder {
        ds: ReportDataset,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                ds: ReportDataset::default(),
            }
        }

        fn department(mut self, id: i64, name: &str) -> Self {
            self.ds.departments.push(Department {
                id,
                name: name.into(),
            });
            self
        }

        fn program(mut self, id: i64, department_id: i64) -> Self {
            self.ds.programs.push(Program {
                id,
                name: format!("P{id}"),
                department_id,
            });
            self
        }

        fn course(mut self, id: i64, program_id: i64, faculty_id: Option<i64>) -> Self {
            self.ds.courses.push(Course {
                id,
                name: format!("C{id}"),
                code: format!("CS{id}"),
                program_id,
                faculty_id,
            });
            self
        }

        fn student(mut self, id: i64, department_id: Option<i64>, program_id: Option<i64>) -> Self {
            let user_id = 100 + id;
            self.ds.users.push(user(user_id, &format!("s{id}")));
            self.ds.students.push(Student {
                id,
                user_id,
                department_id,
                program_id,
                enrollment_date: day(),
            });
            self
        }

        fn faculty(mut self, id: i64, department_id: Option<i64>) -> Self {
            let user_id = 200 + id;
            self.ds.users.push(user(user_id, &format!("f{id}")));
            self.ds.faculty.push(Faculty {
                id,
                user_id,
                department_id,
            });
            self
        }

        fn grade(mut self, student_id: i64, course_id: i64, grade: f64) -> Self {
            let id = self.ds.grades.len() as i64 + 1;
            self.ds.grades.push(Grade {
                id,
                student_id,
                course_id,
                grade,
            });
            self
        }

        fn enroll(mut self, student_id: i64, course_id: i64) -> Self {
            let id = self.ds.enrollments.len() as i64 + 1;
            self.ds.enrollments.push(Enrollment {
                id,
                student_id,
                course_id,
                enrolled_on: day(),
            });
            self
        }

        fn withdraw(mut self, student_id: i64, course_id: i64) -> Self {
            let id = self.ds.withdrawals.len() as i64 + 1;
            self.ds.withdrawals.push(Withdrawal {
                id,
                student_id,
                course_id,
                reason: String::new(),
                date: day(),
            });
            self
        }

        fn attend(mut self, student_id: i64, course_id: i64, status: AttendanceStatus) -> Self {
            let id = self.ds.attendance.len() as i64 + 1;
            self.ds.attendance.push(Attendance {
                id,
                student_id,
                course_id,
                date: day(),
                status,
            });
            self
        }

        fn build(self) -> ReportDataset {
            self.ds
        }
    }

    // 两个院系，各一个专业和一门课
    fn campus() -> Builder {
        Builder::new()
            .department(1, "X")
            .department(2, "Y")
            .program(10, 1)
            .program(20, 2)
            .course(100, 10, Some(1))
            .course(200, 20, None)
            .faculty(1, Some(1))
    }

    #[test]
    fn test_average_grade_by_department_example() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .student(2, Some(2), Some(20))
            .grade(1, 100, 80.0)
            .grade(1, 100, 90.0)
            .grade(2, 200, 70.0)
            .build();
        let rows = ReportEngine::new(&ds).average_grade_by(GroupLevel::Department);

        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            serde_json::json!([
                {"department_id": 1, "department": "X", "average_grade": 85.0},
                {"department_id": 2, "department": "Y", "average_grade": 70.0}
            ])
        );
    }

    #[test]
    fn test_group_without_rows_has_null_average() {
        let ds = campus()
            .department(3, "Empty")
            .student(1, Some(1), Some(10))
            .grade(1, 100, 60.0)
            .attend(1, 100, AttendanceStatus::Present)
            .build();
        let engine = ReportEngine::new(&ds);

        let grades = engine.average_grade_by(GroupLevel::Department);
        assert_eq!(grades.len(), 3);
        assert_eq!(grades[0].average_grade, Some(60.0));
        assert_eq!(grades[1].average_grade, None);
        assert_eq!(grades[1].group.id(), 2);
        assert_eq!(grades[2].average_grade, None);

        let attendance = engine.attendance_summary_by(GroupLevel::Program);
        assert_eq!(attendance[0].average_attendance, Some(100.0));
        assert_eq!(attendance[1].average_attendance, None);

        let withdrawals = engine.withdrawals_by(GroupLevel::Department);
        assert!(withdrawals.iter().all(|w| w.withdrawals == 0));
        let ids: Vec<_> = withdrawals.iter().map(|w| w.group.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_attendance_percentage() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .attend(1, 100, AttendanceStatus::Present)
            .attend(1, 100, AttendanceStatus::Present)
            .attend(1, 100, AttendanceStatus::Absent)
            .build();
        let rows = ReportEngine::new(&ds).attendance_summary_by(GroupLevel::Department);
        assert_eq!(rows[0].average_attendance, Some(66.67));
    }

    #[test]
    fn test_top_students_cutoff_and_order() {
        let mut builder = campus();
        for id in 1..=12 {
            builder = builder
                .student(id, Some(1), Some(10))
                .grade(id, 100, 40.0 + id as f64);
        }
        // 与 12 号同分，id 更小排在前
        builder = builder.student(13, Some(1), Some(10)).grade(13, 100, 52.0);
        let ds = builder.build();
        let rows = ReportEngine::new(&ds).top_students(ReportScope::All);

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].student_id, 12);
        assert_eq!(rows[1].student_id, 13);
        assert!(rows
            .windows(2)
            .all(|w| w[0].average_grade >= w[1].average_grade));
        assert_eq!(rows[0].username, "s12");
        assert_eq!(rows[0].name, "S12 Test");
    }

    #[test]
    fn test_rounding_happens_after_sorting() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .student(2, Some(1), Some(10))
            .grade(1, 100, 70.004)
            .grade(2, 100, 70.001)
            .build();
        let rows = ReportEngine::new(&ds).top_students(ReportScope::All);
        assert_eq!(rows[0].student_id, 1);
        assert_eq!(rows[0].average_grade, 70.0);
        assert_eq!(rows[1].average_grade, 70.0);
    }

    #[test]
    fn test_low_performing_students_strictly_below_threshold() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .student(2, Some(1), Some(10))
            .student(3, Some(1), Some(10))
            .student(4, Some(2), Some(20))
            .grade(1, 100, 49.0)
            .grade(2, 100, 50.0)
            .grade(3, 100, 20.0)
            .grade(3, 100, 40.0)
            .grade(4, 200, 10.0)
            .build();
        let rows = ReportEngine::new(&ds).low_performing_students(10);
        let ids: Vec<_> = rows.iter().map(|r| r.student_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(rows[0].average_grade, 30.0);
    }

    #[test]
    fn test_counts_keep_null_group_last() {
        let ds = campus()
            .student(1, None, None)
            .student(2, Some(2), Some(20))
            .student(3, Some(1), Some(10))
            .student(4, Some(2), Some(20))
            .build();
        let engine = ReportEngine::new(&ds);

        let rows = engine.students_per_department(ReportScope::All);
        let keys: Vec<_> = rows.iter().map(|r| (r.department_id, r.total)).collect();
        assert_eq!(keys, vec![(Some(1), 1), (Some(2), 2), (None, 1)]);
        assert_eq!(rows[2].department, None);

        let per_program = engine.students_per_program(ReportScope::All);
        assert_eq!(per_program[0].program_id, Some(20));
        assert_eq!(per_program.last().unwrap().program_id, None);
    }

    #[test]
    fn test_scope_anchoring() {
        let ds = campus()
            .faculty(2, Some(2))
            .student(1, Some(1), Some(10))
            .student(2, Some(2), Some(20))
            .enroll(1, 100)
            .enroll(2, 100)
            .enroll(2, 200)
            .build();
        let engine = ReportEngine::new(&ds);

        // 按学生院系
        let students = engine.students_per_department(ReportScope::Department(2));
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].department_id, Some(2));

        // 专业范围映射到专业所属院系
        let faculty = engine.faculty_per_department(ReportScope::Program(20));
        assert_eq!(faculty.len(), 1);
        assert_eq!(faculty[0].department_id, Some(2));

        // 按课程所属专业
        let popular = engine.popular_courses(ReportScope::Department(1));
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].course_id, 100);
        assert_eq!(popular[0].total, 2);

        let per_program = engine.enrollment_per_program(ReportScope::All);
        assert_eq!(per_program.len(), 2);
        assert_eq!(per_program[0].total, 2);
    }

    #[test]
    fn test_grade_distribution_descending_by_value() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .grade(1, 100, 70.0)
            .grade(1, 100, 95.5)
            .grade(1, 100, 70.0)
            .build();
        let rows = ReportEngine::new(&ds).grade_distribution(ReportScope::All);
        assert_eq!(
            rows,
            vec![
                GradeValueCount {
                    grade: 95.5,
                    count: 1
                },
                GradeValueCount {
                    grade: 70.0,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_withdrawals_and_absences() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .student(2, Some(2), Some(20))
            .withdraw(1, 100)
            .withdraw(2, 200)
            .withdraw(2, 200)
            .attend(1, 100, AttendanceStatus::Absent)
            .attend(2, 200, AttendanceStatus::Absent)
            .attend(2, 200, AttendanceStatus::Absent)
            .attend(2, 200, AttendanceStatus::Present)
            .build();
        let engine = ReportEngine::new(&ds);

        let per_course = engine.withdrawals_per_course(ReportScope::All);
        assert_eq!(per_course[0].course_id, 200);
        assert_eq!(per_course[0].total, 2);

        let low = engine.low_attendance_students(ReportScope::All);
        assert_eq!(low[0].student_id, 2);
        assert_eq!(low[0].absences, 2);

        let summary = engine.absence_summary(ReportScope::All);
        assert_eq!(summary[0].course, "C200");
        assert_eq!(summary[0].absences, 2);

        let distribution = engine.attendance_distribution(ReportScope::All);
        assert_eq!(distribution[0].status, AttendanceStatus::Absent);
        assert_eq!(distribution[0].count, 3);
    }

    #[test]
    fn test_faculty_teaching_load() {
        let ds = campus().course(101, 10, Some(1)).build();
        let rows = ReportEngine::new(&ds).faculty_teaching_load(ReportScope::All);
        assert_eq!(rows[0].faculty_id, Some(1));
        assert_eq!(rows[0].username.as_deref(), Some("f1"));
        assert_eq!(rows[0].total_courses, 2);
        assert_eq!(rows[1].faculty_id, None);
    }

    #[test]
    fn test_program_reports() {
        let ds = campus()
            .course(101, 10, None)
            .student(1, Some(1), Some(10))
            .student(2, Some(1), Some(10))
            .student(3, Some(1), None)
            .grade(1, 100, 90.0)
            .grade(1, 101, 60.0)
            .grade(2, 100, 80.0)
            .grade(3, 100, 99.0)
            .build();
        let engine = ReportEngine::new(&ds);

        let courses = engine.top_courses_by_program(10);
        assert_eq!(courses[0].course_id, 100);
        assert_eq!(courses[0].average_grade, 85.0);

        let top = engine.top_students_by_program(10);
        let ids: Vec<_> = top.iter().map(|s| s.student_id).collect();
        assert_eq!(ids, vec![2, 1]);

        // 院系内的学生都参与排名，包括没有专业的学生
        let by_department = engine.top_students_by_department(10);
        assert_eq!(by_department.len(), 1);
        assert_eq!(by_department[0].department, "X");
        assert_eq!(by_department[0].top_students[0].student_id, 3);

        assert!(engine.top_students_by_department(999).is_empty());
        assert!(engine.top_students_by_program(999).is_empty());
    }

    #[test]
    fn test_reports_are_deterministic() {
        let ds = campus()
            .student(1, Some(1), Some(10))
            .student(2, Some(2), Some(20))
            .grade(1, 100, 75.0)
            .grade(2, 200, 75.0)
            .build();
        let first = serde_json::to_string(&ReportEngine::new(&ds).student_gpa(ReportScope::All))
            .unwrap();
        let second = serde_json::to_string(&ReportEngine::new(&ds).student_gpa(ReportScope::All))
            .unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"student_id\":1").unwrap() < first.find("\"student_id\":2").unwrap());
    }
}
