//! crates/brightlearn_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::achievements::AchievementKind;

/// Returned when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseKindError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Teachers and admins may read records that belong to other users.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(ParseKindError::new("role", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(ParseKindError::new("account status", other)),
        }
    }
}

/// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub school_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
    pub school_email: Option<String>,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub school_email: Option<String>,
    pub hashed_password: Option<String>,
}

//=========================================================================================
// Courses
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub position: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Soft reference; the instructor account may have been deactivated.
    pub instructor_id: Option<Uuid>,
    pub lessons: Vec<Lesson>,
    pub resources: Vec<Resource>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn lesson_ids(&self) -> Vec<Uuid> {
        self.lessons.iter().map(|l| l.id).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub instructor_id: Option<Uuid>,
    pub lessons: Vec<NewLesson>,
    pub resources: Vec<NewResource>,
}

/// Replacing `lessons` or `resources` swaps the whole list.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub lessons: Option<Vec<NewLesson>>,
    pub resources: Option<Vec<NewResource>>,
}

//=========================================================================================
// Quizzes & Grades
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: Vec<Question>,
    pub passing_score: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub course_id: Uuid,
    pub title: String,
    pub questions: Vec<Question>,
    pub passing_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeStatus {
    Passed,
    Failed,
}

impl GradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeStatus::Passed => "passed",
            GradeStatus::Failed => "failed",
        }
    }
}

impl FromStr for GradeStatus {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(GradeStatus::Passed),
            "failed" => Ok(GradeStatus::Failed),
            other => Err(ParseKindError::new("grade status", other)),
        }
    }
}

/// A persisted record of one quiz attempt's outcome for one user.
#[derive(Debug, Clone)]
pub struct Grade {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u8,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub status: GradeStatus,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Progress & Enrollment
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCompletion {
    pub quiz_id: Uuid,
    pub score: u8,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// A per-user-per-course completion tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lessons: Vec<LessonProgress>,
    pub quizzes: Vec<QuizCompletion>,
    pub overall_progress: u8,
    pub quizzes_completed: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

//=========================================================================================
// Assignments
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// Free-form category such as "quiz" or "essay".
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// One row of a student's assignment grade table.
#[derive(Debug, Clone)]
pub struct AssignmentGrade {
    pub course_title: String,
    pub assignment_title: String,
    pub kind: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

//=========================================================================================
// Notifications, Achievements, Activities
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: AchievementKind,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    QuizSubmitted,
    LessonCompleted,
    Enrolled,
    AssignmentSubmitted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::QuizSubmitted => "quiz_submitted",
            ActivityKind::LessonCompleted => "lesson_completed",
            ActivityKind::Enrolled => "enrolled",
            ActivityKind::AssignmentSubmitted => "assignment_submitted",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiz_submitted" => Ok(ActivityKind::QuizSubmitted),
            "lesson_completed" => Ok(ActivityKind::LessonCompleted),
            "enrolled" => Ok(ActivityKind::Enrolled),
            "assignment_submitted" => Ok(ActivityKind::AssignmentSubmitted),
            other => Err(ParseKindError::new("activity kind", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub description: String,
    pub score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub description: String,
    pub score: Option<u8>,
}

//=========================================================================================
// Administration
//=========================================================================================

#[derive(Debug, Clone)]
pub struct DisciplinaryRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub description: String,
    pub action: String,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDisciplinaryRecord {
    pub student_id: Uuid,
    pub description: String,
    pub action: String,
    pub recorded_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCounts {
    pub total_users: u64,
    pub total_courses: u64,
    /// Courses with at least one lesson.
    pub active_courses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("student", Role::Student)]
    #[case("teacher", Role::Teacher)]
    #[case("admin", Role::Admin)]
    fn role_labels_parse_back(#[case] label: &str, #[case] role: Role) {
        assert_eq!(label.parse::<Role>().unwrap(), role);
        assert_eq!(role.as_str(), label);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "invalid role 'superuser'");
    }

    #[test]
    fn only_teachers_and_admins_are_staff() {
        assert!(!Role::Student.is_staff());
        assert!(Role::Teacher.is_staff());
        assert!(Role::Admin.is_staff());
    }
}
