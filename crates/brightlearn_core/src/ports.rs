//! crates/brightlearn_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AccountStatus, Achievement, Activity, Assignment, AssignmentGrade, AuditLog, Course,
    CourseUpdate, DisciplinaryRecord, Enrollment, Grade, Lesson, NewAssignment,
    NewCourse, NewDisciplinaryRecord, NewNotification, NewQuiz, NewUser, Notification,
    PlatformCounts, Progress, Quiz, Role, Submission, User, UserCredentials, UserUpdate,
};
use crate::grading::GradeOutcome;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Composite Write Inputs and Outputs
//=========================================================================================

/// Everything needed to persist one graded quiz attempt.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub course_id: Uuid,
    pub quiz_title: String,
    pub outcome: GradeOutcome,
    pub submitted_at: DateTime<Utc>,
}

/// What a quiz attempt changed.
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub grade: Grade,
    /// The updated tracker, if the user had one for the quiz's course.
    pub progress: Option<Progress>,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Clone)]
pub struct LessonMarked {
    pub progress: Progress,
    pub achievements: Vec<Achievement>,
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users_by_role(&self, role: Role) -> PortResult<Vec<User>>;

    /// Fails with `Conflict` when the new email belongs to another account.
    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> PortResult<User>;

    async fn set_user_status(&self, user_id: Uuid, status: AccountStatus) -> PortResult<User>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn create_course(&self, course: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn list_courses_by_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<Course>>;

    async fn update_course(&self, course_id: Uuid, update: CourseUpdate) -> PortResult<Course>;

    /// Removes the course together with its lessons, quizzes, grades,
    /// enrollments, progress and assignments.
    async fn delete_course(&self, course_id: Uuid) -> PortResult<()>;

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn create_quiz(&self, quiz: NewQuiz) -> PortResult<Quiz>;

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    async fn list_quizzes_for_course(&self, course_id: Uuid) -> PortResult<Vec<Quiz>>;

    /// Appends the grade and applies every side effect of the attempt
    /// (progress, activity, achievements) in one transaction.
    async fn record_quiz_attempt(&self, attempt: QuizAttempt) -> PortResult<RecordedAttempt>;

    /// Newest first.
    async fn list_grades_for_user(&self, user_id: Uuid) -> PortResult<Vec<Grade>>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Progress>;

    async fn list_progress_for_user(&self, user_id: Uuid) -> PortResult<Vec<Progress>>;

    /// Creates the tracker if needed and sets one lesson's completion flag.
    async fn mark_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
        at: DateTime<Utc>,
    ) -> PortResult<LessonMarked>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Fails with `Conflict` when already enrolled. Also creates the progress tracker.
    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> PortResult<Enrollment>;

    async fn list_enrollments_for_student(&self, student_id: Uuid) -> PortResult<Vec<Enrollment>>;

    /// Distinct students enrolled in any course taught by the instructor.
    async fn list_students_for_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<User>>;

    async fn create_assignment(&self, assignment: NewAssignment) -> PortResult<Assignment>;

    async fn get_assignment(&self, assignment_id: Uuid) -> PortResult<Assignment>;

    /// Fails with `Conflict` when the student already submitted.
    async fn submit_assignment(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        content: &str,
    ) -> PortResult<Submission>;

    async fn list_submissions(&self, assignment_id: Uuid) -> PortResult<Vec<Submission>>;

    /// Grades the submission and notifies the student in one transaction.
    async fn grade_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        grade: f64,
        feedback: Option<String>,
    ) -> PortResult<Submission>;

    async fn list_assignment_grades_for_student(&self, student_id: Uuid) -> PortResult<Vec<AssignmentGrade>>;

    /// Scores of every graded submission across the instructor's courses.
    async fn graded_scores_for_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<f64>>;
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn create_notification(&self, notification: NewNotification) -> PortResult<Notification>;

    /// Newest first.
    async fn list_notifications(&self, user_id: Uuid) -> PortResult<Vec<Notification>>;

    /// Fails with `NotFound` unless the notification belongs to `user_id`.
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> PortResult<Notification>;

    /// Returns the number of notifications that changed.
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> PortResult<u64>;

    async fn list_achievements(&self, user_id: Uuid) -> PortResult<Vec<Achievement>>;

    /// Newest first, at most `limit` entries.
    async fn list_activities(&self, user_id: Uuid, limit: u32) -> PortResult<Vec<Activity>>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn record_disciplinary(&self, record: NewDisciplinaryRecord) -> PortResult<DisciplinaryRecord>;

    async fn append_audit_log(&self, actor_id: Uuid, action: &str, target: &str) -> PortResult<AuditLog>;

    /// Newest first.
    async fn list_audit_logs(&self) -> PortResult<Vec<AuditLog>>;

    async fn platform_counts(&self) -> PortResult<PlatformCounts>;
}

/// The full storage surface the web layer depends on.
pub trait DatabaseService:
    UserStore + CourseStore + QuizStore + ProgressStore + EnrollmentStore + EngagementStore + AdminStore
{
}

impl<T> DatabaseService for T where
    T: UserStore + CourseStore + QuizStore + ProgressStore + EnrollmentStore + EngagementStore + AdminStore
{
}
