//! services/api/src/web/dto.rs
//!
//! The JSON shapes of the REST API. Field names are camelCase on the wire;
//! each DTO is built from its domain type with `From`.

use brightlearn_core::domain::{
    Achievement, Activity, Assignment, AssignmentGrade, AuditLog, Course, Grade, Lesson,
    Notification, Progress, Quiz, Resource, Submission, User,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Generic Responses
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Each create endpoint names its new id after the record it made.

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreated {
    pub course_id: Uuid,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCreated {
    pub assignment_id: Uuid,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizCreated {
    pub quiz_id: Uuid,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCreated {
    pub teacher_id: Uuid,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreated {
    pub record_id: Uuid,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentCreated {
    pub enrollment_id: Uuid,
    pub message: String,
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub school_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            status: user.status.as_str().to_string(),
            school_email: user.school_email,
            created_at: user.created_at,
        }
    }
}

#[derive(Clone, Serialize, ToSchema)]
pub struct InstructorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for InstructorSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

//=========================================================================================
// Courses
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: Uuid,
    pub course_id: Uuid,
    pub position: u32,
    pub title: String,
    pub content: String,
}

impl From<Lesson> for LessonDto {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            position: lesson.position,
            title: lesson.title,
            content: lesson.content,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ResourceDto {
    pub id: Uuid,
    pub title: String,
    pub url: String,
}

impl From<Resource> for ResourceDto {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            title: resource.title,
            url: resource.url,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: Option<Uuid>,
    pub lessons: Vec<LessonDto>,
    pub resources: Vec<ResourceDto>,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor_id: course.instructor_id,
            lessons: course.lessons.into_iter().map(Into::into).collect(),
            resources: course.resources.into_iter().map(Into::into).collect(),
            created_at: course.created_at,
        }
    }
}

/// A catalog entry: the course plus who teaches it.
#[derive(Serialize, ToSchema)]
pub struct CatalogCourse {
    #[serde(flatten)]
    pub course: CourseDto,
    pub instructor: Option<InstructorSummary>,
}

#[derive(Deserialize, ToSchema)]
pub struct LessonInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResourceInput {
    pub title: String,
    pub url: String,
}

//=========================================================================================
// Quizzes & Grades
//=========================================================================================

/// A question as shown before answering: no answer, no explanation.
#[derive(Serialize, ToSchema)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub passing_score: u8,
    pub questions: Vec<PublicQuestion>,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            title: quiz.title,
            passing_score: quiz.passing_score,
            questions: quiz
                .questions
                .into_iter()
                .map(|q| PublicQuestion {
                    prompt: q.prompt,
                    options: q.options,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u8,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Grade> for GradeDto {
    fn from(grade: Grade) -> Self {
        Self {
            id: grade.id,
            user_id: grade.user_id,
            course_id: grade.course_id,
            quiz_id: grade.quiz_id,
            score: grade.score,
            correct_answers: grade.correct_answers,
            total_questions: grade.total_questions,
            status: grade.status.as_str().to_string(),
            created_at: grade.created_at,
        }
    }
}

//=========================================================================================
// Progress
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressDto {
    pub lesson_id: Uuid,
    pub completed: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompletionDto {
    pub quiz_id: Uuid,
    pub score: u8,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDto {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lessons: Vec<LessonProgressDto>,
    pub quizzes: Vec<QuizCompletionDto>,
    pub overall_progress: u8,
    pub quizzes_completed: u32,
    pub updated_at: DateTime<Utc>,
}

impl From<Progress> for ProgressDto {
    fn from(progress: Progress) -> Self {
        Self {
            user_id: progress.user_id,
            course_id: progress.course_id,
            lessons: progress
                .lessons
                .into_iter()
                .map(|l| LessonProgressDto {
                    lesson_id: l.lesson_id,
                    completed: l.completed,
                })
                .collect(),
            quizzes: progress
                .quizzes
                .into_iter()
                .map(|q| QuizCompletionDto {
                    quiz_id: q.quiz_id,
                    score: q.score,
                    passed: q.passed,
                    completed_at: q.completed_at,
                })
                .collect(),
            overall_progress: progress.overall_progress,
            quizzes_completed: progress.quizzes_completed,
            updated_at: progress.updated_at,
        }
    }
}

//=========================================================================================
// Engagement
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            title: n.title,
            message: n.message,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDto {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementDto {
    fn from(a: Achievement) -> Self {
        Self {
            id: a.id,
            code: a.kind.code().to_string(),
            title: a.kind.title().to_string(),
            description: a.kind.description().to_string(),
            earned_at: a.earned_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub description: String,
    pub score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityDto {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            kind: a.kind.as_str().to_string(),
            description: a.description,
            score: a.score,
            created_at: a.created_at,
        }
    }
}

//=========================================================================================
// Assignments
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentDto {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            course_id: a.course_id,
            title: a.title,
            description: a.description,
            due_date: a.due_date,
            kind: a.kind,
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionDto {
    fn from(s: Submission) -> Self {
        Self {
            assignment_id: s.assignment_id,
            student_id: s.student_id,
            content: s.content,
            grade: s.grade,
            feedback: s.feedback,
            submitted_at: s.submitted_at,
            graded_at: s.graded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AssignmentGradeDto {
    pub course: String,
    pub assignment: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

impl From<AssignmentGrade> for AssignmentGradeDto {
    fn from(g: AssignmentGrade) -> Self {
        Self {
            course: g.course_title,
            assignment: g.assignment_title,
            kind: g.kind,
            score: g.score,
            feedback: g.feedback,
        }
    }
}

//=========================================================================================
// Administration
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogDto {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            actor_id: log.actor_id,
            action: log.action,
            target: log.target,
            created_at: log.created_at,
        }
    }
}

/// Converts a list of domain values into their DTOs.
pub fn list<T, D: From<T>>(items: Vec<T>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}
