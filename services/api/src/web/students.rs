//! services/api/src/web/students.rs
//!
//! The student dashboard endpoints and assignment submission. Every
//! `/api/students/{id}` route only serves the caller's own id.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::domain::UserUpdate;
use brightlearn_core::ports::PortError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::auth::{hash_for_request, normalize_email};
use crate::web::dto::{
    list, AssignmentGradeDto, CourseDto, EnrollmentCreated, MessageResponse, NotificationDto,
    SubmissionDto,
};
use crate::web::extract::{required, AssignmentId, Json, Path};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: CourseDto,
    /// Percentage of lessons completed.
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAssignmentRequest {
    pub content: Option<String>,
}

/// GET /api/students/{id}/courses
pub async fn enrolled_courses_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<EnrolledCourse>>, HttpError> {
    caller.ensure_is(student_id)?;
    let enrollments = state.db.list_enrollments_for_student(student_id).await?;

    let mut courses = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        let course = state.db.get_course(enrollment.course_id).await?;
        let progress = match state.db.get_progress(student_id, course.id).await {
            Ok(progress) => progress.overall_progress,
            Err(PortError::NotFound(_)) => 0,
            Err(e) => return Err(e.into()),
        };
        courses.push(EnrolledCourse {
            course: course.into(),
            progress,
            enrolled_at: enrollment.enrolled_at,
        });
    }
    Ok(Json(courses))
}

/// GET /api/students/{id}/grades - Graded assignment table
pub async fn student_grades_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<AssignmentGradeDto>>, HttpError> {
    caller.ensure_is(student_id)?;
    let grades = state.db.list_assignment_grades_for_student(student_id).await?;
    Ok(Json(list(grades)))
}

/// POST /api/students/{id}/enroll
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(req): Json<EnrollRequest>,
) -> Result<impl IntoResponse, HttpError> {
    caller.ensure_is(student_id)?;
    let course_id = req.course_id.ok_or_else(HttpError::missing_fields)?;
    let enrollment = state.db.enroll(student_id, course_id).await?;
    info!(%student_id, %course_id, "Enrolled student");
    Ok((
        StatusCode::CREATED,
        Json(EnrollmentCreated {
            enrollment_id: enrollment.id,
            message: "Enrolled successfully".to_string(),
        }),
    ))
}

/// GET /api/students/{id}/notifications
pub async fn student_notifications_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<NotificationDto>>, HttpError> {
    caller.ensure_is(student_id)?;
    let notifications = state.db.list_notifications(student_id).await?;
    Ok(Json(list(notifications)))
}

/// PATCH /api/students/{id}/profile
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    caller.ensure_is(student_id)?;
    let hashed_password = match req.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_for_request(&password)?),
        None => None,
    };
    let update = UserUpdate {
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        email: req.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()),
        school_email: None,
        hashed_password,
    };
    state.db.update_user(student_id, update).await?;
    Ok(Json(MessageResponse::new("Profile updated")))
}

/// POST /api/assignments/{id}/submit
pub async fn submit_assignment_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    AssignmentId(assignment_id): AssignmentId,
    Json(req): Json<SubmitAssignmentRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let content = required(req.content)?;
    let submission = state.db.submit_assignment(assignment_id, caller.id, &content).await?;
    info!(%assignment_id, student_id = %caller.id, "Received assignment submission");
    Ok((StatusCode::CREATED, Json(SubmissionDto::from(submission))))
}
