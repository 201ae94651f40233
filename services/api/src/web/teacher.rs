//! services/api/src/web/teacher.rs
//!
//! Teacher endpoints: course authoring, assignments and grading, and the
//! per-teacher student and analytics views. A teacher only changes courses
//! they own.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::domain::{Course, NewAssignment};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::courses::{CreateCourseRequest, UpdateCourseRequest};
use crate::web::dto::{
    list, AssignmentCreated, CourseCreated, CourseDto, MessageResponse, SubmissionDto, UserDto,
};
use crate::web::extract::{required, AssignmentId, CourseId, Json, Path};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub course_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct GradeSubmissionRequest {
    pub grade: Option<f64>,
    pub feedback: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAnalytics {
    pub total_students: u64,
    /// Mean of every graded submission; 0 when nothing is graded yet.
    pub avg_grade: f64,
}

/// Loads a course and checks the caller teaches it.
pub async fn owned_course(state: &AppState, caller: &AuthUser, course_id: Uuid) -> Result<Course, HttpError> {
    let course = state.db.get_course(course_id).await?;
    if course.instructor_id != Some(caller.id) {
        return Err(HttpError::forbidden());
    }
    Ok(course)
}

//=========================================================================================
// Courses
//=========================================================================================

/// GET /api/teacher/{id}/courses
pub async fn teacher_courses_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<Vec<CourseDto>>, HttpError> {
    caller.ensure_is(teacher_id)?;
    let courses = state.db.list_courses_by_instructor(teacher_id).await?;
    Ok(Json(list(courses)))
}

/// POST /api/teacher/courses
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let new_course = req.into_new_course(Some(caller.id))?;
    let course = state.db.create_course(new_course).await?;
    info!(course_id = %course.id, teacher_id = %caller.id, "Created course");
    Ok((
        StatusCode::CREATED,
        Json(CourseCreated {
            course_id: course.id,
            message: "Course created".to_string(),
        }),
    ))
}

/// PATCH /api/teacher/courses/{id}
pub async fn update_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    CourseId(course_id): CourseId,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    owned_course(&state, &caller, course_id).await?;
    let mut update = req.into_update();
    // Ownership only moves through the admin endpoints.
    update.instructor_id = None;
    state.db.update_course(course_id, update).await?;
    Ok(Json(MessageResponse::new("Course updated")))
}

/// DELETE /api/teacher/courses/{id}
pub async fn delete_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    CourseId(course_id): CourseId,
) -> Result<Json<MessageResponse>, HttpError> {
    owned_course(&state, &caller, course_id).await?;
    state.db.delete_course(course_id).await?;
    info!(%course_id, teacher_id = %caller.id, "Deleted course");
    Ok(Json(MessageResponse::new("Course deleted")))
}

//=========================================================================================
// Assignments
//=========================================================================================

/// POST /api/teacher/assignments
pub async fn create_assignment_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let course_id = req.course_id.ok_or_else(HttpError::missing_fields)?;
    let title = required(req.title)?;
    let kind = required(req.kind)?;
    owned_course(&state, &caller, course_id).await?;

    let assignment = state
        .db
        .create_assignment(NewAssignment {
            course_id,
            title,
            description: req.description,
            due_date: req.due_date,
            kind,
        })
        .await?;
    info!(assignment_id = %assignment.id, %course_id, "Created assignment");
    Ok((
        StatusCode::CREATED,
        Json(AssignmentCreated {
            assignment_id: assignment.id,
            message: "Assignment created".to_string(),
        }),
    ))
}

/// GET /api/teacher/assignments/{id}/submissions
pub async fn list_submissions_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    AssignmentId(assignment_id): AssignmentId,
) -> Result<Json<Vec<SubmissionDto>>, HttpError> {
    let assignment = state.db.get_assignment(assignment_id).await?;
    owned_course(&state, &caller, assignment.course_id).await?;
    let submissions = state.db.list_submissions(assignment_id).await?;
    Ok(Json(list(submissions)))
}

/// PATCH /api/teacher/assignments/{id}/submissions/{studentId}
pub async fn grade_submission_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path((assignment_id, student_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<GradeSubmissionRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let grade = req
        .grade
        .filter(|g| g.is_finite())
        .ok_or_else(HttpError::missing_fields)?;
    let assignment = state.db.get_assignment(assignment_id).await?;
    owned_course(&state, &caller, assignment.course_id).await?;

    state
        .db
        .grade_submission(assignment_id, student_id, grade, req.feedback)
        .await?;
    info!(%assignment_id, %student_id, grade, "Graded submission");

    Ok(Json(MessageResponse::new("Submission graded")))
}

//=========================================================================================
// Students & Analytics
//=========================================================================================

/// GET /api/teacher/{id}/students - Distinct students across the teacher's courses
pub async fn teacher_students_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<Vec<UserDto>>, HttpError> {
    caller.ensure_is(teacher_id)?;
    let students = state.db.list_students_for_instructor(teacher_id).await?;
    Ok(Json(list(students)))
}

/// GET /api/teacher/{id}/analytics
pub async fn teacher_analytics_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<TeacherAnalytics>, HttpError> {
    caller.ensure_is(teacher_id)?;
    let students = state.db.list_students_for_instructor(teacher_id).await?;
    let scores = state.db.graded_scores_for_instructor(teacher_id).await?;
    Ok(Json(TeacherAnalytics {
        total_students: students.len() as u64,
        avg_grade: mean(&scores),
    }))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], 0.0)]
    #[case(&[80.0], 80.0)]
    #[case(&[70.0, 90.0, 95.0], 85.0)]
    fn average_grade(#[case] scores: &[f64], #[case] expected: f64) {
        assert!((mean(scores) - expected).abs() < f64::EPSILON);
    }
}
