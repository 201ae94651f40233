//! services/api/src/web/progress.rs
//!
//! Per-course completion tracking for the calling user.

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{list, AchievementDto, ProgressDto};
use crate::web::extract::{CourseId, Json, LessonId};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub course_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    /// Defaults to `true`.
    pub completed: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressUpdateResponse {
    pub progress: ProgressDto,
    /// Achievements unlocked by this update.
    pub achievements: Vec<AchievementDto>,
}

/// Sets one lesson flag and returns the recomputed tracker.
async fn mark(
    state: &AppState,
    caller: AuthUser,
    lesson_id: Uuid,
    completed: bool,
) -> Result<ProgressUpdateResponse, HttpError> {
    let marked = state.db.mark_lesson(caller.id, lesson_id, completed, Utc::now()).await?;
    info!(
        user_id = %caller.id,
        %lesson_id,
        completed,
        overall = marked.progress.overall_progress,
        "Updated lesson progress"
    );
    Ok(ProgressUpdateResponse {
        progress: marked.progress.into(),
        achievements: list(marked.achievements),
    })
}

/// GET /api/progress - Every tracker of the caller
pub async fn list_progress_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<ProgressDto>>, HttpError> {
    let progress = state.db.list_progress_for_user(caller.id).await?;
    Ok(Json(list(progress)))
}

/// POST /api/progress - Mark a lesson of a course complete or incomplete
#[utoipa::path(
    post,
    path = "/api/progress",
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Updated tracker", body = ProgressUpdateResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 404, description = "Course or lesson not found", body = ErrorBody)
    )
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<ProgressUpdateResponse>, HttpError> {
    let (Some(course_id), Some(lesson_id)) = (req.course_id, req.lesson_id) else {
        return Err(HttpError::missing_fields());
    };
    let course = state.db.get_course(course_id).await?;
    if !course.lessons.iter().any(|l| l.id == lesson_id) {
        return Err(HttpError::not_found("Lesson not found"));
    }
    let response = mark(&state, caller, lesson_id, req.completed.unwrap_or(true)).await?;
    Ok(Json(response))
}

/// GET /api/courses/{id}/progress - The caller's tracker for one course
pub async fn course_progress_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    CourseId(course_id): CourseId,
) -> Result<Json<ProgressDto>, HttpError> {
    Ok(Json(state.db.get_progress(caller.id, course_id).await?.into()))
}

/// POST /api/lessons/{id}/complete
pub async fn complete_lesson_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    LessonId(lesson_id): LessonId,
) -> Result<Json<ProgressUpdateResponse>, HttpError> {
    Ok(Json(mark(&state, caller, lesson_id, true).await?))
}
