//! services/api/src/web/engagement.rs
//!
//! Notifications, achievements, the activity feed, grades and the student
//! dashboard.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::dashboard::summarize;
use brightlearn_core::domain::NewNotification;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{list, AchievementDto, ActivityDto, GradeDto, NotificationDto};
use crate::web::extract::{required, Json, NotificationId, Path};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

const RECENT_ACTIVITY_LIMIT: u32 = 10;
const DASHBOARD_ACTIVITY_LIMIT: usize = 5;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ReadAllResponse {
    pub updated: u64,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub name: String,
    pub overall_progress: u8,
    pub total_courses: u32,
    pub completed_courses: u32,
    pub avg_score: u8,
    pub passing: bool,
    /// Consecutive days with activity, ending today or yesterday.
    pub streak: u32,
    pub recent_activity: Vec<ActivityDto>,
}

//=========================================================================================
// Notifications
//=========================================================================================

/// GET /api/notifications
pub async fn my_notifications_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<NotificationDto>>, HttpError> {
    let notifications = state.db.list_notifications(caller.id).await?;
    Ok(Json(list(notifications)))
}

/// GET /api/notifications/user/{id}
pub async fn user_notifications_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<NotificationDto>>, HttpError> {
    caller.ensure_can_read(user_id)?;
    let notifications = state.db.list_notifications(user_id).await?;
    Ok(Json(list(notifications)))
}

/// POST /api/notifications - Staff send a notification to a user
pub async fn create_notification_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, HttpError> {
    caller.ensure_staff()?;
    let user_id = req.user_id.ok_or_else(HttpError::missing_fields)?;
    let message = required(req.message)?;
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Notification".to_string());

    let notification = state
        .db
        .create_notification(NewNotification { user_id, title, message })
        .await?;
    info!(notification_id = %notification.id, %user_id, sender = %caller.id, "Sent notification");

    Ok((StatusCode::CREATED, Json(NotificationDto::from(notification))))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    NotificationId(notification_id): NotificationId,
) -> Result<Json<NotificationDto>, HttpError> {
    let notification = state.db.mark_notification_read(notification_id, caller.id).await?;
    Ok(Json(notification.into()))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<ReadAllResponse>, HttpError> {
    let updated = state.db.mark_all_notifications_read(caller.id).await?;
    Ok(Json(ReadAllResponse {
        updated,
        message: "All notifications marked as read".to_string(),
    }))
}

//=========================================================================================
// Achievements, Activity, Grades
//=========================================================================================

/// GET /api/achievements
pub async fn my_achievements_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<AchievementDto>>, HttpError> {
    let achievements = state.db.list_achievements(caller.id).await?;
    Ok(Json(list(achievements)))
}

/// GET /api/achievements/user/{id}
pub async fn user_achievements_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<AchievementDto>>, HttpError> {
    caller.ensure_can_read(user_id)?;
    let achievements = state.db.list_achievements(user_id).await?;
    Ok(Json(list(achievements)))
}

/// GET /api/activities/recent
pub async fn recent_activity_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<ActivityDto>>, HttpError> {
    let activities = state.db.list_activities(caller.id, RECENT_ACTIVITY_LIMIT).await?;
    Ok(Json(list(activities)))
}

/// GET /api/grades/user/{id} - Quiz grades, newest first
pub async fn user_grades_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<GradeDto>>, HttpError> {
    caller.ensure_can_read(user_id)?;
    let grades = state.db.list_grades_for_user(user_id).await?;
    Ok(Json(list(grades)))
}

//=========================================================================================
// Dashboard
//=========================================================================================

/// GET /api/dashboard/{id} - Progress, score and streak summary for one user
#[utoipa::path(
    get,
    path = "/api/dashboard/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 403, description = "Not the caller's dashboard", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DashboardResponse>, HttpError> {
    caller.ensure_can_read(user_id)?;
    let user = state.db.get_user(user_id).await?;
    let progress = state.db.list_progress_for_user(user_id).await?;
    let grades = state.db.list_grades_for_user(user_id).await?;
    let activities = state.db.list_activities(user_id, u32::MAX).await?;

    let activity_days: Vec<NaiveDate> = activities.iter().map(|a| a.created_at.date_naive()).collect();
    let summary = summarize(&progress, &grades, &activity_days, Utc::now().date_naive());

    Ok(Json(DashboardResponse {
        name: user.name,
        overall_progress: summary.overall_progress,
        total_courses: summary.total_courses,
        completed_courses: summary.completed_courses,
        avg_score: summary.avg_score,
        passing: summary.passing,
        streak: summary.streak,
        recent_activity: activities
            .into_iter()
            .take(DASHBOARD_ACTIVITY_LIMIT)
            .map(ActivityDto::from)
            .collect(),
    }))
}
