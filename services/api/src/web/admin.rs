//! services/api/src/web/admin.rs
//!
//! Administration endpoints. Every mutation leaves an audit log entry; a
//! failure to write that entry is logged but does not fail the request.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::domain::{
    AccountStatus, NewDisciplinaryRecord, NewUser, PlatformCounts, Role, User, UserUpdate,
};
use brightlearn_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::auth::{hash_for_request, normalize_email};
use crate::web::courses::{with_instructors, CreateCourseRequest, UpdateCourseRequest};
use crate::web::dto::{
    list, AuditLogDto, CatalogCourse, CourseCreated, MessageResponse, RecordCreated, TeacherCreated,
    UserDto,
};
use crate::web::extract::{required, CourseId, Json, Path};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub school_email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub school_email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisciplinaryRequest {
    pub student_id: Option<Uuid>,
    pub description: Option<String>,
    pub action: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAnalytics {
    pub total_users: u64,
    pub total_courses: u64,
    pub active_courses: u64,
}

impl From<PlatformCounts> for PlatformAnalytics {
    fn from(counts: PlatformCounts) -> Self {
        Self {
            total_users: counts.total_users,
            total_courses: counts.total_courses,
            active_courses: counts.active_courses,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn audit(state: &AppState, caller: &AuthUser, action: &str, target: impl ToString) {
    let target = target.to_string();
    if let Err(e) = state.db.append_audit_log(caller.id, action, &target).await {
        error!(actor_id = %caller.id, action, %target, "Failed to write audit log: {:?}", e);
    }
}

/// Loads a user and checks they hold `role`; anyone else reads as missing.
async fn account_with_role(state: &AppState, user_id: Uuid, role: Role) -> Result<User, HttpError> {
    let missing = || match role {
        Role::Teacher => HttpError::not_found("Teacher not found"),
        Role::Student => HttpError::not_found("Student not found"),
        Role::Admin => HttpError::not_found("User not found"),
    };
    match state.db.get_user(user_id).await {
        Ok(user) if user.role == role => Ok(user),
        Ok(_) => Err(missing()),
        Err(PortError::NotFound(_)) => Err(missing()),
        Err(e) => Err(e.into()),
    }
}

fn account_update(req: UpdateAccountRequest) -> Result<UserUpdate, HttpError> {
    let hashed_password = match req.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_for_request(&password)?),
        None => None,
    };
    Ok(UserUpdate {
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        email: req.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()),
        school_email: req.school_email,
        hashed_password,
    })
}

async fn update_account(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    role: Role,
    req: UpdateAccountRequest,
) -> Result<Json<MessageResponse>, HttpError> {
    account_with_role(state, user_id, role).await?;
    state.db.update_user(user_id, account_update(req)?).await?;
    audit(state, caller, &format!("update_{}", role), user_id).await;
    let message = match role {
        Role::Teacher => "Teacher updated",
        _ => "Student updated",
    };
    Ok(Json(MessageResponse::new(message)))
}

async fn deactivate_account(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    role: Role,
) -> Result<Json<MessageResponse>, HttpError> {
    account_with_role(state, user_id, role).await?;
    state.db.set_user_status(user_id, AccountStatus::Inactive).await?;
    audit(state, caller, &format!("deactivate_{}", role), user_id).await;
    info!(%user_id, %role, admin_id = %caller.id, "Deactivated account");
    let message = match role {
        Role::Teacher => "Teacher deactivated",
        _ => "Student deactivated",
    };
    Ok(Json(MessageResponse::new(message)))
}

//=========================================================================================
// Teachers
//=========================================================================================

/// GET /api/admin/teachers
pub async fn list_teachers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, HttpError> {
    let teachers = state.db.list_users_by_role(Role::Teacher).await?;
    Ok(Json(list(teachers)))
}

/// POST /api/admin/teachers
#[utoipa::path(
    post,
    path = "/api/admin/teachers",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher account created", body = TeacherCreated),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn create_teacher_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateTeacherRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let name = required(req.name)?;
    let email = normalize_email(&required(req.email)?);
    let password = required(req.password)?;
    let school_email = required(req.school_email)?;

    let teacher = state
        .db
        .create_user(NewUser {
            name: name.trim().to_string(),
            email,
            hashed_password: hash_for_request(&password)?,
            role: Role::Teacher,
            school_email: Some(school_email),
        })
        .await?;
    audit(&state, &caller, "create_teacher", teacher.id).await;
    info!(teacher_id = %teacher.id, admin_id = %caller.id, "Created teacher account");

    Ok((
        StatusCode::CREATED,
        Json(TeacherCreated {
            teacher_id: teacher.id,
            message: "Teacher created".to_string(),
        }),
    ))
}

/// PATCH /api/admin/teachers/{id}
pub async fn update_teacher_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(teacher_id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    update_account(&state, &caller, teacher_id, Role::Teacher, req).await
}

/// DELETE /api/admin/teachers/{id} - Deactivates the account
pub async fn deactivate_teacher_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpError> {
    deactivate_account(&state, &caller, teacher_id, Role::Teacher).await
}

//=========================================================================================
// Students
//=========================================================================================

/// GET /api/admin/students
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, HttpError> {
    let students = state.db.list_users_by_role(Role::Student).await?;
    Ok(Json(list(students)))
}

/// PATCH /api/admin/students/{id}
pub async fn update_student_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    update_account(&state, &caller, student_id, Role::Student, req).await
}

/// DELETE /api/admin/students/{id} - Deactivates the account
pub async fn deactivate_student_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpError> {
    deactivate_account(&state, &caller, student_id, Role::Student).await
}

/// POST /api/admin/disciplinary
pub async fn disciplinary_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<DisciplinaryRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let student_id = req.student_id.ok_or_else(HttpError::missing_fields)?;
    let description = required(req.description)?;
    let action = required(req.action)?;
    account_with_role(&state, student_id, Role::Student).await?;

    let record = state
        .db
        .record_disciplinary(NewDisciplinaryRecord {
            student_id,
            description,
            action,
            recorded_by: caller.id,
        })
        .await?;
    audit(&state, &caller, "disciplinary_action", student_id).await;

    Ok((
        StatusCode::CREATED,
        Json(RecordCreated {
            record_id: record.id,
            message: "Disciplinary action recorded".to_string(),
        }),
    ))
}

//=========================================================================================
// Courses
//=========================================================================================

/// GET /api/admin/courses
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogCourse>>, HttpError> {
    let courses = state.db.list_courses().await?;
    Ok(Json(with_instructors(state.db.as_ref(), courses).await?))
}

/// POST /api/admin/courses - Create a course for any instructor
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let instructor_id = req.instructor_id.ok_or_else(HttpError::missing_fields)?;
    account_with_role(&state, instructor_id, Role::Teacher).await?;

    let course = state.db.create_course(req.into_new_course(Some(instructor_id))?).await?;
    audit(&state, &caller, "create_course", course.id).await;
    info!(course_id = %course.id, %instructor_id, admin_id = %caller.id, "Created course");

    Ok((
        StatusCode::CREATED,
        Json(CourseCreated {
            course_id: course.id,
            message: "Course created".to_string(),
        }),
    ))
}

/// PATCH /api/admin/courses/{id}
pub async fn update_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    CourseId(course_id): CourseId,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    if let Some(instructor_id) = req.instructor_id {
        account_with_role(&state, instructor_id, Role::Teacher).await?;
    }
    state.db.update_course(course_id, req.into_update()).await?;
    audit(&state, &caller, "update_course", course_id).await;
    Ok(Json(MessageResponse::new("Course updated")))
}

/// DELETE /api/admin/courses/{id}
pub async fn delete_course_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    CourseId(course_id): CourseId,
) -> Result<Json<MessageResponse>, HttpError> {
    state.db.delete_course(course_id).await?;
    audit(&state, &caller, "delete_course", course_id).await;
    info!(%course_id, admin_id = %caller.id, "Deleted course");
    Ok(Json(MessageResponse::new("Course deleted")))
}

//=========================================================================================
// Reporting
//=========================================================================================

/// GET /api/admin/analytics
pub async fn analytics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlatformAnalytics>, HttpError> {
    Ok(Json(state.db.platform_counts().await?.into()))
}

/// GET /api/admin/audit-logs - Newest first
pub async fn audit_logs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuditLogDto>>, HttpError> {
    let logs = state.db.list_audit_logs().await?;
    Ok(Json(list(logs)))
}
