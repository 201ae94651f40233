//! services/api/src/web/courses.rs
//!
//! The course catalog, lessons, and the course payloads shared by the teacher
//! and admin endpoints.

use axum::extract::State;
use brightlearn_core::domain::{Course, CourseUpdate, NewCourse, NewLesson, NewResource};
use brightlearn_core::ports::{DatabaseService, PortError};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{AssignmentDto, CatalogCourse, InstructorSummary, LessonDto, LessonInput, ResourceInput};
use crate::web::extract::{required, AssignmentId, CourseId, Json, LessonId};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Course Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Only honoured for admins; teachers always own what they create.
    pub instructor_id: Option<Uuid>,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
}

impl CreateCourseRequest {
    pub fn into_new_course(self, instructor_id: Option<Uuid>) -> Result<NewCourse, HttpError> {
        Ok(NewCourse {
            title: required(self.title)?,
            description: required(self.description)?,
            instructor_id,
            lessons: lessons(self.lessons),
            resources: resources(self.resources),
        })
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub lessons: Option<Vec<LessonInput>>,
    pub resources: Option<Vec<ResourceInput>>,
}

impl UpdateCourseRequest {
    pub fn into_update(self) -> CourseUpdate {
        CourseUpdate {
            title: self.title.filter(|t| !t.trim().is_empty()),
            description: self.description,
            instructor_id: self.instructor_id,
            lessons: self.lessons.map(lessons),
            resources: self.resources.map(resources),
        }
    }
}

fn lessons(inputs: Vec<LessonInput>) -> Vec<NewLesson> {
    inputs
        .into_iter()
        .map(|l| NewLesson {
            title: l.title,
            content: l.content,
        })
        .collect()
}

fn resources(inputs: Vec<ResourceInput>) -> Vec<NewResource> {
    inputs
        .into_iter()
        .map(|r| NewResource {
            title: r.title,
            url: r.url,
        })
        .collect()
}

/// Pairs each course with its instructor. Unknown instructors render as `null`.
pub async fn with_instructors(
    db: &dyn DatabaseService,
    courses: Vec<Course>,
) -> Result<Vec<CatalogCourse>, HttpError> {
    let mut instructors: HashMap<Uuid, Option<InstructorSummary>> = HashMap::new();
    let mut catalog = Vec::with_capacity(courses.len());
    for course in courses {
        let instructor = match course.instructor_id {
            Some(id) => {
                if !instructors.contains_key(&id) {
                    let summary = match db.get_user(id).await {
                        Ok(user) => Some(InstructorSummary::from(user)),
                        Err(PortError::NotFound(_)) => None,
                        Err(e) => return Err(e.into()),
                    };
                    instructors.insert(id, summary);
                }
                instructors.get(&id).cloned().flatten()
            }
            None => None,
        };
        catalog.push(CatalogCourse {
            course: course.into(),
            instructor,
        });
    }
    Ok(catalog)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/courses - The full catalog
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Every course with its instructor", body = [CatalogCourse])
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogCourse>>, HttpError> {
    let courses = state.db.list_courses().await?;
    Ok(Json(with_instructors(state.db.as_ref(), courses).await?))
}

/// GET /api/courses/{id} - One course with lessons and resources
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = CatalogCourse),
        (status = 404, description = "Course not found", body = ErrorBody)
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    CourseId(course_id): CourseId,
) -> Result<Json<CatalogCourse>, HttpError> {
    let course = state.db.get_course(course_id).await?;
    let mut entries = with_instructors(state.db.as_ref(), vec![course]).await?;
    entries
        .pop()
        .map(Json)
        .ok_or_else(|| HttpError::not_found("Course not found"))
}

/// GET /api/lessons/{id}
pub async fn get_lesson_handler(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    LessonId(lesson_id): LessonId,
) -> Result<Json<LessonDto>, HttpError> {
    Ok(Json(state.db.get_lesson(lesson_id).await?.into()))
}

/// GET /api/assignments/{id}
pub async fn get_assignment_handler(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    AssignmentId(assignment_id): AssignmentId,
) -> Result<Json<AssignmentDto>, HttpError> {
    Ok(Json(state.db.get_assignment(assignment_id).await?.into()))
}
