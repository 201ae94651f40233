//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, served by Swagger UI
//! and written to disk by the `openapi` binary.

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::web::admin::{self, CreateTeacherRequest};
use crate::web::auth::{self, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::web::courses;
use crate::web::dto::{
    AchievementDto, ActivityDto, CatalogCourse, CourseDto, GradeDto, InstructorSummary, TeacherCreated,
    LessonDto, LessonProgressDto, ProgressDto, QuizCompletionDto, ResourceDto,
};
use crate::web::engagement::{self, DashboardResponse};
use crate::web::progress::{self, ProgressUpdateResponse, UpdateProgressRequest};
use crate::web::quizzes::{self, QuestionReviewDto, SubmitQuizRequest, SubmitQuizResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        courses::list_courses_handler,
        courses::get_course_handler,
        quizzes::submit_quiz_handler,
        progress::update_progress_handler,
        engagement::dashboard_handler,
        admin::create_teacher_handler,
    ),
    components(
        schemas(
            ErrorBody,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            CatalogCourse,
            CourseDto,
            LessonDto,
            ResourceDto,
            InstructorSummary,
            SubmitQuizRequest,
            SubmitQuizResponse,
            QuestionReviewDto,
            GradeDto,
            AchievementDto,
            UpdateProgressRequest,
            ProgressUpdateResponse,
            ProgressDto,
            LessonProgressDto,
            QuizCompletionDto,
            DashboardResponse,
            ActivityDto,
            CreateTeacherRequest,
            TeacherCreated,
        )
    ),
    tags(
        (name = "BrightLearn API", description = "Courses, quizzes, progress tracking and administration for the BrightLearn platform.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_quiz_submission_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/quiz/{id}/submit"));
        assert!(doc.paths.paths.contains_key("/api/login"));
    }
}
