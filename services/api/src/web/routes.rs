//! services/api/src/web/routes.rs
//!
//! Assembles the HTTP router: public routes, routes behind `require_auth`,
//! and the role-gated student, teacher and admin groups.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use brightlearn_core::domain::Role;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::web::middleware::{require_auth, require_role};
use crate::web::state::AppState;
use crate::web::{admin, auth, courses, engagement, progress, quizzes, students, teacher};

/// Builds the full API router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/register", post(auth::register_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/api/courses", get(courses::list_courses_handler))
        .route("/api/courses/{id}", get(courses::get_course_handler));

    // Any authenticated caller
    let protected_routes = Router::new()
        .route("/api/users/{id}", get(auth::get_user_handler))
        .route("/api/courses/{id}/progress", get(progress::course_progress_handler))
        .route("/api/lessons/{id}", get(courses::get_lesson_handler))
        .route("/api/lessons/{id}/complete", post(progress::complete_lesson_handler))
        .route("/api/assignments/{id}", get(courses::get_assignment_handler))
        .route("/api/quizzes/course/{id}", get(quizzes::list_course_quizzes_handler))
        .route("/api/quiz/{id}", get(quizzes::get_quiz_handler))
        .route("/api/quiz/{id}/submit", post(quizzes::submit_quiz_handler))
        .route(
            "/api/progress",
            get(progress::list_progress_handler).post(progress::update_progress_handler),
        )
        .route(
            "/api/notifications",
            get(engagement::my_notifications_handler).post(engagement::create_notification_handler),
        )
        .route("/api/notifications/read-all", post(engagement::mark_all_read_handler))
        .route("/api/notifications/user/{id}", get(engagement::user_notifications_handler))
        .route("/api/notifications/{id}/read", patch(engagement::mark_read_handler))
        .route("/api/achievements", get(engagement::my_achievements_handler))
        .route("/api/achievements/user/{id}", get(engagement::user_achievements_handler))
        .route("/api/activities/recent", get(engagement::recent_activity_handler))
        .route("/api/grades/user/{id}", get(engagement::user_grades_handler))
        .route("/api/dashboard/{id}", get(engagement::dashboard_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let student_routes = Router::new()
        .route("/api/students/{id}/courses", get(students::enrolled_courses_handler))
        .route("/api/students/{id}/grades", get(students::student_grades_handler))
        .route("/api/students/{id}/enroll", post(students::enroll_handler))
        .route("/api/students/{id}/notifications", get(students::student_notifications_handler))
        .route("/api/students/{id}/profile", patch(students::update_profile_handler))
        .route("/api/assignments/{id}/submit", post(students::submit_assignment_handler))
        .route_layer(axum_middleware::from_fn_with_state(Role::Student, require_role))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let teacher_routes = Router::new()
        .route("/api/teacher/courses", post(teacher::create_course_handler))
        .route(
            "/api/teacher/courses/{id}",
            patch(teacher::update_course_handler).delete(teacher::delete_course_handler),
        )
        .route("/api/teacher/assignments", post(teacher::create_assignment_handler))
        .route(
            "/api/teacher/assignments/{id}/submissions",
            get(teacher::list_submissions_handler),
        )
        .route(
            "/api/teacher/assignments/{id}/submissions/{student_id}",
            patch(teacher::grade_submission_handler),
        )
        .route("/api/teacher/quizzes", post(quizzes::create_quiz_handler))
        .route("/api/teacher/{id}/courses", get(teacher::teacher_courses_handler))
        .route("/api/teacher/{id}/students", get(teacher::teacher_students_handler))
        .route("/api/teacher/{id}/analytics", get(teacher::teacher_analytics_handler))
        .route_layer(axum_middleware::from_fn_with_state(Role::Teacher, require_role))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route(
            "/api/admin/teachers",
            get(admin::list_teachers_handler).post(admin::create_teacher_handler),
        )
        .route(
            "/api/admin/teachers/{id}",
            patch(admin::update_teacher_handler).delete(admin::deactivate_teacher_handler),
        )
        .route("/api/admin/students", get(admin::list_students_handler))
        .route(
            "/api/admin/students/{id}",
            patch(admin::update_student_handler).delete(admin::deactivate_student_handler),
        )
        .route("/api/admin/disciplinary", post(admin::disciplinary_handler))
        .route(
            "/api/admin/courses",
            get(admin::list_courses_handler).post(admin::create_course_handler),
        )
        .route(
            "/api/admin/courses/{id}",
            patch(admin::update_course_handler).delete(admin::delete_course_handler),
        )
        .route("/api/admin/analytics", get(admin::analytics_handler))
        .route("/api/admin/audit-logs", get(admin::audit_logs_handler))
        .route_layer(axum_middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(student_routes)
        .merge(teacher_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
