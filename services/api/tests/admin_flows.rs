mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestApp, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn admin_creates_and_deactivates_a_teacher_with_an_audit_trail() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, err) = app
        .post(
            "/api/admin/teachers",
            &admin,
            json!({ "name": "Tom", "email": "tom@school.edu", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "Missing required fields");

    let (status, created) = app
        .post(
            "/api/admin/teachers",
            &admin,
            json!({
                "name": "Tom",
                "email": "tom@school.edu",
                "password": PASSWORD,
                "schoolEmail": "t.smith@district.edu",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let teacher_id = id_of(&created, "teacherId");

    let (_, teachers) = app.get("/api/admin/teachers", &admin).await;
    assert_eq!(teachers[0]["schoolEmail"], "t.smith@district.edu");

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/teachers/{}", teacher_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "tom@school.edu", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, logs) = app.get("/api/admin/audit-logs", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = logs
        .as_array()
        .map(|l| l.iter().filter_map(|l| l["action"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(actions, vec!["deactivate_teacher", "create_teacher"]);
    assert_eq!(logs[0]["target"], teacher_id.to_string());
}

#[tokio::test]
async fn deleting_a_student_through_the_teacher_route_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (alice_id, _) = app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, err) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/teachers/{}", alice_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["message"], "Teacher not found");
}

#[tokio::test]
async fn platform_analytics_count_courses_with_lessons_as_active() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (teacher_id, teacher) = app.sign_up("Tom", "tom@school.edu", "teacher").await;
    app.course(&teacher, 2).await;

    let (status, _) = app
        .post(
            "/api/admin/courses",
            &admin,
            json!({ "title": "Empty", "description": "No lessons yet", "instructorId": teacher_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, analytics) = app.get("/api/admin/analytics", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["totalUsers"], 2);
    assert_eq!(analytics["totalCourses"], 2);
    assert_eq!(analytics["activeCourses"], 1);
}

#[tokio::test]
async fn disciplinary_records_need_a_student() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (alice_id, _) = app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, body) = app
        .post(
            "/api/admin/disciplinary",
            &admin,
            json!({ "studentId": alice_id, "description": "Late work", "action": "warning" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Disciplinary action recorded");
    id_of(&body, "recordId");
}

#[tokio::test]
async fn account_updates_answer_with_a_message() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (teacher_id, _) = app.sign_up("Tom", "tom@school.edu", "teacher").await;
    let (alice_id, _) = app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, body) = app
        .patch(&format!("/api/admin/teachers/{}", teacher_id), &admin, json!({ "name": "Thomas" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Teacher updated" }));

    let (status, body) = app
        .patch(&format!("/api/admin/students/{}", alice_id), &admin, json!({ "name": "Alicia" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Student updated" }));

    let (_, teachers) = app.get("/api/admin/teachers", &admin).await;
    assert_eq!(teachers[0]["name"], "Thomas");
}

#[tokio::test]
async fn course_instructors_must_be_teachers() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (teacher_id, _) = app.sign_up("Tom", "tom@school.edu", "teacher").await;
    let (alice_id, _) = app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, err) = app
        .post(
            "/api/admin/courses",
            &admin,
            json!({ "title": "Biology", "description": "Cells", "instructorId": alice_id }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["message"], "Teacher not found");

    let (status, created) = app
        .post(
            "/api/admin/courses",
            &admin,
            json!({ "title": "Biology", "description": "Cells", "instructorId": teacher_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let course_id = id_of(&created, "courseId");

    let (status, err) = app
        .patch(&format!("/api/admin/courses/{}", course_id), &admin, json!({ "instructorId": alice_id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["message"], "Teacher not found");
}

#[tokio::test]
async fn deactivated_accounts_lose_access_at_once() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (alice_id, alice) = app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, _) = app.get("/api/notifications", &alice).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/students/{}", alice_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = app.get("/api/notifications", &alice).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "Account deactivated");
}
