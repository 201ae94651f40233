mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn registering_twice_with_the_same_email_conflicts() {
    let app = TestApp::new().await;
    let body = json!({ "name": "Alice", "email": "alice@student.com", "password": PASSWORD });

    let (status, created) = app.call(Method::POST, "/api/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "User registered successfully");

    let (status, err) = app.call(Method::POST, "/api/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["message"], "User already exists");
}

#[tokio::test]
async fn registration_needs_every_field_and_refuses_admin() {
    let app = TestApp::new().await;

    let (status, err) = app
        .call(Method::POST, "/api/register", None, Some(json!({ "email": "bob@student.com" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "Missing required fields");

    let (status, err) = app
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "Mallory", "email": "m@x.com", "password": PASSWORD, "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "Invalid role");
}

#[tokio::test]
async fn login_reports_unknown_accounts_and_wrong_passwords() {
    let app = TestApp::new().await;
    app.sign_up("Alice", "alice@student.com", "student").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "ALICE@student.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");
    assert!(body["token"].as_str().is_some());

    let (status, err) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "alice@student.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "Invalid password");

    let (status, err) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "ghost@student.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["message"], "User not found");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new().await;

    let (status, err) = app.call(Method::GET, "/api/progress", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "No token provided");

    let (status, err) = app.get("/api/progress", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "Invalid token");
}

#[tokio::test]
async fn role_gated_routes_reject_other_roles() {
    let app = TestApp::new().await;
    let (_, student) = app.sign_up("Alice", "alice@student.com", "student").await;
    let (teacher_id, teacher) = app.sign_up("Tom", "tom@school.edu", "teacher").await;

    let (status, err) = app.get("/api/admin/teachers", &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["message"], "Forbidden");

    let (status, _) = app.get(&format!("/api/teacher/{}/courses", teacher_id), &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/api/teacher/{}/courses", teacher_id), &teacher).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn students_cannot_read_each_others_dashboards() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.sign_up("Alice", "alice@student.com", "student").await;
    let (bob_id, _) = app.sign_up("Bob", "bob@student.com", "student").await;
    let (_, teacher) = app.sign_up("Tom", "tom@school.edu", "teacher").await;

    let (status, _) = app.get(&format!("/api/dashboard/{}", bob_id), &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get(&format!("/api/dashboard/{}", alice_id), &teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
}
