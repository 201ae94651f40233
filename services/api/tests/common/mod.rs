//! Shared harness for the router-level tests: an in-memory database, a
//! bootstrapped admin, and a JSON request helper.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use brightlearn_api::{
    adapters::DbAdapter,
    config::{BootstrapAdmin, Config},
    web::{auth::ensure_admin, router, state::AppState},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "carol@admin.com";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub app: Router,
    pub db: Arc<DbAdapter>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Arc::new(DbAdapter::in_memory().await.expect("open in-memory db"));
        db.run_migrations().await.expect("run migrations");
        ensure_admin(
            db.as_ref(),
            &BootstrapAdmin {
                name: "Carol".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .expect("bootstrap admin");

        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("integration-test-secret".to_string()),
            _ => None,
        })
        .expect("test config");
        let state = Arc::new(AppState::new(db.clone(), Arc::new(config)));
        Self {
            app: router(state),
            db,
        }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self.app.clone().oneshot(request).await.expect("router never fails");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }

    /// Registers an account and logs it in.
    pub async fn sign_up(&self, name: &str, email: &str, role: &str) -> (Uuid, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD, "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = id_of(&body, "userId");
        (id, self.login(email).await)
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL).await
    }

    /// A teacher-owned course with `lessons` lessons.
    pub async fn course(&self, teacher_token: &str, lessons: usize) -> Uuid {
        let lessons: Vec<Value> = (1..=lessons)
            .map(|i| json!({ "title": format!("Lesson {}", i), "content": "..." }))
            .collect();
        let (status, body) = self
            .post(
                "/api/teacher/courses",
                teacher_token,
                json!({ "title": "Algebra I", "description": "Linear equations", "lessons": lessons }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "course failed: {}", body);
        id_of(&body, "courseId")
    }

    /// A four-question quiz whose answers are `[0, 1, 2, 3]`.
    pub async fn quiz(&self, teacher_token: &str, course_id: Uuid) -> Uuid {
        let questions: Vec<Value> = (0..4)
            .map(|i| {
                json!({
                    "question": format!("Question {}", i + 1),
                    "options": ["a", "b", "c", "d"],
                    "correctAnswer": i,
                    "explanation": format!("The answer is option {}", i),
                })
            })
            .collect();
        let (status, body) = self
            .post(
                "/api/teacher/quizzes",
                teacher_token,
                json!({ "courseId": course_id, "title": "Unit 1 Quiz", "questions": questions }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "quiz failed: {}", body);
        id_of(&body, "quizId")
    }
}

pub fn id_of(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no {} in {}", field, body))
}
