//! services/api/src/web/extract.rs
//!
//! `Json` and `Path` wrappers whose rejections render as `{"message": ...}`,
//! plus typed resource ids taken from the URL.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct Path<T>(pub T);

/// Declares a single-segment id extractor per resource. An id that does not
/// parse cannot name a stored row, so it is that resource's 404.
macro_rules! resource_id {
    ($($name:ident => $not_found:literal),* $(,)?) => {$(
        pub struct $name(pub Uuid);

        impl<S: Send + Sync> FromRequestParts<S> for $name {
            type Rejection = HttpError;

            async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
                let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
                Uuid::parse_str(&raw)
                    .map(Self)
                    .map_err(|_| HttpError::not_found($not_found))
            }
        }
    )*};
}

resource_id! {
    CourseId => "Course not found",
    LessonId => "Lesson not found",
    QuizId => "Quiz not found",
    AssignmentId => "Assignment not found",
    NotificationId => "Notification not found",
    UserId => "User not found",
}

/// Unwraps a required text field; absent or blank values are a 400.
pub fn required(value: Option<String>) -> Result<String, HttpError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(HttpError::missing_fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn blank_required_field_is_missing() {
        let err = required(Some("   ".to_string())).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Missing required fields");
        assert_eq!(required(Some("Alice".into())).unwrap(), "Alice");
    }
}
