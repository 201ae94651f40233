pub mod admin;
pub mod auth;
pub mod courses;
pub mod dto;
pub mod engagement;
pub mod extract;
pub mod middleware;
pub mod progress;
pub mod quizzes;
pub mod rest;
pub mod routes;
pub mod state;
pub mod students;
pub mod teacher;
pub mod token;

pub use middleware::{require_auth, require_role};
pub use routes::router;
