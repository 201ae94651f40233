//! services/api/src/web/quizzes.rs
//!
//! Quiz delivery, submission and authoring. Answers and explanations only
//! leave the server in the review of a graded attempt.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::domain::{NewQuiz, Question, Role};
use brightlearn_core::grading::{check_quiz_definition, grade_submission, QuestionReview};
use brightlearn_core::ports::QuizAttempt;
use brightlearn_core::DEFAULT_PASSING_SCORE;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{list, AchievementDto, GradeDto, PublicQuiz, QuizCreated};
use crate::web::extract::{required, CourseId, Json, QuizId};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use crate::web::teacher::owned_course;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    /// Defaults to the caller. Only admins may submit on behalf of someone else.
    pub user_id: Option<Uuid>,
    /// One option index per question; `null` or negative means unanswered.
    pub answers: Option<Vec<Option<i64>>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReviewDto {
    pub index: usize,
    pub submitted: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl From<QuestionReview> for QuestionReviewDto {
    fn from(r: QuestionReview) -> Self {
        Self {
            index: r.index,
            submitted: r.submitted,
            correct_answer: r.correct_answer,
            is_correct: r.is_correct,
            explanation: r.explanation,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub grade: GradeDto,
    pub score: u8,
    pub passed: bool,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub review: Vec<QuestionReviewDto>,
    /// Achievements unlocked by this attempt.
    pub achievements: Vec<AchievementDto>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(alias = "prompt")]
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub course_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
    pub passing_score: Option<u8>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/quizzes/course/{id} - Quizzes of a course, without answers
pub async fn list_course_quizzes_handler(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    CourseId(course_id): CourseId,
) -> Result<Json<Vec<PublicQuiz>>, HttpError> {
    state.db.get_course(course_id).await?;
    let quizzes = state.db.list_quizzes_for_course(course_id).await?;
    Ok(Json(list(quizzes)))
}

/// GET /api/quiz/{id} - One quiz, without answers
pub async fn get_quiz_handler(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    QuizId(quiz_id): QuizId,
) -> Result<Json<PublicQuiz>, HttpError> {
    Ok(Json(state.db.get_quiz(quiz_id).await?.into()))
}

/// POST /api/quiz/{id}/submit - Grade an attempt
#[utoipa::path(
    post,
    path = "/api/quiz/{id}/submit",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 201, description = "Attempt graded and recorded", body = SubmitQuizResponse),
        (status = 400, description = "Missing answers", body = ErrorBody),
        (status = 403, description = "Submitting for another user", body = ErrorBody),
        (status = 404, description = "Quiz not found", body = ErrorBody)
    )
)]
pub async fn submit_quiz_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    QuizId(quiz_id): QuizId,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = req.user_id.unwrap_or(caller.id);
    if user_id != caller.id {
        if caller.role != Role::Admin {
            return Err(HttpError::forbidden());
        }
        state.db.get_user(user_id).await?;
    }
    let quiz = state.db.get_quiz(quiz_id).await?;
    let answers: Vec<Option<usize>> = req
        .answers
        .ok_or_else(HttpError::missing_fields)?
        .into_iter()
        .map(|a| a.and_then(|i| usize::try_from(i).ok()))
        .collect();

    let outcome = grade_submission(&quiz, &answers);
    let recorded = state
        .db
        .record_quiz_attempt(QuizAttempt {
            user_id,
            quiz_id,
            course_id: quiz.course_id,
            quiz_title: quiz.title.clone(),
            outcome: outcome.clone(),
            submitted_at: Utc::now(),
        })
        .await?;
    info!(
        %user_id,
        %quiz_id,
        score = outcome.score,
        passed = outcome.passed,
        "Recorded quiz attempt"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitQuizResponse {
            grade: recorded.grade.into(),
            score: outcome.score,
            passed: outcome.passed,
            correct_answers: outcome.correct_answers,
            total_questions: outcome.total_questions,
            review: list(outcome.review),
            achievements: list(recorded.achievements),
        }),
    ))
}

/// POST /api/teacher/quizzes - Author a quiz on one of the caller's courses
pub async fn create_quiz_handler(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let course_id = req.course_id.ok_or_else(HttpError::missing_fields)?;
    let title = required(req.title)?;
    let passing_score = req.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
    let questions: Vec<Question> = req
        .questions
        .into_iter()
        .map(|q| Question {
            prompt: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        })
        .collect();
    check_quiz_definition(&questions, passing_score).map_err(|e| HttpError::bad_request(e.to_string()))?;

    owned_course(&state, &caller, course_id).await?;
    let quiz = state
        .db
        .create_quiz(NewQuiz {
            course_id,
            title,
            questions,
            passing_score,
        })
        .await?;
    info!(quiz_id = %quiz.id, %course_id, "Created quiz");

    Ok((
        StatusCode::CREATED,
        Json(QuizCreated {
            quiz_id: quiz.id,
            message: "Quiz created".to_string(),
        }),
    ))
}
