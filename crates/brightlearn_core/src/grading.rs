//! crates/brightlearn_core/src/grading.rs
//!
//! Quiz grading: compares submitted option indices against each question's
//! stored answer and classifies the attempt against the quiz's passing score.

use crate::domain::{GradeStatus, Question, Quiz};

/// Passing score assigned to quizzes created without an explicit threshold.
pub const DEFAULT_PASSING_SCORE: u8 = 60;

/// Per-question feedback revealed to the student once an attempt is graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub index: usize,
    pub submitted: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOutcome {
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score: u8,
    pub passed: bool,
    pub review: Vec<QuestionReview>,
}

impl GradeOutcome {
    pub fn status(&self) -> GradeStatus {
        if self.passed {
            GradeStatus::Passed
        } else {
            GradeStatus::Failed
        }
    }
}

/// `round(100 * part / total)` with halves rounded up, computed in integers.
/// A zero `total` yields 0.
pub fn percentage(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * part + total) / (2 * total);
    rounded.min(100) as u8
}

/// Grades one attempt.
///
/// `answers[i]` is the option picked for question `i`. Missing entries (a short
/// array or an explicit `None`) count as incorrect; entries beyond the last
/// question are ignored.
pub fn grade_submission(quiz: &Quiz, answers: &[Option<usize>]) -> GradeOutcome {
    let review: Vec<QuestionReview> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let submitted = answers.get(index).copied().flatten();
            QuestionReview {
                index,
                submitted,
                correct_answer: question.correct_answer,
                is_correct: submitted == Some(question.correct_answer),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let correct_answers = review.iter().filter(|r| r.is_correct).count() as u32;
    let total_questions = quiz.questions.len() as u32;
    let score = percentage(correct_answers as u64, total_questions as u64);

    GradeOutcome {
        correct_answers,
        total_questions,
        score,
        passed: score >= quiz.passing_score,
        review,
    }
}

/// Why a quiz definition was refused. Questions are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizDefinitionError {
    #[error("A quiz needs at least one question")]
    NoQuestions,
    #[error("Question {0} needs a prompt")]
    EmptyPrompt(usize),
    #[error("Question {0} needs at least two options")]
    TooFewOptions(usize),
    #[error("Question {0} has no option at its correct answer")]
    AnswerOutOfRange(usize),
    #[error("Passing score must be between 0 and 100")]
    PassingScoreOutOfRange,
}

pub fn check_quiz_definition(questions: &[Question], passing_score: u8) -> Result<(), QuizDefinitionError> {
    if passing_score > 100 {
        return Err(QuizDefinitionError::PassingScoreOutOfRange);
    }
    if questions.is_empty() {
        return Err(QuizDefinitionError::NoQuestions);
    }
    for (i, question) in questions.iter().enumerate() {
        let number = i + 1;
        if question.prompt.trim().is_empty() {
            return Err(QuizDefinitionError::EmptyPrompt(number));
        }
        if question.options.len() < 2 {
            return Err(QuizDefinitionError::TooFewOptions(number));
        }
        if question.correct_answer >= question.options.len() {
            return Err(QuizDefinitionError::AnswerOutOfRange(number));
        }
    }
    Ok(())
}
