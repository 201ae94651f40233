//! `QuizStore` on SQLite. Grading happens in the core; this module persists the
//! outcome and its side effects.

use std::str::FromStr;

use async_trait::async_trait;
use brightlearn_core::achievements::earned_for_quiz;
use brightlearn_core::domain::{
    ActivityKind, Grade, GradeStatus, NewActivity, NewQuiz, Question, Quiz, QuizCompletion,
};
use brightlearn_core::ports::{PortError, PortResult, QuizAttempt, QuizStore, RecordedAttempt};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    award_achievements, corrupt, find_progress, held_achievements, insert_activity, save_progress,
    to_u32, to_u8, unexpected, DbAdapter,
};

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    passing_score: i64,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct QuestionRecord {
    prompt: String,
    options: Json<Vec<String>>,
    correct_answer: i64,
    explanation: Option<String>,
}
impl QuestionRecord {
    fn to_domain(self) -> PortResult<Question> {
        Ok(Question {
            prompt: self.prompt,
            options: self.options.0,
            correct_answer: usize::try_from(self.correct_answer).map_err(corrupt)?,
            explanation: self.explanation,
        })
    }
}

#[derive(FromRow)]
struct GradeRecord {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    quiz_id: Uuid,
    score: i64,
    correct_answers: i64,
    total_questions: i64,
    status: String,
    created_at: DateTime<Utc>,
}
impl GradeRecord {
    fn to_domain(self) -> PortResult<Grade> {
        Ok(Grade {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            quiz_id: self.quiz_id,
            score: to_u8(self.score)?,
            correct_answers: to_u32(self.correct_answers)?,
            total_questions: to_u32(self.total_questions)?,
            status: GradeStatus::from_str(&self.status).map_err(corrupt)?,
            created_at: self.created_at,
        })
    }
}

async fn assemble_quiz(conn: &mut SqliteConnection, record: QuizRecord) -> PortResult<Quiz> {
    let questions = sqlx::query_as::<_, QuestionRecord>(
        "SELECT prompt, options, correct_answer, explanation FROM questions
         WHERE quiz_id = ? ORDER BY position",
    )
    .bind(record.id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?;

    Ok(Quiz {
        id: record.id,
        course_id: record.course_id,
        title: record.title,
        questions: questions
            .into_iter()
            .map(QuestionRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?,
        passing_score: to_u8(record.passing_score)?,
        created_at: record.created_at,
    })
}

async fn insert_grade(conn: &mut SqliteConnection, attempt: &QuizAttempt) -> PortResult<Grade> {
    let grade = Grade {
        id: Uuid::new_v4(),
        user_id: attempt.user_id,
        course_id: attempt.course_id,
        quiz_id: attempt.quiz_id,
        score: attempt.outcome.score,
        correct_answers: attempt.outcome.correct_answers,
        total_questions: attempt.outcome.total_questions,
        status: attempt.outcome.status(),
        created_at: attempt.submitted_at,
    };
    sqlx::query(
        "INSERT INTO grades (id, user_id, course_id, quiz_id, score, correct_answers, total_questions, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(grade.id)
    .bind(grade.user_id)
    .bind(grade.course_id)
    .bind(grade.quiz_id)
    .bind(grade.score as i64)
    .bind(grade.correct_answers as i64)
    .bind(grade.total_questions as i64)
    .bind(grade.status.as_str())
    .bind(grade.created_at)
    .execute(&mut *conn)
    .await
    .map_err(unexpected)?;
    Ok(grade)
}

#[async_trait]
impl QuizStore for DbAdapter {
    async fn create_quiz(&self, quiz: NewQuiz) -> PortResult<Quiz> {
        let mut tx = self.begin_write().await?;
        let course: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM courses WHERE id = ?")
            .bind(quiz.course_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        if course.is_none() {
            return Err(PortError::NotFound("Course not found".to_string()));
        }

        let record = sqlx::query_as::<_, QuizRecord>(
            "INSERT INTO quizzes (id, course_id, title, passing_score, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, course_id, title, passing_score, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(quiz.course_id)
        .bind(&quiz.title)
        .bind(quiz.passing_score as i64)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        for (position, question) in quiz.questions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO questions (quiz_id, position, prompt, options, correct_answer, explanation)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(record.id)
            .bind(position as i64)
            .bind(&question.prompt)
            .bind(Json(&question.options))
            .bind(question.correct_answer as i64)
            .bind(&question.explanation)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        let created = assemble_quiz(&mut tx, record).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(created)
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let mut conn = self.conn().await?;
        let record = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, course_id, title, passing_score, created_at FROM quizzes WHERE id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("Quiz not found".to_string()))?;
        assemble_quiz(&mut conn, record).await
    }

    async fn list_quizzes_for_course(&self, course_id: Uuid) -> PortResult<Vec<Quiz>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, course_id, title, passing_score, created_at FROM quizzes
             WHERE course_id = ? ORDER BY created_at, title",
        )
        .bind(course_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;

        let mut quizzes = Vec::with_capacity(records.len());
        for record in records {
            quizzes.push(assemble_quiz(&mut conn, record).await?);
        }
        Ok(quizzes)
    }

    async fn record_quiz_attempt(&self, attempt: QuizAttempt) -> PortResult<RecordedAttempt> {
        let mut tx = self.begin_write().await?;
        let grade = insert_grade(&mut tx, &attempt).await?;

        // Only learners who already track the course get a quiz entry.
        let progress = match find_progress(&mut tx, attempt.user_id, attempt.course_id).await? {
            Some(mut progress) => {
                progress.record_quiz(QuizCompletion {
                    quiz_id: attempt.quiz_id,
                    score: attempt.outcome.score,
                    passed: attempt.outcome.passed,
                    completed_at: attempt.submitted_at,
                });
                save_progress(&mut tx, &progress).await?;
                Some(progress)
            }
            None => None,
        };

        insert_activity(
            &mut tx,
            NewActivity {
                user_id: attempt.user_id,
                kind: ActivityKind::QuizSubmitted,
                description: format!("Completed {}", attempt.quiz_title),
                score: Some(attempt.outcome.score),
            },
            attempt.submitted_at,
        )
        .await?;

        let held = held_achievements(&mut tx, attempt.user_id).await?;
        let earned = earned_for_quiz(&held, &attempt.outcome);
        let achievements = award_achievements(&mut tx, attempt.user_id, &earned, attempt.submitted_at).await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(RecordedAttempt {
            grade,
            progress,
            achievements,
        })
    }

    async fn list_grades_for_user(&self, user_id: Uuid) -> PortResult<Vec<Grade>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, GradeRecord>(
            "SELECT id, user_id, course_id, quiz_id, score, correct_answers, total_questions, status, created_at
             FROM grades WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(GradeRecord::to_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::db::test_support::fresh_db;
    use brightlearn_core::domain::{NewCourse, NewLesson, NewUser, Role};
    use brightlearn_core::grading::grade_submission;
    use brightlearn_core::ports::{CourseStore, EnrollmentStore, UserStore};
    use brightlearn_core::AchievementKind;
    use pretty_assertions::assert_eq;

    struct Fixture {
        db: DbAdapter,
        user_id: Uuid,
        quiz: Quiz,
    }

    async fn fixture() -> Fixture {
        let db = fresh_db().await;
        let user = db
            .create_user(NewUser {
                name: "Alice Student".to_string(),
                email: "alice@student.com".to_string(),
                hashed_password: "x".to_string(),
                role: Role::Student,
                school_email: None,
            })
            .await
            .unwrap();
        let course = db
            .create_course(NewCourse {
                title: "Math 101".to_string(),
                description: "Basic Math".to_string(),
                instructor_id: None,
                lessons: vec![NewLesson {
                    title: "Intro".to_string(),
                    content: "Numbers".to_string(),
                }],
                resources: vec![],
            })
            .await
            .unwrap();
        let question = |correct_answer| Question {
            prompt: "Pick one".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer,
            explanation: None,
        };
        let quiz = db
            .create_quiz(NewQuiz {
                course_id: course.id,
                title: "Algebra Basics".to_string(),
                questions: vec![question(0), question(1), question(2), question(3)],
                passing_score: 60,
            })
            .await
            .unwrap();
        Fixture {
            db,
            user_id: user.id,
            quiz,
        }
    }

    fn attempt(fx: &Fixture, answers: &[Option<usize>]) -> QuizAttempt {
        QuizAttempt {
            user_id: fx.user_id,
            quiz_id: fx.quiz.id,
            course_id: fx.quiz.course_id,
            quiz_title: fx.quiz.title.clone(),
            outcome: grade_submission(&fx.quiz, answers),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn quiz_questions_keep_order_and_options() {
        let fx = fixture().await;
        let loaded = fx.db.get_quiz(fx.quiz.id).await.unwrap();
        assert_eq!(loaded.questions, fx.quiz.questions);
        assert_eq!(loaded.questions[3].correct_answer, 3);
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let fx = fixture().await;
        let err = fx.db.get_quiz(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(msg) if msg == "Quiz not found"));
    }

    #[tokio::test]
    async fn attempt_without_tracker_only_stores_grade() {
        let fx = fixture().await;
        let recorded = fx
            .db
            .record_quiz_attempt(attempt(&fx, &[Some(0), Some(1), Some(0), Some(3)]))
            .await
            .unwrap();

        assert_eq!(recorded.grade.score, 75);
        assert_eq!(recorded.grade.status, GradeStatus::Passed);
        assert!(recorded.progress.is_none());
        let kinds: Vec<_> = recorded.achievements.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AchievementKind::FirstQuizPassed]);
    }

    #[tokio::test]
    async fn repeated_attempts_append_grades_and_upsert_completion() {
        let fx = fixture().await;
        fx.db.enroll(fx.user_id, fx.quiz.course_id).await.unwrap();

        fx.db
            .record_quiz_attempt(attempt(&fx, &[Some(1), Some(0)]))
            .await
            .unwrap();
        let second = fx
            .db
            .record_quiz_attempt(attempt(&fx, &[Some(0), Some(1), Some(2), Some(3)]))
            .await
            .unwrap();

        let progress = second.progress.unwrap();
        assert_eq!(progress.quizzes_completed, 1);
        assert_eq!(progress.quizzes[0].score, 100);

        let grades = fx.db.list_grades_for_user(fx.user_id).await.unwrap();
        let scores: Vec<_> = grades.iter().map(|g| g.score).collect();
        assert_eq!(scores, vec![100, 0]);

        let kinds: Vec<_> = second.achievements.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AchievementKind::FirstQuizPassed, AchievementKind::PerfectScore]);
    }
}
