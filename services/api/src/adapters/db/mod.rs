//! services/api/src/adapters/db/mod.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the store ports from the `core` crate. It handles all interactions with the
//! embedded SQLite database using `sqlx`.
//!
//! Each port is implemented in its own submodule; the record structs and the
//! loaders shared between them live here.

mod admin;
mod courses;
mod engagement;
mod enrollments;
mod progress;
mod quizzes;
mod users;

use std::str::FromStr;
use std::time::Duration;

use brightlearn_core::domain::{
    Achievement, Course, Lesson, LessonProgress, NewNotification, Progress, QuizCompletion,
    Resource,
};
use brightlearn_core::ports::{PortError, PortResult};
use brightlearn_core::AchievementKind;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::FromRow;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
///
/// Reads go through `pool`. Every write goes through `writer`, a pool of one
/// connection, so SQLite never has to upgrade a read transaction while
/// another connection holds the write lock.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
    writer: SqlitePool,
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl DbAdapter {
    /// Creates a new `DbAdapter` over separate read and write pools.
    pub fn new(pool: SqlitePool, writer: SqlitePool) -> Self {
        Self { pool, writer }
    }

    /// Opens (creating if missing) the database at `url` in WAL mode.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options.clone())
            .await?;
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        Ok(Self::new(pool, writer))
    }

    /// A private in-memory database. It lives on a single connection that is
    /// never recycled, since closing it would drop the data.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool.clone(), pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.writer).await?;
        Ok(())
    }

    async fn conn(&self) -> PortResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.pool.acquire().await.map_err(unexpected)
    }

    async fn write_conn(&self) -> PortResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.writer.acquire().await.map_err(unexpected)
    }

    async fn begin_write(&self) -> PortResult<sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.writer.begin().await.map_err(unexpected)
    }
}

//=========================================================================================
// Error Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn corrupt<E: std::fmt::Display>(e: E) -> PortError {
    PortError::Unexpected(format!("corrupt row: {}", e))
}

fn to_u8(value: i64) -> PortResult<u8> {
    u8::try_from(value).map_err(corrupt)
}

fn to_u32(value: i64) -> PortResult<u32> {
    u32::try_from(value).map_err(corrupt)
}

//=========================================================================================
// "Impure" Database Record Structs Shared Between Stores
//=========================================================================================

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    description: String,
    instructor_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    course_id: Uuid,
    position: i64,
    title: String,
    content: String,
}
impl LessonRecord {
    fn to_domain(self) -> PortResult<Lesson> {
        Ok(Lesson {
            id: self.id,
            course_id: self.course_id,
            position: to_u32(self.position)?,
            title: self.title,
            content: self.content,
        })
    }
}

#[derive(FromRow)]
struct ResourceRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    url: String,
}
impl ResourceRecord {
    fn to_domain(self) -> Resource {
        Resource {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            url: self.url,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    user_id: Uuid,
    course_id: Uuid,
    overall_progress: i64,
    quizzes_completed: i64,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct LessonCompletionRecord {
    lesson_id: Uuid,
    completed: bool,
}

#[derive(FromRow)]
struct QuizCompletionRecord {
    quiz_id: Uuid,
    score: i64,
    passed: bool,
    completed_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct AchievementRecord {
    id: Uuid,
    user_id: Uuid,
    code: String,
    earned_at: DateTime<Utc>,
}
impl AchievementRecord {
    fn to_domain(self) -> PortResult<Achievement> {
        Ok(Achievement {
            id: self.id,
            user_id: self.user_id,
            kind: AchievementKind::from_str(&self.code).map_err(corrupt)?,
            earned_at: self.earned_at,
        })
    }
}

//=========================================================================================
// Shared Loaders and Writers
//=========================================================================================

async fn load_course(conn: &mut SqliteConnection, course_id: Uuid) -> PortResult<Course> {
    let record = sqlx::query_as::<_, CourseRecord>(
        "SELECT id, title, description, instructor_id, created_at FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(unexpected)?
    .ok_or_else(|| PortError::NotFound("Course not found".to_string()))?;
    assemble_course(conn, record).await
}

async fn assemble_course(conn: &mut SqliteConnection, record: CourseRecord) -> PortResult<Course> {
    let lessons = sqlx::query_as::<_, LessonRecord>(
        "SELECT id, course_id, position, title, content FROM lessons WHERE course_id = ? ORDER BY position",
    )
    .bind(record.id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?
    .into_iter()
    .map(LessonRecord::to_domain)
    .collect::<PortResult<Vec<_>>>()?;

    let resources = sqlx::query_as::<_, ResourceRecord>(
        "SELECT id, course_id, title, url FROM resources WHERE course_id = ? ORDER BY position",
    )
    .bind(record.id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?
    .into_iter()
    .map(ResourceRecord::to_domain)
    .collect();

    Ok(Course {
        id: record.id,
        title: record.title,
        description: record.description,
        instructor_id: record.instructor_id,
        lessons,
        resources,
        created_at: record.created_at,
    })
}

async fn assemble_courses(conn: &mut SqliteConnection, records: Vec<CourseRecord>) -> PortResult<Vec<Course>> {
    let mut courses = Vec::with_capacity(records.len());
    for record in records {
        courses.push(assemble_course(conn, record).await?);
    }
    Ok(courses)
}

async fn find_progress(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> PortResult<Option<Progress>> {
    let record = sqlx::query_as::<_, ProgressRecord>(
        "SELECT user_id, course_id, overall_progress, quizzes_completed, updated_at
         FROM progress WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(unexpected)?;

    match record {
        Some(record) => Ok(Some(assemble_progress(conn, record).await?)),
        None => Ok(None),
    }
}

async fn assemble_progress(conn: &mut SqliteConnection, record: ProgressRecord) -> PortResult<Progress> {
    let lessons = sqlx::query_as::<_, LessonCompletionRecord>(
        "SELECT lesson_id, completed FROM lesson_completions
         WHERE user_id = ? AND course_id = ? ORDER BY position",
    )
    .bind(record.user_id)
    .bind(record.course_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?
    .into_iter()
    .map(|r| LessonProgress {
        lesson_id: r.lesson_id,
        completed: r.completed,
    })
    .collect();

    let quizzes = sqlx::query_as::<_, QuizCompletionRecord>(
        "SELECT quiz_id, score, passed, completed_at FROM quiz_completions
         WHERE user_id = ? AND course_id = ? ORDER BY completed_at",
    )
    .bind(record.user_id)
    .bind(record.course_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?
    .into_iter()
    .map(|r| {
        Ok(QuizCompletion {
            quiz_id: r.quiz_id,
            score: to_u8(r.score)?,
            passed: r.passed,
            completed_at: r.completed_at,
        })
    })
    .collect::<PortResult<Vec<_>>>()?;

    Ok(Progress {
        user_id: record.user_id,
        course_id: record.course_id,
        lessons,
        quizzes,
        overall_progress: to_u8(record.overall_progress)?,
        quizzes_completed: to_u32(record.quizzes_completed)?,
        updated_at: record.updated_at,
    })
}

/// Writes the whole tracker, replacing its lesson and quiz rows.
async fn save_progress(conn: &mut SqliteConnection, progress: &Progress) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO progress (user_id, course_id, overall_progress, quizzes_completed, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (user_id, course_id) DO UPDATE SET
             overall_progress = excluded.overall_progress,
             quizzes_completed = excluded.quizzes_completed,
             updated_at = excluded.updated_at",
    )
    .bind(progress.user_id)
    .bind(progress.course_id)
    .bind(progress.overall_progress as i64)
    .bind(progress.quizzes_completed as i64)
    .bind(progress.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(unexpected)?;

    sqlx::query("DELETE FROM lesson_completions WHERE user_id = ? AND course_id = ?")
        .bind(progress.user_id)
        .bind(progress.course_id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    for (position, lesson) in progress.lessons.iter().enumerate() {
        sqlx::query(
            "INSERT INTO lesson_completions (user_id, course_id, lesson_id, position, completed)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(progress.user_id)
        .bind(progress.course_id)
        .bind(lesson.lesson_id)
        .bind(position as i64)
        .bind(lesson.completed)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    }

    sqlx::query("DELETE FROM quiz_completions WHERE user_id = ? AND course_id = ?")
        .bind(progress.user_id)
        .bind(progress.course_id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    for quiz in &progress.quizzes {
        sqlx::query(
            "INSERT INTO quiz_completions (user_id, course_id, quiz_id, score, passed, completed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(progress.user_id)
        .bind(progress.course_id)
        .bind(quiz.quiz_id)
        .bind(quiz.score as i64)
        .bind(quiz.passed)
        .bind(quiz.completed_at)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    }
    Ok(())
}

async fn held_achievements(conn: &mut SqliteConnection, user_id: Uuid) -> PortResult<Vec<AchievementKind>> {
    sqlx::query_as::<_, AchievementRecord>(
        "SELECT id, user_id, code, earned_at FROM achievements WHERE user_id = ? ORDER BY earned_at",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(unexpected)?
    .into_iter()
    .map(|r| r.to_domain().map(|a| a.kind))
    .collect()
}

/// Stores each newly earned achievement and tells the user about it.
async fn award_achievements(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    kinds: &[AchievementKind],
    at: DateTime<Utc>,
) -> PortResult<Vec<Achievement>> {
    let mut awarded = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let achievement = Achievement {
            id: Uuid::new_v4(),
            user_id,
            kind,
            earned_at: at,
        };
        sqlx::query("INSERT INTO achievements (id, user_id, code, earned_at) VALUES (?, ?, ?, ?)")
            .bind(achievement.id)
            .bind(user_id)
            .bind(kind.code())
            .bind(at)
            .execute(&mut *conn)
            .await
            .map_err(unexpected)?;
        insert_notification(
            conn,
            NewNotification {
                user_id,
                title: "Achievement Unlocked".to_string(),
                message: format!("You earned \"{}\": {}.", kind.title(), kind.description()),
            },
            at,
        )
        .await?;
        awarded.push(achievement);
    }
    Ok(awarded)
}

async fn insert_notification(
    conn: &mut SqliteConnection,
    notification: NewNotification,
    at: DateTime<Utc>,
) -> PortResult<brightlearn_core::Notification> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(id)
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(at)
    .execute(&mut *conn)
    .await
    .map_err(unexpected)?;
    Ok(brightlearn_core::Notification {
        id,
        user_id: notification.user_id,
        title: notification.title,
        message: notification.message,
        read: false,
        created_at: at,
    })
}

async fn insert_activity(
    conn: &mut SqliteConnection,
    activity: brightlearn_core::NewActivity,
    at: DateTime<Utc>,
) -> PortResult<brightlearn_core::Activity> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO activities (id, user_id, kind, description, score, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(activity.user_id)
    .bind(activity.kind.as_str())
    .bind(&activity.description)
    .bind(activity.score.map(i64::from))
    .bind(at)
    .execute(&mut *conn)
    .await
    .map_err(unexpected)?;
    Ok(brightlearn_core::Activity {
        id,
        user_id: activity.user_id,
        kind: activity.kind,
        description: activity.description,
        score: activity.score,
        created_at: at,
    })
}

async fn ensure_user_exists(conn: &mut SqliteConnection, user_id: Uuid) -> PortResult<()> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;
    found
        .map(|_| ())
        .ok_or_else(|| PortError::NotFound("User not found".to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::DbAdapter;

    pub async fn fresh_db() -> DbAdapter {
        let db = DbAdapter::in_memory().await.expect("in-memory database");
        db.run_migrations().await.expect("migrations");
        db
    }
}
