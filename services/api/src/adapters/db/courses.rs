//! `CourseStore` on SQLite. A course is stored across `courses`, `lessons` and
//! `resources`; every multi-table write runs in one transaction.

use async_trait::async_trait;
use brightlearn_core::domain::{Course, CourseUpdate, Lesson, NewCourse, NewLesson, NewResource};
use brightlearn_core::ports::{CourseStore, PortError, PortResult};
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

use super::{
    assemble_courses, find_progress, load_course, save_progress, unexpected, CourseRecord,
    DbAdapter, LessonRecord,
};

const COURSE_COLUMNS: &str = "id, title, description, instructor_id, created_at";

/// Rewrites the lesson list, keeping the id of the lesson already at each
/// position so that completion flags survive edits.
async fn replace_lessons(conn: &mut SqliteConnection, course_id: Uuid, lessons: &[NewLesson]) -> PortResult<()> {
    let existing: Vec<(Uuid, i64)> =
        sqlx::query_as("SELECT id, position FROM lessons WHERE course_id = ? ORDER BY position")
            .bind(course_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(unexpected)?;

    for (position, lesson) in lessons.iter().enumerate() {
        match existing.iter().find(|(_, p)| *p == position as i64) {
            Some((lesson_id, _)) => {
                sqlx::query("UPDATE lessons SET title = ?, content = ? WHERE id = ?")
                    .bind(&lesson.title)
                    .bind(&lesson.content)
                    .bind(lesson_id)
                    .execute(&mut *conn)
                    .await
                    .map_err(unexpected)?;
            }
            None => {
                sqlx::query("INSERT INTO lessons (id, course_id, position, title, content) VALUES (?, ?, ?, ?, ?)")
                    .bind(Uuid::new_v4())
                    .bind(course_id)
                    .bind(position as i64)
                    .bind(&lesson.title)
                    .bind(&lesson.content)
                    .execute(&mut *conn)
                    .await
                    .map_err(unexpected)?;
            }
        }
    }

    sqlx::query("DELETE FROM lessons WHERE course_id = ? AND position >= ?")
        .bind(course_id)
        .bind(lessons.len() as i64)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    Ok(())
}

async fn replace_resources(conn: &mut SqliteConnection, course_id: Uuid, resources: &[NewResource]) -> PortResult<()> {
    sqlx::query("DELETE FROM resources WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    for (position, resource) in resources.iter().enumerate() {
        sqlx::query("INSERT INTO resources (id, course_id, position, title, url) VALUES (?, ?, ?, ?, ?)")
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(position as i64)
            .bind(&resource.title)
            .bind(&resource.url)
            .execute(&mut *conn)
            .await
            .map_err(unexpected)?;
    }
    Ok(())
}

/// Re-aligns every tracker of the course with its current lessons.
async fn resync_progress(conn: &mut SqliteConnection, course: &Course) -> PortResult<()> {
    let learners: Vec<(Uuid,)> = sqlx::query_as("SELECT user_id FROM progress WHERE course_id = ?")
        .bind(course.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
    let lesson_ids = course.lesson_ids();
    for (user_id,) in learners {
        if let Some(mut progress) = find_progress(conn, user_id, course.id).await? {
            progress.sync_lessons(&lesson_ids);
            save_progress(conn, &progress).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl CourseStore for DbAdapter {
    async fn create_course(&self, course: NewCourse) -> PortResult<Course> {
        let mut tx = self.begin_write().await?;
        let course_id = Uuid::new_v4();
        sqlx::query("INSERT INTO courses (id, title, description, instructor_id, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(course_id)
            .bind(&course.title)
            .bind(&course.description)
            .bind(course.instructor_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        replace_lessons(&mut tx, course_id, &course.lessons).await?;
        replace_resources(&mut tx, course_id, &course.resources).await?;
        let created = load_course(&mut tx, course_id).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(created)
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let mut conn = self.conn().await?;
        load_course(&mut conn, course_id).await
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at, title"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        assemble_courses(&mut conn, records).await
    }

    async fn list_courses_by_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<Course>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = ? ORDER BY created_at, title"
        ))
        .bind(instructor_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        assemble_courses(&mut conn, records).await
    }

    async fn update_course(&self, course_id: Uuid, update: CourseUpdate) -> PortResult<Course> {
        let mut tx = self.begin_write().await?;
        let changed = sqlx::query(
            "UPDATE courses SET
                 title = COALESCE(?, title),
                 description = COALESCE(?, description),
                 instructor_id = COALESCE(?, instructor_id)
             WHERE id = ?",
        )
        .bind(update.title)
        .bind(update.description)
        .bind(update.instructor_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();
        if changed == 0 {
            return Err(PortError::NotFound("Course not found".to_string()));
        }

        if let Some(resources) = &update.resources {
            replace_resources(&mut tx, course_id, resources).await?;
        }
        let lessons_changed = update.lessons.is_some();
        if let Some(lessons) = &update.lessons {
            replace_lessons(&mut tx, course_id, lessons).await?;
        }

        let course = load_course(&mut tx, course_id).await?;
        if lessons_changed {
            resync_progress(&mut tx, &course).await?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(course)
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        let mut conn = self.write_conn().await?;
        let deleted = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(course_id)
            .execute(&mut *conn)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if deleted == 0 {
            return Err(PortError::NotFound("Course not found".to_string()));
        }
        Ok(())
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let mut conn = self.conn().await?;
        let record = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, course_id, position, title, content FROM lessons WHERE id = ?",
        )
        .bind(lesson_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;
        record
            .ok_or_else(|| PortError::NotFound("Lesson not found".to_string()))?
            .to_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::db::test_support::fresh_db;
    use brightlearn_core::ports::ProgressStore;
    use pretty_assertions::assert_eq;

    fn lesson(title: &str) -> NewLesson {
        NewLesson {
            title: title.to_string(),
            content: format!("{title} content"),
        }
    }

    fn math_101() -> NewCourse {
        NewCourse {
            title: "Math 101".to_string(),
            description: "Basic Math".to_string(),
            instructor_id: None,
            lessons: vec![lesson("Intro"), lesson("Fractions")],
            resources: vec![NewResource {
                title: "Cheat sheet".to_string(),
                url: "https://example.org/sheet.pdf".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn course_round_trips_with_children_in_order() {
        let db = fresh_db().await;
        let created = db.create_course(math_101()).await.unwrap();

        let loaded = db.get_course(created.id).await.unwrap();
        let titles: Vec<_> = loaded.lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Fractions"]);
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(db.get_lesson(loaded.lessons[1].id).await.unwrap().title, "Fractions");
    }

    #[tokio::test]
    async fn editing_lessons_keeps_ids_and_completion() {
        let db = fresh_db().await;
        let course = db.create_course(math_101()).await.unwrap();
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (id, name, email, password_hash, role, created_at)
             VALUES (?, 'Alice', 'alice@student.com', 'x', 'student', ?) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .fetch_one(&db.pool)
        .await
        .unwrap();
        db.mark_lesson(user_id, course.lessons[0].id, true, Utc::now()).await.unwrap();

        let updated = db
            .update_course(
                course.id,
                CourseUpdate {
                    lessons: Some(vec![lesson("Intro (revised)"), lesson("Fractions"), lesson("Decimals")]),
                    ..CourseUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.lessons[0].id, course.lessons[0].id);
        assert_eq!(updated.lessons[0].title, "Intro (revised)");
        assert_eq!(updated.lessons.len(), 3);

        let progress = db.get_progress(user_id, course.id).await.unwrap();
        assert_eq!(progress.lessons.len(), 3);
        assert!(progress.lessons[0].completed);
        assert_eq!(progress.overall_progress, 33);
    }

    #[tokio::test]
    async fn deleting_unknown_course_is_not_found() {
        let db = fresh_db().await;
        let err = db.delete_course(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
