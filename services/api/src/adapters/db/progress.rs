use async_trait::async_trait;
use brightlearn_core::achievements::earned_for_progress;
use brightlearn_core::domain::{ActivityKind, NewActivity, Progress};
use brightlearn_core::ports::{LessonMarked, PortError, PortResult, ProgressStore};
use brightlearn_core::progress::new_progress;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    assemble_progress, award_achievements, ensure_user_exists, find_progress, held_achievements,
    insert_activity, load_course, save_progress, unexpected, DbAdapter, ProgressRecord,
};

#[async_trait]
impl ProgressStore for DbAdapter {
    async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Progress> {
        let mut conn = self.conn().await?;
        find_progress(&mut conn, user_id, course_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Progress not found".to_string()))
    }

    async fn list_progress_for_user(&self, user_id: Uuid) -> PortResult<Vec<Progress>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, ProgressRecord>(
            "SELECT user_id, course_id, overall_progress, quizzes_completed, updated_at
             FROM progress WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;

        let mut trackers = Vec::with_capacity(records.len());
        for record in records {
            trackers.push(assemble_progress(&mut conn, record).await?);
        }
        Ok(trackers)
    }

    async fn mark_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
        at: DateTime<Utc>,
    ) -> PortResult<LessonMarked> {
        let mut tx = self.begin_write().await?;
        ensure_user_exists(&mut tx, user_id).await?;

        let found: Option<(Uuid,)> = sqlx::query_as("SELECT course_id FROM lessons WHERE id = ?")
            .bind(lesson_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        let (course_id,) = found.ok_or_else(|| PortError::NotFound("Lesson not found".to_string()))?;
        let course = load_course(&mut tx, course_id).await?;
        let lesson_ids = course.lesson_ids();

        let mut progress = match find_progress(&mut tx, user_id, course_id).await? {
            Some(mut existing) => {
                existing.sync_lessons(&lesson_ids);
                existing
            }
            None => new_progress(user_id, course_id, &lesson_ids, at),
        };
        let course_completed = progress.set_lesson_completed(lesson_id, completed, at);
        save_progress(&mut tx, &progress).await?;

        if completed {
            let title = course
                .lessons
                .iter()
                .find(|l| l.id == lesson_id)
                .map(|l| l.title.as_str())
                .unwrap_or("a lesson");
            insert_activity(
                &mut tx,
                NewActivity {
                    user_id,
                    kind: ActivityKind::LessonCompleted,
                    description: format!("Completed {} in {}", title, course.title),
                    score: None,
                },
                at,
            )
            .await?;
        }

        let held = held_achievements(&mut tx, user_id).await?;
        let earned = earned_for_progress(&held, course_completed);
        let achievements = award_achievements(&mut tx, user_id, &earned, at).await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(LessonMarked { progress, achievements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::db::test_support::fresh_db;
    use brightlearn_core::domain::{Course, NewCourse, NewLesson, NewUser, Role};
    use brightlearn_core::ports::{CourseStore, EngagementStore, UserStore};
    use brightlearn_core::AchievementKind;
    use pretty_assertions::assert_eq;

    async fn seed(db: &DbAdapter, lessons: usize) -> (Uuid, Course) {
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
                lessons: (0..lessons)
                    .map(|i| NewLesson {
                        title: format!("Lesson {}", i + 1),
                        content: String::new(),
                    })
                    .collect(),
                resources: vec![],
            })
            .await
            .unwrap();
        (user.id, course)
    }

    #[tokio::test]
    async fn first_mark_creates_the_tracker() {
        let db = fresh_db().await;
        let (user_id, course) = seed(&db, 2).await;

        let marked = db.mark_lesson(user_id, course.lessons[0].id, true, Utc::now()).await.unwrap();

        assert_eq!(marked.progress.overall_progress, 50);
        assert!(marked.achievements.is_empty());
        let stored = db.get_progress(user_id, course.id).await.unwrap();
        assert_eq!(stored.lessons, marked.progress.lessons);
    }

    #[tokio::test]
    async fn finishing_the_course_awards_once() {
        let db = fresh_db().await;
        let (user_id, course) = seed(&db, 1).await;
        let lesson_id = course.lessons[0].id;

        let done = db.mark_lesson(user_id, lesson_id, true, Utc::now()).await.unwrap();
        assert_eq!(done.progress.overall_progress, 100);
        assert_eq!(done.achievements[0].kind, AchievementKind::CourseCompleted);

        db.mark_lesson(user_id, lesson_id, false, Utc::now()).await.unwrap();
        let again = db.mark_lesson(user_id, lesson_id, true, Utc::now()).await.unwrap();
        assert!(again.achievements.is_empty());
        assert_eq!(db.list_achievements(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_lesson_is_not_found() {
        let db = fresh_db().await;
        let (user_id, _) = seed(&db, 1).await;
        let err = db.mark_lesson(user_id, Uuid::new_v4(), true, Utc::now()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(msg) if msg == "Lesson not found"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_marks_on_a_file_database_all_land() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("brightlearn.db").display());
        let db = DbAdapter::connect(&url).await.unwrap();
        db.run_migrations().await.unwrap();
        let (user_id, course) = seed(&db, 20).await;

        let handles: Vec<_> = course
            .lessons
            .iter()
            .map(|lesson| {
                let db = db.clone();
                let lesson_id = lesson.id;
                tokio::spawn(async move { db.mark_lesson(user_id, lesson_id, true, Utc::now()).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let progress = db.get_progress(user_id, course.id).await.unwrap();
        assert_eq!(progress.overall_progress, 100);
        assert!(progress.lessons.iter().all(|l| l.completed));
        assert_eq!(db.list_achievements(user_id).await.unwrap().len(), 1);
    }
}
