use std::str::FromStr;

use async_trait::async_trait;
use brightlearn_core::domain::{
    Achievement, Activity, ActivityKind, NewNotification, Notification,
};
use brightlearn_core::ports::{EngagementStore, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    corrupt, ensure_user_exists, insert_notification, to_u8, unexpected,
    AchievementRecord, DbAdapter,
};

#[derive(FromRow)]
struct NotificationRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}
impl NotificationRecord {
    fn to_domain(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ActivityRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    description: String,
    score: Option<i64>,
    created_at: DateTime<Utc>,
}
impl ActivityRecord {
    fn to_domain(self) -> PortResult<Activity> {
        Ok(Activity {
            id: self.id,
            user_id: self.user_id,
            kind: ActivityKind::from_str(&self.kind).map_err(corrupt)?,
            description: self.description,
            score: self.score.map(to_u8).transpose()?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl EngagementStore for DbAdapter {
    async fn create_notification(&self, notification: NewNotification) -> PortResult<Notification> {
        let mut conn = self.write_conn().await?;
        ensure_user_exists(&mut conn, notification.user_id).await?;
        insert_notification(&mut conn, notification, Utc::now()).await
    }

    async fn list_notifications(&self, user_id: Uuid) -> PortResult<Vec<Notification>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, NotificationRecord>(
            "SELECT id, user_id, title, message, read, created_at FROM notifications
             WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(NotificationRecord::to_domain).collect())
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> PortResult<Notification> {
        let mut conn = self.write_conn().await?;
        let record = sqlx::query_as::<_, NotificationRecord>(
            "UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?
             RETURNING id, user_id, title, message, read, created_at",
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;
        record
            .map(NotificationRecord::to_domain)
            .ok_or_else(|| PortError::NotFound("Notification not found".to_string()))
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> PortResult<u64> {
        let mut conn = self.write_conn().await?;
        let changed = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(unexpected)?
            .rows_affected();
        Ok(changed)
    }

    async fn list_achievements(&self, user_id: Uuid) -> PortResult<Vec<Achievement>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, AchievementRecord>(
            "SELECT id, user_id, code, earned_at FROM achievements WHERE user_id = ? ORDER BY earned_at, rowid",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(AchievementRecord::to_domain).collect()
    }

    async fn list_activities(&self, user_id: Uuid, limit: u32) -> PortResult<Vec<Activity>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, user_id, kind, description, score, created_at FROM activities
             WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(ActivityRecord::to_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::db::insert_activity;
    use crate::adapters::db::test_support::fresh_db;
    use brightlearn_core::domain::{NewActivity, NewUser, Role};
    use brightlearn_core::ports::UserStore;
    use pretty_assertions::assert_eq;

    async fn alice(db: &DbAdapter) -> Uuid {
        db.create_user(NewUser {
            name: "Alice Student".to_string(),
            email: "alice@student.com".to_string(),
            hashed_password: "x".to_string(),
            role: Role::Student,
            school_email: None,
        })
        .await
        .unwrap()
        .id
    }

    fn note(user_id: Uuid, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            title: title.to_string(),
            message: "Check the course page".to_string(),
        }
    }

    #[tokio::test]
    async fn notifications_are_private_to_their_owner() {
        let db = fresh_db().await;
        let user_id = alice(&db).await;
        let created = db.create_notification(note(user_id, "New grade")).await.unwrap();

        let err = db.mark_notification_read(created.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(msg) if msg == "Notification not found"));

        let read = db.mark_notification_read(created.id, user_id).await.unwrap();
        assert!(read.read);
    }

    #[tokio::test]
    async fn read_all_reports_how_many_changed() {
        let db = fresh_db().await;
        let user_id = alice(&db).await;
        db.create_notification(note(user_id, "One")).await.unwrap();
        db.create_notification(note(user_id, "Two")).await.unwrap();

        assert_eq!(db.mark_all_notifications_read(user_id).await.unwrap(), 2);
        assert_eq!(db.mark_all_notifications_read(user_id).await.unwrap(), 0);

        let titles: Vec<_> = db
            .list_notifications(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Two", "One"]);
    }

    #[tokio::test]
    async fn activity_feed_is_newest_first_and_limited() {
        let db = fresh_db().await;
        let user_id = alice(&db).await;
        let mut conn = db.write_conn().await.unwrap();
        for i in 0..12u8 {
            insert_activity(
                &mut conn,
                NewActivity {
                    user_id,
                    kind: ActivityKind::QuizSubmitted,
                    description: format!("Attempt {i}"),
                    score: Some(i * 5),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        }
        drop(conn);

        let feed = db.list_activities(user_id, 10).await.unwrap();
        assert_eq!(feed.len(), 10);
        assert_eq!(feed[0].description, "Attempt 11");
        assert_eq!(feed[0].score, Some(55));
    }
}
