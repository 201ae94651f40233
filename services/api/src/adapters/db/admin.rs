use async_trait::async_trait;
use brightlearn_core::domain::{AuditLog, DisciplinaryRecord, NewDisciplinaryRecord, PlatformCounts};
use brightlearn_core::ports::{AdminStore, PortResult};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{corrupt, ensure_user_exists, unexpected, DbAdapter};

#[derive(FromRow)]
struct DisciplinaryRecordRow {
    id: Uuid,
    student_id: Uuid,
    description: String,
    action: String,
    recorded_by: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct AuditLogRecord {
    id: Uuid,
    actor_id: Uuid,
    action: String,
    target: String,
    created_at: DateTime<Utc>,
}
impl AuditLogRecord {
    fn to_domain(self) -> AuditLog {
        AuditLog {
            id: self.id,
            actor_id: self.actor_id,
            action: self.action,
            target: self.target,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CountsRecord {
    total_users: i64,
    total_courses: i64,
    active_courses: i64,
}

#[async_trait]
impl AdminStore for DbAdapter {
    async fn record_disciplinary(&self, record: NewDisciplinaryRecord) -> PortResult<DisciplinaryRecord> {
        let mut conn = self.write_conn().await?;
        ensure_user_exists(&mut conn, record.student_id).await?;
        let row = sqlx::query_as::<_, DisciplinaryRecordRow>(
            "INSERT INTO disciplinary_records (id, student_id, description, action, recorded_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, student_id, description, action, recorded_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(record.student_id)
        .bind(&record.description)
        .bind(&record.action)
        .bind(record.recorded_by)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(DisciplinaryRecord {
            id: row.id,
            student_id: row.student_id,
            description: row.description,
            action: row.action,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
        })
    }

    async fn append_audit_log(&self, actor_id: Uuid, action: &str, target: &str) -> PortResult<AuditLog> {
        let mut conn = self.write_conn().await?;
        let record = sqlx::query_as::<_, AuditLogRecord>(
            "INSERT INTO audit_logs (id, actor_id, action, target, created_at) VALUES (?, ?, ?, ?, ?)
             RETURNING id, actor_id, action, target, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(actor_id)
        .bind(action)
        .bind(target)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_audit_logs(&self) -> PortResult<Vec<AuditLog>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, AuditLogRecord>(
            "SELECT id, actor_id, action, target, created_at FROM audit_logs ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(AuditLogRecord::to_domain).collect())
    }

    async fn platform_counts(&self) -> PortResult<PlatformCounts> {
        let mut conn = self.conn().await?;
        let counts = sqlx::query_as::<_, CountsRecord>(
            "SELECT
                 (SELECT COUNT(*) FROM users) AS total_users,
                 (SELECT COUNT(*) FROM courses) AS total_courses,
                 (SELECT COUNT(DISTINCT course_id) FROM lessons) AS active_courses",
        )
        .fetch_one(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(PlatformCounts {
            total_users: u64::try_from(counts.total_users).map_err(corrupt)?,
            total_courses: u64::try_from(counts.total_courses).map_err(corrupt)?,
            active_courses: u64::try_from(counts.active_courses).map_err(corrupt)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::db::test_support::fresh_db;
    use brightlearn_core::domain::{NewCourse, NewLesson, NewUser, Role};
    use brightlearn_core::ports::{CourseStore, PortError, UserStore};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn audit_log_lists_newest_first() {
        let db = fresh_db().await;
        let actor = Uuid::new_v4();
        db.append_audit_log(actor, "create_teacher", "bob@teacher.com").await.unwrap();
        db.append_audit_log(actor, "deactivate_teacher", "bob@teacher.com").await.unwrap();

        let actions: Vec<_> = db
            .list_audit_logs()
            .await
            .unwrap()
            .into_iter()
            .map(|log| log.action)
            .collect();
        assert_eq!(actions, vec!["deactivate_teacher", "create_teacher"]);
    }

    #[tokio::test]
    async fn counts_treat_courses_with_lessons_as_active() {
        let db = fresh_db().await;
        db.create_user(NewUser {
            name: "Carol".to_string(),
            email: "carol@admin.com".to_string(),
            hashed_password: "x".to_string(),
            role: Role::Admin,
            school_email: None,
        })
        .await
        .unwrap();
        for lessons in [0usize, 2] {
            db.create_course(NewCourse {
                title: format!("Course with {lessons} lessons"),
                description: String::new(),
                instructor_id: None,
                lessons: (0..lessons)
                    .map(|i| NewLesson {
                        title: format!("Lesson {i}"),
                        content: String::new(),
                    })
                    .collect(),
                resources: vec![],
            })
            .await
            .unwrap();
        }

        let counts = db.platform_counts().await.unwrap();
        assert_eq!(
            counts,
            PlatformCounts {
                total_users: 1,
                total_courses: 2,
                active_courses: 1,
            }
        );
    }

    #[tokio::test]
    async fn disciplinary_record_needs_a_known_student() {
        let db = fresh_db().await;
        let err = db
            .record_disciplinary(NewDisciplinaryRecord {
                student_id: Uuid::new_v4(),
                description: "Late twice".to_string(),
                action: "warning".to_string(),
                recorded_by: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
