//! `EnrollmentStore` on SQLite: enrollments, assignments and submissions.

use async_trait::async_trait;
use brightlearn_core::domain::{
    ActivityKind, Assignment, AssignmentGrade, Enrollment, NewActivity, NewAssignment,
    NewNotification, Submission, User,
};
use brightlearn_core::ports::{EnrollmentStore, PortError, PortResult};
use brightlearn_core::progress::new_progress;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::users::UserRecord;
use super::{
    ensure_user_exists, insert_activity, insert_notification, is_unique_violation, load_course,
    save_progress, unexpected, DbAdapter,
};

#[derive(FromRow)]
struct EnrollmentRecord {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
        }
    }
}

#[derive(FromRow)]
struct AssignmentRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    kind: String,
    created_at: DateTime<Utc>,
}
impl AssignmentRecord {
    fn to_domain(self) -> Assignment {
        Assignment {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            kind: self.kind,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SubmissionRecord {
    assignment_id: Uuid,
    student_id: Uuid,
    content: String,
    grade: Option<f64>,
    feedback: Option<String>,
    submitted_at: DateTime<Utc>,
    graded_at: Option<DateTime<Utc>>,
}
impl SubmissionRecord {
    fn to_domain(self) -> Submission {
        Submission {
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            content: self.content,
            grade: self.grade,
            feedback: self.feedback,
            submitted_at: self.submitted_at,
            graded_at: self.graded_at,
        }
    }
}

#[derive(FromRow)]
struct AssignmentGradeRecord {
    course_title: String,
    assignment_title: String,
    kind: String,
    score: Option<f64>,
    feedback: Option<String>,
}

const SUBMISSION_COLUMNS: &str =
    "assignment_id, student_id, content, grade, feedback, submitted_at, graded_at";

#[async_trait]
impl EnrollmentStore for DbAdapter {
    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> PortResult<Enrollment> {
        let now = Utc::now();
        let mut tx = self.begin_write().await?;
        ensure_user_exists(&mut tx, student_id).await?;
        let course = load_course(&mut tx, course_id).await?;

        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "INSERT INTO enrollments (id, student_id, course_id, enrolled_at) VALUES (?, ?, ?, ?)
             RETURNING id, student_id, course_id, enrolled_at",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("Already enrolled".to_string())
            } else {
                unexpected(e)
            }
        })?;

        // A learner who already opened lessons keeps their tracker.
        let tracked: Option<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM progress WHERE user_id = ? AND course_id = ?")
                .bind(student_id)
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?;
        if tracked.is_none() {
            let progress = new_progress(student_id, course_id, &course.lesson_ids(), now);
            save_progress(&mut tx, &progress).await?;
        }

        insert_activity(
            &mut tx,
            NewActivity {
                user_id: student_id,
                kind: ActivityKind::Enrolled,
                description: format!("Enrolled in {}", course.title),
                score: None,
            },
            now,
        )
        .await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_enrollments_for_student(&self, student_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, student_id, course_id, enrolled_at FROM enrollments
             WHERE student_id = ? ORDER BY enrolled_at",
        )
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(EnrollmentRecord::to_domain).collect())
    }

    async fn list_students_for_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<User>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT DISTINCT u.id, u.name, u.email, u.password_hash, u.role, u.status, u.school_email, u.created_at
             FROM users u
             JOIN enrollments e ON e.student_id = u.id
             JOIN courses c ON c.id = e.course_id
             WHERE c.instructor_id = ?
             ORDER BY u.name",
        )
        .bind(instructor_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn create_assignment(&self, assignment: NewAssignment) -> PortResult<Assignment> {
        let mut conn = self.write_conn().await?;
        load_course(&mut conn, assignment.course_id).await?;
        let record = sqlx::query_as::<_, AssignmentRecord>(
            "INSERT INTO assignments (id, course_id, title, description, due_date, kind, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, course_id, title, description, due_date, kind, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(assignment.course_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.due_date)
        .bind(&assignment.kind)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> PortResult<Assignment> {
        let mut conn = self.conn().await?;
        let record = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT id, course_id, title, description, due_date, kind, created_at
             FROM assignments WHERE id = ?",
        )
        .bind(assignment_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;
        record
            .map(AssignmentRecord::to_domain)
            .ok_or_else(|| PortError::NotFound("Assignment not found".to_string()))
    }

    async fn submit_assignment(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        content: &str,
    ) -> PortResult<Submission> {
        let now = Utc::now();
        let assignment = self.get_assignment(assignment_id).await?;

        let mut tx = self.begin_write().await?;
        let record = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "INSERT INTO submissions (assignment_id, student_id, content, submitted_at)
             VALUES (?, ?, ?, ?)
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(assignment_id)
        .bind(student_id)
        .bind(content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("Already submitted".to_string())
            } else {
                unexpected(e)
            }
        })?;

        insert_activity(
            &mut tx,
            NewActivity {
                user_id: student_id,
                kind: ActivityKind::AssignmentSubmitted,
                description: format!("Submitted {}", assignment.title),
                score: None,
            },
            now,
        )
        .await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_submissions(&self, assignment_id: Uuid) -> PortResult<Vec<Submission>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE assignment_id = ? ORDER BY submitted_at"
        ))
        .bind(assignment_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(SubmissionRecord::to_domain).collect())
    }

    async fn grade_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        grade: f64,
        feedback: Option<String>,
    ) -> PortResult<Submission> {
        let now = Utc::now();
        let mut tx = self.begin_write().await?;
        let submission = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "UPDATE submissions SET grade = ?, feedback = ?, graded_at = ?
             WHERE assignment_id = ? AND student_id = ?
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(grade)
        .bind(feedback)
        .bind(now)
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .map(SubmissionRecord::to_domain)
        .ok_or_else(|| PortError::NotFound("Submission not found".to_string()))?;

        let (title,): (String,) = sqlx::query_as("SELECT title FROM assignments WHERE id = ?")
            .bind(assignment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
        insert_notification(
            &mut tx,
            NewNotification {
                user_id: student_id,
                title: "Assignment Graded".to_string(),
                message: format!("Your submission for {} received a grade of {}", title, grade),
            },
            now,
        )
        .await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(submission)
    }

    async fn list_assignment_grades_for_student(&self, student_id: Uuid) -> PortResult<Vec<AssignmentGrade>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, AssignmentGradeRecord>(
            "SELECT c.title AS course_title, a.title AS assignment_title, a.kind AS kind,
                    s.grade AS score, s.feedback AS feedback
             FROM submissions s
             JOIN assignments a ON a.id = s.assignment_id
             JOIN courses c ON c.id = a.course_id
             WHERE s.student_id = ?
             ORDER BY s.submitted_at DESC",
        )
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| AssignmentGrade {
                course_title: r.course_title,
                assignment_title: r.assignment_title,
                kind: r.kind,
                score: r.score,
                feedback: r.feedback,
            })
            .collect())
    }

    async fn graded_scores_for_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<f64>> {
        let mut conn = self.conn().await?;
        let scores: Vec<(f64,)> = sqlx::query_as(
            "SELECT s.grade
             FROM submissions s
             JOIN assignments a ON a.id = s.assignment_id
             JOIN courses c ON c.id = a.course_id
             WHERE c.instructor_id = ? AND s.grade IS NOT NULL",
        )
        .bind(instructor_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        Ok(scores.into_iter().map(|(score,)| score).collect())
    }
}
