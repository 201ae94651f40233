//! crates/brightlearn_core/src/progress.rs
//!
//! Progress bookkeeping. `overall_progress` always equals the rounded share of
//! completed lessons, and `quizzes_completed` the number of quiz entries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{LessonProgress, Progress, QuizCompletion};
use crate::grading::percentage;

/// A fresh tracker with every lesson of the course marked incomplete.
pub fn new_progress(user_id: Uuid, course_id: Uuid, lesson_ids: &[Uuid], at: DateTime<Utc>) -> Progress {
    Progress {
        user_id,
        course_id,
        lessons: lesson_ids
            .iter()
            .map(|&lesson_id| LessonProgress {
                lesson_id,
                completed: false,
            })
            .collect(),
        quizzes: Vec::new(),
        overall_progress: 0,
        quizzes_completed: 0,
        updated_at: at,
    }
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.overall_progress == 100
    }

    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.completed).count()
    }

    /// Aligns the lesson list with the course's current lessons, keeping the
    /// flags of lessons that still exist and dropping removed ones.
    pub fn sync_lessons(&mut self, lesson_ids: &[Uuid]) {
        let synced = lesson_ids
            .iter()
            .map(|&lesson_id| LessonProgress {
                lesson_id,
                completed: self
                    .lessons
                    .iter()
                    .any(|l| l.lesson_id == lesson_id && l.completed),
            })
            .collect();
        self.lessons = synced;
        self.recompute();
    }

    /// Sets one lesson's flag. Returns `true` when this change completed the course.
    ///
    /// The caller guarantees `lesson_id` belongs to the course; an id missing from
    /// the tracker is appended.
    pub fn set_lesson_completed(&mut self, lesson_id: Uuid, completed: bool, at: DateTime<Utc>) -> bool {
        let was_complete = self.is_complete();
        match self.lessons.iter_mut().find(|l| l.lesson_id == lesson_id) {
            Some(lesson) => lesson.completed = completed,
            None => self.lessons.push(LessonProgress { lesson_id, completed }),
        }
        self.updated_at = at;
        self.recompute();
        !was_complete && self.is_complete()
    }

    /// Upserts the entry for this quiz; the latest attempt replaces any earlier one.
    pub fn record_quiz(&mut self, completion: QuizCompletion) {
        self.updated_at = completion.completed_at;
        match self.quizzes.iter_mut().find(|q| q.quiz_id == completion.quiz_id) {
            Some(existing) => *existing = completion,
            None => self.quizzes.push(completion),
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.overall_progress = percentage(self.completed_lessons() as u64, self.lessons.len() as u64);
        self.quizzes_completed = self.quizzes.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lessons(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn overall_progress_tracks_completed_share() {
        let ids = lessons(3);
        let mut progress = new_progress(Uuid::new_v4(), Uuid::new_v4(), &ids, Utc::now());
        assert_eq!(progress.overall_progress, 0);

        assert!(!progress.set_lesson_completed(ids[0], true, Utc::now()));
        assert_eq!(progress.overall_progress, 33);
        assert!(!progress.set_lesson_completed(ids[1], true, Utc::now()));
        assert_eq!(progress.overall_progress, 67);
        assert!(progress.set_lesson_completed(ids[2], true, Utc::now()));
        assert_eq!(progress.overall_progress, 100);

        // Completing again is not a new completion.
        assert!(!progress.set_lesson_completed(ids[2], true, Utc::now()));

        progress.set_lesson_completed(ids[1], false, Utc::now());
        assert_eq!(progress.overall_progress, 67);
    }

    #[test]
    fn course_without_lessons_stays_at_zero() {
        let progress = new_progress(Uuid::new_v4(), Uuid::new_v4(), &[], Utc::now());
        assert_eq!(progress.overall_progress, 0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn quiz_completion_is_upserted() {
        let mut progress = new_progress(Uuid::new_v4(), Uuid::new_v4(), &lessons(1), Utc::now());
        let quiz_id = Uuid::new_v4();

        progress.record_quiz(QuizCompletion {
            quiz_id,
            score: 40,
            passed: false,
            completed_at: Utc::now(),
        });
        progress.record_quiz(QuizCompletion {
            quiz_id,
            score: 90,
            passed: true,
            completed_at: Utc::now(),
        });
        progress.record_quiz(QuizCompletion {
            quiz_id: Uuid::new_v4(),
            score: 70,
            passed: true,
            completed_at: Utc::now(),
        });

        assert_eq!(progress.quizzes_completed, 2);
        let first = progress.quizzes.iter().find(|q| q.quiz_id == quiz_id).unwrap();
        assert_eq!(first.score, 90);
        assert!(first.passed);
    }

    #[test]
    fn sync_keeps_flags_of_surviving_lessons() {
        let ids = lessons(2);
        let mut progress = new_progress(Uuid::new_v4(), Uuid::new_v4(), &ids, Utc::now());
        progress.set_lesson_completed(ids[0], true, Utc::now());

        let added = Uuid::new_v4();
        progress.sync_lessons(&[ids[0], added]);

        assert_eq!(
            progress.lessons,
            vec![
                LessonProgress { lesson_id: ids[0], completed: true },
                LessonProgress { lesson_id: added, completed: false },
            ]
        );
        assert_eq!(progress.overall_progress, 50);
    }
}
