//! crates/brightlearn_core/src/dashboard.rs
//!
//! Aggregates a user's progress, grades and activity into the dashboard summary.

use chrono::NaiveDate;

use crate::domain::{Grade, Progress};
use crate::grading::{percentage, DEFAULT_PASSING_SCORE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub overall_progress: u8,
    pub total_courses: u32,
    pub completed_courses: u32,
    pub avg_score: u8,
    pub passing: bool,
    pub streak: u32,
}

pub fn summarize(
    progress: &[Progress],
    grades: &[Grade],
    activity_days: &[NaiveDate],
    today: NaiveDate,
) -> DashboardSummary {
    let total_courses = progress.len() as u32;
    let completed_courses = progress.iter().filter(|p| p.is_complete()).count() as u32;

    let progress_sum: u64 = progress.iter().map(|p| p.overall_progress as u64).sum();
    // Mean of percentages; `percentage(sum, n * 100)` is the same half-up rounding.
    let overall_progress = percentage(progress_sum, total_courses as u64 * 100);

    let score_sum: u64 = grades.iter().map(|g| g.score as u64).sum();
    let avg_score = percentage(score_sum, grades.len() as u64 * 100);

    DashboardSummary {
        overall_progress,
        total_courses,
        completed_courses,
        avg_score,
        passing: !grades.is_empty() && avg_score >= DEFAULT_PASSING_SCORE,
        streak: streak(activity_days, today),
    }
}

/// Consecutive days with activity, counted backwards from today. A streak is
/// still alive if the most recent active day was yesterday.
pub fn streak(activity_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = activity_days.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&latest) = days.first() else {
        return 0;
    };
    if (today - latest).num_days() > 1 {
        return 0;
    }

    let mut count = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            count += 1;
        } else {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GradeStatus;
    use crate::progress::new_progress;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use uuid::Uuid;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn grade(score: u8) -> Grade {
        Grade {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            score,
            correct_answers: 0,
            total_questions: 0,
            status: GradeStatus::Failed,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&["2026-03-10"], 1)]
    #[case(&["2026-03-09"], 1)]
    #[case(&["2026-03-08"], 0)]
    #[case(&["2026-03-10", "2026-03-09", "2026-03-08", "2026-03-06"], 3)]
    #[case(&["2026-03-09", "2026-03-09", "2026-03-08"], 2)]
    fn streak_counts_consecutive_days(#[case] days: &[&str], #[case] expected: u32) {
        let days: Vec<NaiveDate> = days.iter().map(|d| day(d)).collect();
        assert_eq!(streak(&days, day("2026-03-10")), expected);
    }

    #[test]
    fn summary_averages_progress_and_scores() {
        let now = Utc::now();
        let lessons = [Uuid::new_v4(), Uuid::new_v4()];
        let mut done = new_progress(Uuid::new_v4(), Uuid::new_v4(), &lessons, now);
        done.set_lesson_completed(lessons[0], true, now);
        done.set_lesson_completed(lessons[1], true, now);
        let mut half = new_progress(Uuid::new_v4(), Uuid::new_v4(), &lessons, now);
        half.set_lesson_completed(lessons[0], true, now);

        let today = now.date_naive();
        let summary = summarize(
            &[done, half],
            &[grade(80), grade(55)],
            &[today, today - Duration::days(1)],
            today,
        );

        assert_eq!(
            summary,
            DashboardSummary {
                overall_progress: 75,
                total_courses: 2,
                completed_courses: 1,
                avg_score: 68,
                passing: true,
                streak: 2,
            }
        );
    }

    #[test]
    fn empty_history_is_not_passing() {
        let summary = summarize(&[], &[], &[], day("2026-03-10"));
        assert_eq!(summary.avg_score, 0);
        assert!(!summary.passing);
        assert_eq!(summary.overall_progress, 0);
    }
}
