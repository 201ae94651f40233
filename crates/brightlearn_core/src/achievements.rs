//! crates/brightlearn_core/src/achievements.rs
//!
//! The achievement catalogue and the rules deciding when one is earned.
//! Each achievement is awarded at most once per user.

use std::str::FromStr;

use crate::domain::ParseKindError;
use crate::grading::GradeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementKind {
    FirstQuizPassed,
    PerfectScore,
    CourseCompleted,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 3] = [
        AchievementKind::FirstQuizPassed,
        AchievementKind::PerfectScore,
        AchievementKind::CourseCompleted,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AchievementKind::FirstQuizPassed => "first-quiz-passed",
            AchievementKind::PerfectScore => "perfect-score",
            AchievementKind::CourseCompleted => "course-completed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AchievementKind::FirstQuizPassed => "First Steps",
            AchievementKind::PerfectScore => "Perfectionist",
            AchievementKind::CourseCompleted => "Course Finisher",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementKind::FirstQuizPassed => "Passed your first quiz",
            AchievementKind::PerfectScore => "Scored 100% on a quiz",
            AchievementKind::CourseCompleted => "Completed every lesson of a course",
        }
    }
}

impl FromStr for AchievementKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AchievementKind::ALL
            .into_iter()
            .find(|k| k.code() == s)
            .ok_or_else(|| ParseKindError::new("achievement", s))
    }
}

/// Achievements unlocked by a graded quiz attempt that the user does not hold yet.
pub fn earned_for_quiz(held: &[AchievementKind], outcome: &GradeOutcome) -> Vec<AchievementKind> {
    let mut earned = Vec::new();
    if outcome.passed {
        earned.push(AchievementKind::FirstQuizPassed);
    }
    if outcome.total_questions > 0 && outcome.score == 100 {
        earned.push(AchievementKind::PerfectScore);
    }
    earned.retain(|k| !held.contains(k));
    earned
}

/// Achievements unlocked by a progress update.
pub fn earned_for_progress(held: &[AchievementKind], course_completed: bool) -> Vec<AchievementKind> {
    if course_completed && !held.contains(&AchievementKind::CourseCompleted) {
        vec![AchievementKind::CourseCompleted]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome(score: u8, passed: bool) -> GradeOutcome {
        GradeOutcome {
            correct_answers: 0,
            total_questions: 4,
            score,
            passed,
            review: Vec::new(),
        }
    }

    #[test]
    fn perfect_pass_earns_both_quiz_achievements() {
        assert_eq!(
            earned_for_quiz(&[], &outcome(100, true)),
            vec![AchievementKind::FirstQuizPassed, AchievementKind::PerfectScore]
        );
    }

    #[test]
    fn held_achievements_are_not_awarded_twice() {
        assert_eq!(
            earned_for_quiz(&[AchievementKind::FirstQuizPassed], &outcome(100, true)),
            vec![AchievementKind::PerfectScore]
        );
        assert!(earned_for_quiz(&[], &outcome(40, false)).is_empty());
    }

    #[test]
    fn course_completion_is_awarded_once() {
        assert_eq!(earned_for_progress(&[], true), vec![AchievementKind::CourseCompleted]);
        assert!(earned_for_progress(&[AchievementKind::CourseCompleted], true).is_empty());
        assert!(earned_for_progress(&[], false).is_empty());
    }

    #[test]
    fn codes_parse_back() {
        for kind in AchievementKind::ALL {
            assert_eq!(kind.code().parse::<AchievementKind>().unwrap(), kind);
        }
        assert!("gold-star".parse::<AchievementKind>().is_err());
    }
}
