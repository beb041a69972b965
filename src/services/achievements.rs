//! Achievement detection over the statistics as they stood *before* the
//! submission being graded. At most one achievement fires per submission,
//! picked by priority: perfect accuracy, then score milestone, then answer
//! streak, then speed bonus.

use crate::services::scoring::SPEED_BONUS_WINDOW_SECS;
use crate::state::session::{Achievement, AchievementKind, GameStats};

/// Streak lengths that unlock an answer-streak achievement.
const STREAK_THRESHOLDS: [u32; 6] = [5, 10, 15, 20, 25, 50];

/// Score milestones; each fires exactly once, on the submission whose points
/// carry the total across the threshold.
const SCORE_MILESTONES: [u32; 8] = [100, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000];

/// Answered-count tiers at which a perfect run is celebrated.
const PERFECT_ACCURACY_TIERS: [u32; 4] = [5, 10, 25, 50];

/// Detect the single highest-priority achievement unlocked by a submission.
///
/// `prev` is the statistics snapshot taken before the submission was applied;
/// the outcome of the submission itself arrives through `is_correct`,
/// `points_earned`, and `time_taken_secs`.
pub fn detect(
    prev: &GameStats,
    is_correct: bool,
    points_earned: u32,
    time_taken_secs: u32,
) -> Option<Achievement> {
    perfect_accuracy(prev, is_correct)
        .or_else(|| score_milestone(prev, points_earned))
        .or_else(|| answer_streak(prev, is_correct))
        .or_else(|| speed_bonus(is_correct, time_taken_secs))
}

fn perfect_accuracy(prev: &GameStats, is_correct: bool) -> Option<Achievement> {
    if !is_correct {
        return None;
    }

    let answered = prev.questions_answered + 1;
    let correct = prev.correct_answers + 1;
    if correct != answered || !PERFECT_ACCURACY_TIERS.contains(&answered) {
        return None;
    }

    let message = match answered {
        50 => "Fifty questions, fifty correct answers. Untouchable.".to_string(),
        25 => "Twenty-five for twenty-five. A flawless run.".to_string(),
        10 => "Ten straight without a single miss.".to_string(),
        _ => format!("{answered} answers, all of them correct."),
    };

    Some(Achievement {
        kind: AchievementKind::PerfectAccuracy,
        title: "Perfectionist".into(),
        message,
        value: Some(answered),
    })
}

fn score_milestone(prev: &GameStats, points_earned: u32) -> Option<Achievement> {
    let new_score = prev.total_score + points_earned;
    let milestone = SCORE_MILESTONES
        .iter()
        .copied()
        .find(|&milestone| prev.total_score < milestone && new_score >= milestone)?;

    Some(Achievement {
        kind: AchievementKind::ScoreMilestone,
        title: "Milestone".into(),
        message: format!("Total score passed {milestone} points."),
        value: Some(milestone),
    })
}

fn answer_streak(prev: &GameStats, is_correct: bool) -> Option<Achievement> {
    if !is_correct {
        return None;
    }

    let streak = prev.current_streak + 1;
    if !STREAK_THRESHOLDS.contains(&streak) {
        return None;
    }

    Some(Achievement {
        kind: AchievementKind::AnswerStreak,
        title: "On a roll".into(),
        message: format!("{streak} correct answers in a row."),
        value: Some(streak),
    })
}

fn speed_bonus(is_correct: bool, time_taken_secs: u32) -> Option<Achievement> {
    if !is_correct || time_taken_secs > SPEED_BONUS_WINDOW_SECS {
        return None;
    }

    Some(Achievement {
        kind: AchievementKind::SpeedBonus,
        title: "Quick thinker".into(),
        message: format!("Answered correctly in {time_taken_secs} seconds."),
        value: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stats after `answered` submissions of which `correct` were right, with
    /// the given trailing streak and total score.
    fn stats(answered: u32, correct: u32, streak: u32, score: u32) -> GameStats {
        let mut stats = GameStats::new();
        stats.questions_answered = answered;
        stats.correct_answers = correct;
        stats.current_streak = streak;
        stats.max_streak = streak;
        stats.total_score = score;
        stats.points_this_session = score;
        if answered > 0 {
            stats.accuracy = f64::from(correct) / f64::from(answered) * 100.0;
        }
        stats
    }

    #[test]
    fn nothing_fires_on_an_ordinary_answer() {
        // Slow correct answer, no threshold in sight.
        assert_eq!(detect(&stats(2, 1, 1, 40), true, 20, 25), None);
    }

    #[test]
    fn nothing_fires_on_an_incorrect_answer() {
        assert_eq!(detect(&stats(4, 4, 4, 95), false, 0, 3), None);
    }

    #[test]
    fn milestone_fires_exactly_once_per_crossing() {
        // 95 -> 105 crosses the 100 milestone.
        let crossing = detect(&stats(4, 3, 0, 95), true, 10, 20).unwrap();
        assert_eq!(crossing.kind, AchievementKind::ScoreMilestone);
        assert_eq!(crossing.value, Some(100));

        // 105 -> 115 stays above 100 without reaching 500: nothing fires.
        assert_eq!(detect(&stats(5, 4, 1, 105), true, 10, 20), None);
    }

    #[test]
    fn milestone_crossing_several_thresholds_reports_the_first() {
        let crossing = detect(&stats(3, 3, 0, 95), true, 450, 20).unwrap();
        assert_eq!(crossing.value, Some(100));
    }

    #[test]
    fn streak_fires_at_thresholds_only() {
        let unlocked = detect(&stats(6, 4, 4, 200), true, 20, 20).unwrap();
        assert_eq!(unlocked.kind, AchievementKind::AnswerStreak);
        assert_eq!(unlocked.value, Some(5));

        assert_eq!(detect(&stats(7, 5, 5, 220), true, 20, 20), None);
    }

    #[test]
    fn incorrect_answer_cannot_extend_a_streak() {
        assert_eq!(detect(&stats(5, 4, 4, 80), false, 0, 20), None);
    }

    #[test]
    fn perfect_accuracy_needs_at_least_five_answers() {
        assert_eq!(
            detect(&stats(3, 3, 3, 60), true, 20, 20).map(|a| a.kind),
            // Four for four is not enough for the perfectionist tier.
            None
        );

        let unlocked = detect(&stats(4, 4, 4, 80), true, 20, 20).unwrap();
        assert_eq!(unlocked.kind, AchievementKind::PerfectAccuracy);
        assert_eq!(unlocked.value, Some(5));
    }

    #[test]
    fn perfect_accuracy_outranks_the_streak_at_the_same_threshold() {
        // Fifth consecutive correct answer with a perfect record: both the
        // streak and the perfect tier qualify; perfect accuracy wins.
        let unlocked = detect(&stats(4, 4, 4, 80), true, 20, 20).unwrap();
        assert_eq!(unlocked.kind, AchievementKind::PerfectAccuracy);
    }

    #[test]
    fn milestone_outranks_streak_and_speed() {
        let unlocked = detect(&stats(6, 5, 4, 95), true, 30, 3).unwrap();
        assert_eq!(unlocked.kind, AchievementKind::ScoreMilestone);
    }

    #[test]
    fn speed_bonus_requires_a_correct_answer_inside_the_window() {
        let unlocked = detect(&stats(2, 1, 0, 30), true, 24, 8).unwrap();
        assert_eq!(unlocked.kind, AchievementKind::SpeedBonus);

        assert_eq!(detect(&stats(2, 1, 0, 30), true, 20, 11), None);
        assert_eq!(detect(&stats(2, 1, 0, 30), false, 0, 3), None);
    }
}
