//! Deterministic, side-effect-free scoring rules applied to every graded
//! submission.

use crate::state::session::Difficulty;

/// Window (seconds) inside which a correct answer earns the flat speed bonus.
pub const SPEED_BONUS_WINDOW_SECS: u32 = 10;

/// Points awarded for one submission.
///
/// Incorrect answers score zero. Correct answers earn the difficulty base
/// value, plus a time bonus of up to 50% of base proportional to the share of
/// the countdown left, plus a flat 20% of base when the answer landed within
/// the speed window. A correct answer never scores below the base value, no
/// matter how late it came in.
pub fn calculate_points(
    difficulty: Difficulty,
    time_taken_secs: u32,
    time_limit_secs: u32,
    is_correct: bool,
) -> u32 {
    if !is_correct {
        return 0;
    }

    let base = difficulty.base_points();

    let time_bonus = if time_limit_secs > 0 && time_taken_secs < time_limit_secs {
        let remaining_share =
            f64::from(time_limit_secs - time_taken_secs) / f64::from(time_limit_secs);
        (f64::from(base) * 0.5 * remaining_share).floor() as u32
    } else {
        0
    };

    let speed_bonus = if time_taken_secs <= SPEED_BONUS_WINDOW_SECS {
        base / 5
    } else {
        0
    };

    (base + time_bonus + speed_bonus).max(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[test]
    fn incorrect_answers_score_zero() {
        for difficulty in DIFFICULTIES {
            for time_taken in [0, 1, 15, 30, 120] {
                assert_eq!(calculate_points(difficulty, time_taken, 30, false), 0);
            }
        }
    }

    #[test]
    fn correct_answers_never_score_below_base() {
        for difficulty in DIFFICULTIES {
            let base = difficulty.base_points();
            for time_taken in [0, 1, 10, 29, 30, 60, 1000] {
                assert!(calculate_points(difficulty, time_taken, 30, true) >= base);
            }
        }
    }

    #[test]
    fn points_are_monotonic_non_increasing_in_time_taken() {
        for difficulty in DIFFICULTIES {
            let limit = 30;
            let mut previous = u32::MAX;
            for time_taken in 0..=limit + 5 {
                let points = calculate_points(difficulty, time_taken, limit, true);
                assert!(
                    points <= previous,
                    "{difficulty:?}: {points} at t={time_taken} exceeds {previous}"
                );
                previous = points;
            }
        }
    }

    #[test]
    fn instant_answer_earns_full_bonuses() {
        // base 20 + 50% time bonus (10) + 20% speed bonus (4)
        assert_eq!(calculate_points(Difficulty::Medium, 0, 30, true), 34);
    }

    #[test]
    fn fast_answer_earns_speed_bonus() {
        let fast = calculate_points(Difficulty::Hard, SPEED_BONUS_WINDOW_SECS, 30, true);
        let slow = calculate_points(Difficulty::Hard, SPEED_BONUS_WINDOW_SECS + 1, 30, true);
        assert!(fast > slow);
    }

    #[test]
    fn late_answer_falls_back_to_base() {
        for difficulty in DIFFICULTIES {
            assert_eq!(
                calculate_points(difficulty, 30, 30, true),
                difficulty.base_points()
            );
            assert_eq!(
                calculate_points(difficulty, 45, 30, true),
                difficulty.base_points()
            );
        }
    }

    #[test]
    fn zero_time_limit_yields_no_time_bonus() {
        // Degenerate config: only base and speed bonus apply.
        assert_eq!(calculate_points(Difficulty::Easy, 0, 0, true), 12);
    }

    #[test]
    fn base_values_match_difficulty() {
        assert_eq!(Difficulty::Easy.base_points(), 10);
        assert_eq!(Difficulty::Medium.base_points(), 20);
        assert_eq!(Difficulty::Hard.base_points(), 30);
    }
}
