//! Sub-scorers for the watchability rating.
//!
//! Three independent components, each capped on its own:
//! - `goal_volume_score`       : total goals, table lookup, 0..=50
//! - `goal_timing_score`       : early / late / injury-time goals, 0..=25
//! - `goal_distribution_score` : both sides scoring, equalizers, lead changes, 0..=25
//!
//! All functions are pure and integer-only.

use crate::rating::{GoalEvent, Team};

pub const VOLUME_CAP: u32 = 50;
pub const TIMING_CAP: u32 = 25;
pub const DISTRIBUTION_CAP: u32 = 25;

const EARLY_MINUTE: u32 = 15;
const LATE_MINUTE: u32 = 75;
const VERY_LATE_MINUTE: u32 = 80;
const INJURY_TIME_MINUTE: u32 = 90;

const BOTH_SCORED_BONUS: u32 = 15;
const COMEBACK_BONUS: u32 = 4;
const EQUALIZER_BONUS: u32 = 3;
const LATE_WINNER_BONUS: u32 = 2;

/// Exact table: 0, 5, 15, 25, 35, 45, then 50 for six or more.
pub fn goal_volume_score(total_goals: u32) -> u32 {
    match total_goals {
        0 => 0,
        1 => 5,
        2 => 15,
        3 => 25,
        4 => 35,
        5 => 45,
        _ => VOLUME_CAP,
    }
}

/// Points for a single goal. Bands stack: a 90th-minute goal earns 3 + 2 + 5.
fn minute_points(minute: u32) -> u32 {
    let mut pts = 0;
    if minute <= EARLY_MINUTE {
        pts += 3;
    }
    if minute >= LATE_MINUTE {
        pts += 3;
    }
    if minute >= VERY_LATE_MINUTE {
        pts += 2;
    }
    if minute >= INJURY_TIME_MINUTE {
        pts += 5;
    }
    pts
}

pub fn goal_timing_score(goals: &[GoalEvent]) -> u32 {
    goals
        .iter()
        .map(|g| minute_points(g.minute))
        .sum::<u32>()
        .min(TIMING_CAP)
}

/// Goals in non-decreasing minute order; ties keep their input order.
pub fn ordered_by_minute(goals: &[GoalEvent]) -> Vec<&GoalEvent> {
    let mut ordered: Vec<&GoalEvent> = goals.iter().collect();
    ordered.sort_by_key(|g| g.minute);
    ordered
}

/// Running-tally walk over the goals plus the flat "both scored" bonus.
///
/// `home_score`/`away_score` drive only the flat bonus; the walk uses `goals`.
pub fn goal_distribution_score(home_score: u32, away_score: u32, goals: &[GoalEvent]) -> u32 {
    let mut pts = 0u32;
    if home_score > 0 && away_score > 0 {
        pts += BOTH_SCORED_BONUS;
    }

    let (mut home, mut away) = (0u32, 0u32);
    for goal in ordered_by_minute(goals) {
        let (scorer, other) = match goal.team {
            Team::Home => {
                home += 1;
                (home, away)
            }
            Team::Away => {
                away += 1;
                (away, home)
            }
        };

        if scorer > other && other > 0 {
            pts += COMEBACK_BONUS;
        } else if scorer == other && other > 0 {
            pts += EQUALIZER_BONUS;
        }
        if goal.minute >= VERY_LATE_MINUTE && scorer > other {
            pts += LATE_WINNER_BONUS;
        }
    }

    pts.min(DISTRIBUTION_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_table_is_exact() {
        let expected = [0, 5, 15, 25, 35, 45, 50, 50, 50];
        for (goals, want) in expected.iter().enumerate() {
            assert_eq!(goal_volume_score(goals as u32), *want, "goals={goals}");
        }
        assert_eq!(goal_volume_score(u32::MAX), 50);
    }

    #[test]
    fn volume_is_monotone() {
        let mut prev = 0;
        for t in 0..20 {
            let s = goal_volume_score(t);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn minute_bands_stack() {
        assert_eq!(minute_points(0), 3);
        assert_eq!(minute_points(15), 3);
        assert_eq!(minute_points(16), 0);
        assert_eq!(minute_points(74), 0);
        assert_eq!(minute_points(75), 3);
        assert_eq!(minute_points(80), 5);
        assert_eq!(minute_points(89), 5);
        assert_eq!(minute_points(90), 10);
        assert_eq!(minute_points(96), 10);
    }

    #[test]
    fn timing_caps_at_25() {
        let goals: Vec<GoalEvent> = (0..4).map(|_| GoalEvent::home(92)).collect();
        assert_eq!(goal_timing_score(&goals), 25);
        assert_eq!(goal_timing_score(&[]), 0);
    }

    #[test]
    fn distribution_zero_for_goalless_draw() {
        assert_eq!(goal_distribution_score(0, 0, &[]), 0);
    }

    #[test]
    fn equalizer_needs_both_sides_on_the_board() {
        // 0-1 then 1-1: second goal equalizes.
        let goals = vec![GoalEvent::away(10), GoalEvent::home(50)];
        assert_eq!(goal_distribution_score(1, 1, &goals), 15 + 3);
    }

    #[test]
    fn comeback_and_late_winner_stack() {
        // 0-1, 1-1 (equalizer), 2-1 at 85' (comeback + late winner).
        let goals = vec![
            GoalEvent::away(20),
            GoalEvent::home(60),
            GoalEvent::home(85),
        ];
        assert_eq!(goal_distribution_score(2, 1, &goals), 15 + 3 + 4 + 2);
    }

    #[test]
    fn late_goal_extending_lead_only_gets_late_bonus() {
        // 1-0, 2-0 at 88': no comeback (other side has 0), late winner applies.
        let goals = vec![GoalEvent::home(5), GoalEvent::home(88)];
        assert_eq!(goal_distribution_score(2, 0, &goals), 2);
    }

    #[test]
    fn unsorted_goals_are_walked_by_minute() {
        let sorted = vec![
            GoalEvent::away(20),
            GoalEvent::home(60),
            GoalEvent::home(85),
        ];
        let shuffled = vec![
            GoalEvent::home(85),
            GoalEvent::away(20),
            GoalEvent::home(60),
        ];
        assert_eq!(
            goal_distribution_score(2, 1, &sorted),
            goal_distribution_score(2, 1, &shuffled)
        );
    }

    #[test]
    fn ordering_is_stable_for_equal_minutes() {
        let goals = vec![GoalEvent::away(30), GoalEvent::home(30), GoalEvent::home(10)];
        let ordered = ordered_by_minute(&goals);
        assert_eq!(ordered[0].team, Team::Home);
        assert_eq!(ordered[1].team, Team::Away);
        assert_eq!(ordered[2].team, Team::Home);
    }

    #[test]
    fn distribution_caps_at_25() {
        let mut goals = Vec::new();
        for i in 0..6 {
            goals.push(GoalEvent::home(10 + i * 10));
            goals.push(GoalEvent::away(15 + i * 10));
        }
        assert_eq!(goal_distribution_score(6, 6, &goals), 25);
    }
}
