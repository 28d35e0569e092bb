//! # Rating Engine
//! Pure, testable logic that maps a finished match → `RatingResult`.
//! No I/O, no shared state; safe to call concurrently from any number of
//! requests.
//!
//! Policy: total = volume (0..=50) + timing (0..=25) + distribution (0..=25),
//! then the total picks the category, highest threshold first.
//!
//! Untrusted JSON enters through [`RawMatchInput::validate`], which is the only
//! place that can reject a match.

use serde::Deserialize;

use crate::error::RatingError;
use crate::rating::{Category, GoalEvent, MatchInput, MatchSummary, RatingBreakdown, RatingResult, Team};
use crate::scoring::{goal_distribution_score, goal_timing_score, goal_volume_score};

/// Score one match. Total and deterministic over a validated `MatchInput`.
pub fn compute_rating(input: &MatchInput) -> RatingResult {
    let total_goals = input.total_goals();

    let breakdown = RatingBreakdown {
        goal_volume: goal_volume_score(total_goals),
        goal_timing: goal_timing_score(&input.goals),
        goal_distribution: goal_distribution_score(
            input.home_score,
            input.away_score,
            &input.goals,
        ),
    };
    let total_score = breakdown.total();

    RatingResult {
        total_score,
        breakdown,
        category: Category::from_score(total_score),
        match_summary: MatchSummary {
            home_team: input.home_team.clone(),
            away_team: input.away_team.clone(),
            score_line: input.score_line(),
            total_goals,
        },
    }
}

/// Match as submitted by a caller, before validation.
///
/// Scores and minutes are signed and team tags are free text so that bad
/// values produce a descriptive `InvalidInput` instead of a decoder error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatchInput {
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
    #[serde(default)]
    pub goals: Option<Vec<RawGoalEvent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGoalEvent {
    pub team: String,
    #[serde(default)]
    pub minute: Option<i64>,
    #[serde(default)]
    pub scorer: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl RawMatchInput {
    /// Fail fast on the first contract violation.
    pub fn validate(self) -> Result<MatchInput, RatingError> {
        let home_team = non_blank(self.home_team, "homeTeam")?;
        let away_team = non_blank(self.away_team, "awayTeam")?;
        let home_score = non_negative(self.home_score, "homeScore")?;
        let away_score = non_negative(self.away_score, "awayScore")?;

        let goals = self
            .goals
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, g)| g.validate(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MatchInput {
            home_team,
            away_team,
            home_score,
            away_score,
            goals,
        })
    }
}

impl RawGoalEvent {
    fn validate(self, index: usize) -> Result<GoalEvent, RatingError> {
        let team = Team::parse(&self.team).ok_or_else(|| {
            RatingError::InvalidInput(format!(
                "goals[{index}].team must be HOME or AWAY, got {:?}",
                self.team
            ))
        })?;
        let minute = non_negative(self.minute.unwrap_or(0), &format!("goals[{index}].minute"))?;
        Ok(GoalEvent {
            team,
            minute,
            scorer: self.scorer,
            kind: self.kind,
        })
    }
}

fn non_blank(value: String, field: &str) -> Result<String, RatingError> {
    let t = value.trim();
    if t.is_empty() {
        return Err(RatingError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

fn non_negative(value: i64, field: &str) -> Result<u32, RatingError> {
    u32::try_from(value).map_err(|_| {
        RatingError::InvalidInput(format!("{field} must be a non-negative integer, got {value}"))
    })
}
