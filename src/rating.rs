//! rating.rs: data model for matches and their watchability ratings.
//!
//! `MatchInput` is what the engine consumes, `RatingResult` is what it
//! produces. Everything serializes as camelCase JSON, which is the shape the
//! API returns and the store persists.
//!
//! Two label sets live here and must not be mixed up:
//! - [`Category`] is the authoritative bucket derived from `totalScore`.
//! - [`LegendTier`] is display metadata for a UI legend only.

use serde::{Deserialize, Serialize};

/// Side that scored a goal. Serializes as `HOME`/`AWAY`; deserializes through
/// [`Team::parse`], so stored files and API input accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Team {
    Home,
    Away,
}

impl TryFrom<String> for Team {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Team::parse(&tag).ok_or_else(|| format!("team must be HOME or AWAY, got {tag:?}"))
    }
}

impl Team {
    /// Case-insensitive parse of a team tag (`"HOME"`, `"away"`, ...).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "HOME" => Some(Team::Home),
            "AWAY" => Some(Team::Away),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

/// One recorded goal. Minutes past 90 encode injury time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEvent {
    pub team: Team,
    #[serde(default)]
    pub minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    /// Informational only (e.g. "REGULAR", "PENALTY", "OWN").
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl GoalEvent {
    pub fn new(team: Team, minute: u32) -> Self {
        Self {
            team,
            minute,
            scorer: None,
            kind: None,
        }
    }

    pub fn home(minute: u32) -> Self {
        Self::new(Team::Home, minute)
    }

    pub fn away(minute: u32) -> Self {
        Self::new(Team::Away, minute)
    }

    pub fn scored_by(mut self, scorer: impl Into<String>) -> Self {
        self.scorer = Some(scorer.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Validated match as seen by the engine.
///
/// `home_score`/`away_score` are authoritative; `goals` may be partial and is
/// only used for timing and distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInput {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    #[serde(default)]
    pub goals: Vec<GoalEvent>,
}

impl MatchInput {
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score,
            away_score,
            goals: Vec::new(),
        }
    }

    pub fn with_goals(mut self, goals: Vec<GoalEvent>) -> Self {
        self.goals = goals;
        self
    }

    pub fn total_goals(&self) -> u32 {
        self.home_score.saturating_add(self.away_score)
    }

    pub fn score_line(&self) -> String {
        format!("{}-{}", self.home_score, self.away_score)
    }
}

/// Per-component scores. Each is already capped by its scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBreakdown {
    pub goal_volume: u32,
    pub goal_timing: u32,
    pub goal_distribution: u32,
}

impl RatingBreakdown {
    pub fn total(&self) -> u32 {
        self.goal_volume + self.goal_timing + self.goal_distribution
    }

    /// True for the zeroed breakdown written by older records.
    pub fn is_zero(&self) -> bool {
        self.goal_volume == 0 && self.goal_timing == 0 && self.goal_distribution == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub home_team: String,
    pub away_team: String,
    pub score_line: String,
    pub total_goals: u32,
}

/// Output of one scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResult {
    pub total_score: u32,
    pub breakdown: RatingBreakdown,
    pub category: Category,
    pub match_summary: MatchSummary,
}

/// Authoritative watchability bucket, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "ALL TIME LEGENDARY")]
    AllTimeLegendary,
    #[serde(rename = "AMAZING")]
    Amazing,
    #[serde(rename = "REALLY Good")]
    ReallyGood,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl Category {
    /// Highest threshold first; the first satisfied threshold wins.
    pub const ALL: [Category; 6] = [
        Category::AllTimeLegendary,
        Category::Amazing,
        Category::ReallyGood,
        Category::Good,
        Category::Average,
        Category::VeryPoor,
    ];

    pub fn from_score(total_score: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| total_score >= c.min_score())
            .unwrap_or(Category::VeryPoor)
    }

    /// Inclusive lower bound of the bucket.
    pub fn min_score(self) -> u32 {
        match self {
            Category::AllTimeLegendary => 90,
            Category::Amazing => 75,
            Category::ReallyGood => 60,
            Category::Good => 30,
            Category::Average => 15,
            Category::VeryPoor => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::AllTimeLegendary => "ALL TIME LEGENDARY",
            Category::Amazing => "AMAZING",
            Category::ReallyGood => "REALLY Good",
            Category::Good => "Good",
            Category::Average => "Average",
            Category::VeryPoor => "Very Poor",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// UI legend tier. Display metadata only; never used to derive `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegendTier {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Average,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl LegendTier {
    pub const ALL: [LegendTier; 6] = [
        LegendTier::Excellent,
        LegendTier::VeryGood,
        LegendTier::Good,
        LegendTier::Average,
        LegendTier::Poor,
        LegendTier::VeryPoor,
    ];

    /// Inclusive `(min, max)` band.
    pub fn range(self) -> (u32, u32) {
        match self {
            LegendTier::Excellent => (90, 100),
            LegendTier::VeryGood => (70, 89),
            LegendTier::Good => (50, 69),
            LegendTier::Average => (30, 49),
            LegendTier::Poor => (10, 29),
            LegendTier::VeryPoor => (0, 9),
        }
    }

    pub fn for_score(score: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| score >= t.range().0)
            .unwrap_or(LegendTier::VeryPoor)
    }

    pub fn label(self) -> &'static str {
        match self {
            LegendTier::Excellent => "Excellent",
            LegendTier::VeryGood => "Very Good",
            LegendTier::Good => "Good",
            LegendTier::Average => "Average",
            LegendTier::Poor => "Poor",
            LegendTier::VeryPoor => "Very Poor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_partition_covers_every_score_once() {
        for score in 0..=100u32 {
            let hits = Category::ALL
                .iter()
                .filter(|c| {
                    let upper = Category::ALL
                        .iter()
                        .filter(|o| o.min_score() > c.min_score())
                        .map(|o| o.min_score())
                        .min()
                        .unwrap_or(101);
                    score >= c.min_score() && score < upper
                })
                .count();
            assert_eq!(hits, 1, "score {score} must fall in exactly one bucket");
            assert!(score >= Category::from_score(score).min_score());
        }
    }

    #[test]
    fn category_thresholds() {
        assert_eq!(Category::from_score(100), Category::AllTimeLegendary);
        assert_eq!(Category::from_score(90), Category::AllTimeLegendary);
        assert_eq!(Category::from_score(89), Category::Amazing);
        assert_eq!(Category::from_score(75), Category::Amazing);
        assert_eq!(Category::from_score(74), Category::ReallyGood);
        assert_eq!(Category::from_score(60), Category::ReallyGood);
        assert_eq!(Category::from_score(59), Category::Good);
        assert_eq!(Category::from_score(30), Category::Good);
        assert_eq!(Category::from_score(29), Category::Average);
        assert_eq!(Category::from_score(15), Category::Average);
        assert_eq!(Category::from_score(14), Category::VeryPoor);
        assert_eq!(Category::from_score(0), Category::VeryPoor);
    }

    #[test]
    fn legend_is_independent_of_category() {
        // 65 is "REALLY Good" for scoring but "Good" on the legend.
        assert_eq!(Category::from_score(65), Category::ReallyGood);
        assert_eq!(LegendTier::for_score(65), LegendTier::Good);
        for score in 0..=100u32 {
            let (lo, hi) = LegendTier::for_score(score).range();
            assert!(lo <= score && score <= hi);
        }
    }

    #[test]
    fn serializes_to_camel_case_with_labels() {
        let r = RatingResult {
            total_score: 17,
            breakdown: RatingBreakdown {
                goal_volume: 5,
                goal_timing: 10,
                goal_distribution: 2,
            },
            category: Category::Average,
            match_summary: MatchSummary {
                home_team: "Arsenal".into(),
                away_team: "Chelsea".into(),
                score_line: "1-0".into(),
                total_goals: 1,
            },
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["totalScore"], json!(17));
        assert_eq!(v["breakdown"]["goalTiming"], json!(10));
        assert_eq!(v["category"], json!("Average"));
        assert_eq!(v["matchSummary"]["scoreLine"], json!("1-0"));

        let back: RatingResult = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn goal_event_defaults_and_aliases() {
        let g: GoalEvent = serde_json::from_value(json!({ "team": "away" })).unwrap();
        assert_eq!(g, GoalEvent::away(0));

        let g = GoalEvent::home(45).kind("PENALTY");
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(v["type"], json!("PENALTY"));
        assert!(v.get("scorer").is_none());
    }

    #[test]
    fn team_parse_is_case_insensitive() {
        assert_eq!(Team::parse("home"), Some(Team::Home));
        assert_eq!(Team::parse(" AWAY "), Some(Team::Away));
        assert_eq!(Team::parse("neutral"), None);
        assert_eq!(Team::Home.opponent(), Team::Away);
    }

    #[test]
    fn team_deserializes_with_the_same_rules_as_parse() {
        for tag in ["HOME", "home", "hOmE", " Home "] {
            let t: Team = serde_json::from_value(json!(tag)).unwrap();
            assert_eq!(t, Team::Home, "{tag:?}");
        }
        let t: Team = serde_json::from_value(json!("aWaY")).unwrap();
        assert_eq!(t, Team::Away);
        assert!(serde_json::from_value::<Team>(json!("NEUTRAL")).is_err());
        assert_eq!(serde_json::to_value(Team::Away).unwrap(), json!("AWAY"));
    }
}
