//! # Competition filter
//!
//! Maps user-facing filter values ("pl", "premier-league", "UCL") onto the
//! competition names stored with each match, then matches by containment.
//!
//! - Case-insensitive, with dashes/underscores/punctuation folded to spaces.
//! - Aliases resolve short codes and slugs to a canonical name.
//! - A stored name matches when it contains the canonical filter, so
//!   "UEFA Champions League" matches "champions league".

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct CompetitionAliases {
    aliases: HashMap<String, String>,
}

impl Default for CompetitionAliases {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl CompetitionAliases {
    /// Built-in aliases for the competitions the football-data.org free tier serves.
    pub fn default_seed() -> Self {
        let mut aliases = HashMap::new();
        for (a, c) in [
            ("pl", "premier league"),
            ("epl", "premier league"),
            ("premier", "premier league"),
            ("cl", "champions league"),
            ("ucl", "champions league"),
            ("champions", "champions league"),
            ("pd", "primera division"),
            ("la liga", "primera division"),
            ("laliga", "primera division"),
            ("bl1", "bundesliga"),
            ("sa", "serie a"),
            ("fl1", "ligue 1"),
            ("ded", "eredivisie"),
            ("ppl", "primeira liga"),
            ("elc", "championship"),
            ("wc", "world cup"),
            ("ec", "european championship"),
            ("euro", "european championship"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }
        Self { aliases }
    }

    /// Canonical, normalized form of a filter value.
    pub fn canonical(&self, filter: &str) -> String {
        let n = normalize(filter);
        self.aliases.get(&n).cloned().unwrap_or(n)
    }

    /// True when `competition` satisfies `filter`. An empty filter matches everything.
    pub fn matches(&self, competition: &str, filter: &str) -> bool {
        let want = self.canonical(filter);
        if want.is_empty() {
            return true;
        }
        normalize(competition).contains(&want)
    }
}

/// Lowercase, fold separators and punctuation to spaces, collapse whitespace.
fn normalize(s: &str) -> String {
    static RE_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-_/\\.,'’]+").unwrap());
    let lowered = s.trim().to_lowercase();
    RE_SEP.replace_all(&lowered, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> CompetitionAliases {
        CompetitionAliases::default_seed()
    }

    #[test]
    fn short_codes_resolve() {
        let a = aliases();
        assert!(a.matches("Premier League", "PL"));
        assert!(a.matches("UEFA Champions League", "ucl"));
        assert!(a.matches("Primera Division", "LaLiga"));
    }

    #[test]
    fn slugs_and_case_are_folded() {
        let a = aliases();
        assert!(a.matches("Premier League", "premier-league"));
        assert!(a.matches("UEFA Champions League", "CHAMPIONS_LEAGUE"));
    }

    #[test]
    fn containment_not_equality() {
        let a = aliases();
        assert!(a.matches("UEFA Champions League", "Champions League"));
        assert!(!a.matches("Premier League", "Champions League"));
    }

    #[test]
    fn empty_filter_matches_all() {
        assert!(aliases().matches("Serie A", "  "));
    }
}
