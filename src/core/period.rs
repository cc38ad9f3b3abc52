// Ranking Period - Time windows applied to ranking aggregation

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::core::strong_types::Timestamp;

/// Window a ranking is computed over. Unknown values mean `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingPeriod {
    Week,
    Month,
    #[default]
    All,
}

impl RankingPeriod {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("week") => RankingPeriod::Week,
            Some("month") => RankingPeriod::Month,
            _ => RankingPeriod::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingPeriod::Week => "week",
            RankingPeriod::Month => "month",
            RankingPeriod::All => "all",
        }
    }

    /// Earliest timestamp inside the window ending at `now`, `None` when unbounded
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<Timestamp> {
        let days = match self {
            RankingPeriod::Week => 7,
            RankingPeriod::Month => 30,
            RankingPeriod::All => return None,
        };
        Some(Timestamp::from(now - Duration::days(days)))
    }
}

impl fmt::Display for RankingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
