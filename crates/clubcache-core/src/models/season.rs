//! Club seasons.
//!
//! A season runs from April 1 to March 31 of the following year and is
//! identified by the year it starts in.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// First season the club keeps records for.
const FIRST_SEASON_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Season {
    pub id: i64,
    pub code: i64,
    pub name: i32,
    #[serde(rename = "startsAt")]
    pub starts_at: NaiveDate,
    #[serde(rename = "endsAt")]
    pub ends_at: NaiveDate,
}

impl Season {
    /// The season starting in `year`, or None if the year is out of chrono's range.
    pub fn starting_in(year: i32) -> Option<Self> {
        Some(Self {
            id: year as i64,
            code: year as i64,
            name: year,
            starts_at: NaiveDate::from_ymd_opt(year, 4, 1)?,
            ends_at: NaiveDate::from_ymd_opt(year + 1, 3, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts_at <= date && date <= self.ends_at
    }

    /// All seasons from the first recorded one up to the calendar year of `today`.
    pub fn all(today: NaiveDate) -> Vec<Season> {
        (FIRST_SEASON_YEAR..=today.year().max(FIRST_SEASON_YEAR))
            .filter_map(Season::starting_in)
            .collect()
    }

    /// The season containing `today`, falling back to the latest known season.
    pub fn current(today: NaiveDate) -> Season {
        let seasons = Self::all(today);
        seasons
            .iter()
            .find(|s| s.contains(today))
            .or_else(|| seasons.last())
            .cloned()
            .unwrap_or_else(|| Self::fallback(today))
    }

    fn fallback(today: NaiveDate) -> Season {
        // Only reachable for dates chrono cannot shift by a year
        Season {
            id: FIRST_SEASON_YEAR as i64,
            code: FIRST_SEASON_YEAR as i64,
            name: FIRST_SEASON_YEAR,
            starts_at: today,
            ends_at: today,
        }
    }
}
