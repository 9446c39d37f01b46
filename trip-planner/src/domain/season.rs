//! Travel seasons.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Season of a travel date.
///
/// Winter covers December through March, which is when ice roads are open
/// in the north-east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn of(date: NaiveDate) -> Self {
        match date.month() {
            12 | 1 | 2 | 3 => Season::Winter,
            4 | 5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 15).unwrap()
    }

    #[test]
    fn months_map_to_seasons() {
        assert_eq!(Season::of(d(1)), Season::Winter);
        assert_eq!(Season::of(d(3)), Season::Winter);
        assert_eq!(Season::of(d(4)), Season::Spring);
        assert_eq!(Season::of(d(7)), Season::Summer);
        assert_eq!(Season::of(d(10)), Season::Autumn);
        assert_eq!(Season::of(d(12)), Season::Winter);
    }

    #[test]
    fn serde_snake_case() {
        assert_eq!(serde_json::to_string(&Season::Winter).unwrap(), "\"winter\"");
        assert_eq!(Season::Autumn.to_string(), "autumn");
    }
}
