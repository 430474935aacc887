use std::{fmt, str::FromStr};

use chrono::{Datelike, Local, Month, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// A calendar month, the partition key of every expense query and mutation.
///
/// The canonical key format is `YYYY-MM` (e.g. `2025-01`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Builds a period, rejecting months outside `1..=12` and years outside
    /// `1..=9999`.
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod(format!("month {month} out of range")));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!("year {year} out of range")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in the local timezone.
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Canonical `YYYY-MM` key.
    #[must_use]
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Human readable label, e.g. `January 2025`.
    #[must_use]
    pub fn label(self) -> String {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        format!("{name} {}", self.year)
    }

    /// The following month; December 9999 is the last one and stays put.
    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            if self.year == MAX_YEAR {
                return self;
            }
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month; January of year 1 is the first one and stays put.
    #[must_use]
    pub fn previous(self) -> Self {
        if self.month == 1 {
            if self.year == MIN_YEAR {
                return self;
            }
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Months offered by the period picker: every month of the previous, the
    /// given and the next year, newest first.
    #[must_use]
    pub fn selectable_around(year: i32) -> Vec<Period> {
        let mut periods = Vec::with_capacity(36);
        for year in (year - 1..=year + 1).rev() {
            for month in (1..=12).rev() {
                if let Ok(period) = Period::new(year, month) {
                    periods.push(period);
                }
            }
        }
        periods
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = EngineError;

    /// Parses a strict `YYYY-MM` key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPeriod(format!("\"{s}\" is not a YYYY-MM month"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
