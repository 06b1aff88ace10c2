//! Calendar helpers: the month type used by monthly reports and day stepping.

use chrono::{Datelike, Duration, NaiveDate};
use color_eyre::{eyre::eyre, Result};
use std::fmt;
use std::str::FromStr;

/// A calendar month, formatted `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
  year: i32,
  month: u32,
}

impl Month {
  pub fn new(year: i32, month: u32) -> Option<Self> {
    (1..=12).contains(&month).then_some(Self { year, month })
  }

  pub fn of(date: NaiveDate) -> Self {
    Self {
      year: date.year(),
      month: date.month(),
    }
  }

  pub fn first_day(&self) -> NaiveDate {
    NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
  }

  pub fn next(&self) -> Self {
    if self.month == 12 {
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

  pub fn prev(&self) -> Self {
    if self.month == 1 {
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

  /// Human label, e.g. "June 2024"
  pub fn label(&self) -> String {
    self.first_day().format("%B %Y").to_string()
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for Month {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    let (year, month) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| eyre!("Expected YYYY-MM, got '{}'", s))?;
    let year: i32 = year
      .parse()
      .map_err(|_| eyre!("Invalid year in '{}'", s))?;
    let month: u32 = month
      .parse()
      .map_err(|_| eyre!("Invalid month in '{}'", s))?;
    Month::new(year, month).ok_or_else(|| eyre!("Month out of range in '{}'", s))
  }
}

/// Step a date by whole days, saturating at chrono's limits.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(days))
    .unwrap_or(date)
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| eyre!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}
