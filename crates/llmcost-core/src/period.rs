//! Reporting windows resolved against a reference instant (UTC).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since midnight UTC today.
    Today,
    /// The trailing seven days.
    Week,
    /// The trailing calendar month.
    #[default]
    Month,
    /// No lower bound.
    All,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown period '{0}' (expected today, week, month, or all)")]
pub struct UnknownPeriod(pub String);

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }

    /// Inclusive lower bound of the window ending at `now`, or `None` for `All`.
    pub fn since(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        let now = now.to_offset(UtcOffset::UTC);
        match self {
            Period::Today => Some(midnight(now.date())),
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(one_month_before(now)),
            Period::All => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// First instant of the calendar month containing `now` (UTC).
pub fn month_start(now: OffsetDateTime) -> OffsetDateTime {
    let date = now.to_offset(UtcOffset::UTC).date();
    let first = date.replace_day(1).unwrap_or(date);
    midnight(first)
}

fn midnight(date: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()
}

/// Same wall-clock time one calendar month earlier. A day past the end of
/// the previous month rolls forward into the next one (Mar 31 -> Mar 3).
fn one_month_before(now: OffsetDateTime) -> OffsetDateTime {
    let date = now.date();
    let Some(prev_first) = date
        .replace_day(1)
        .ok()
        .and_then(|d| d.previous_day())
        .and_then(|d| d.replace_day(1).ok())
    else {
        return now;
    };
    match prev_first.checked_add(Duration::days(i64::from(date.day()) - 1)) {
        Some(d) => now.replace_date(d),
        None => now,
    }
}
