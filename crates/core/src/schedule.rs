use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::EntryId;
use crate::time::calendar_days_between;

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown exam category: {0}")]
    Unknown(String),
}

/// Which exam track a schedule entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    Ap,
    Sat,
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExamCategory::Ap => "ap",
            ExamCategory::Sat => "sat",
        };
        write!(f, "{label}")
    }
}

impl FromStr for ExamCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ap" => Ok(Self::Ap),
            "sat" => Ok(Self::Sat),
            other => Err(CategoryError::Unknown(other.to_string())),
        }
    }
}

//
// ─── ENTRIES AND ITEMS ─────────────────────────────────────────────────────────
//

/// Raw schedule record as supplied by the data source.
///
/// Day granularity only; any time-of-day on the backing column is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub title: String,
    pub date: NaiveDate,
    pub category: ExamCategory,
}

impl ScheduleEntry {
    #[must_use]
    pub fn new(
        id: EntryId,
        title: impl Into<String>,
        date: NaiveDate,
        category: ExamCategory,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            date,
            category,
        }
    }
}

/// Where an entry sits relative to "now", at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Upcoming,
    Today,
    Past,
}

/// Display-ready schedule entry.
///
/// Derived data only: recomputed from the entries plus a caller-supplied
/// "now" on every call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub id: EntryId,
    pub title: String,
    pub date: NaiveDate,
    pub category: ExamCategory,
    pub days_until: i64,
    pub status: ScheduleStatus,
    pub is_urgent: bool,
}

//
// ─── CLASSIFICATION ────────────────────────────────────────────────────────────
//

/// Entries at most this many days out count as urgent.
pub const URGENCY_WINDOW_DAYS: i64 = 7;

/// Calendar-day distance from `now` to `date`.
///
/// Deterministic and independent of the time-of-day of `now`; see
/// [`calendar_days_between`]. Negative for past dates.
#[must_use]
pub fn days_until(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    calendar_days_between(date, now)
}

fn classify_entry(entry: &ScheduleEntry, now: DateTime<Utc>) -> ScheduleItem {
    let days = days_until(entry.date, now);
    let status = match days {
        d if d > 0 => ScheduleStatus::Upcoming,
        0 => ScheduleStatus::Today,
        _ => ScheduleStatus::Past,
    };

    ScheduleItem {
        id: entry.id,
        title: entry.title.clone(),
        date: entry.date,
        category: entry.category,
        days_until: days,
        status,
        is_urgent: (0..=URGENCY_WINDOW_DAYS).contains(&days),
    }
}

/// Classify every entry against `now`, preserving input order.
#[must_use]
pub fn classify(entries: &[ScheduleEntry], now: DateTime<Utc>) -> Vec<ScheduleItem> {
    entries.iter().map(|e| classify_entry(e, now)).collect()
}

/// Stable sort by date; ties keep their input order.
#[must_use]
pub fn sort_by_date(mut items: Vec<ScheduleItem>, ascending: bool) -> Vec<ScheduleItem> {
    if ascending {
        items.sort_by(|a, b| a.date.cmp(&b.date));
    } else {
        items.sort_by(|a, b| b.date.cmp(&a.date));
    }
    items
}

/// Keep only `Upcoming` and `Today` items.
///
/// A separate operation rather than part of [`classify`], so audit-style
/// callers still see `Past` entries.
#[must_use]
pub fn filter_visible(items: Vec<ScheduleItem>) -> Vec<ScheduleItem> {
    items
        .into_iter()
        .filter(|item| matches!(item.status, ScheduleStatus::Upcoming | ScheduleStatus::Today))
        .collect()
}

/// Dashboard countdown label: `D-3`, `D-DAY`, `D+2`.
#[must_use]
pub fn dday_label(days_until: i64) -> String {
    match days_until {
        0 => "D-DAY".to_string(),
        d if d > 0 => format!("D-{d}"),
        d => format!("D+{}", -d),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
