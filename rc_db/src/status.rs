//! ABOUTME: Activist status derivation from attendance aggregates
//! ABOUTME: Pluggable policy trait with a threshold-based default

use chrono::NaiveDate;
use rc_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical status shown next to each activist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivistStatus {
    #[serde(rename = "No attendance")]
    NoAttendance,
    New,
    Current,
    Former,
}

impl ActivistStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ActivistStatus::NoAttendance => "No attendance",
            ActivistStatus::New => "New",
            ActivistStatus::Current => "Current",
            ActivistStatus::Former => "Former",
        }
    }
}

impl fmt::Display for ActivistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivistStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No attendance" => Ok(ActivistStatus::NoAttendance),
            "New" => Ok(ActivistStatus::New),
            "Current" => Ok(ActivistStatus::Current),
            "Former" => Ok(ActivistStatus::Former),
            other => Err(Error::Validation(format!("Unknown activist status: {}", other))),
        }
    }
}

/// Maps attendance aggregates to a status as of a given day
pub trait StatusPolicy: Send + Sync {
    fn status(
        &self,
        first_event: Option<NaiveDate>,
        last_event: Option<NaiveDate>,
        total_events: i64,
        today: NaiveDate,
    ) -> ActivistStatus;
}

/// Threshold policy used unless the caller plugs in another one
///
/// Rules are checked in order:
/// 1. no first or last event: `NoAttendance`
/// 2. last event more than `former_after_days` ago: `Former`
/// 3. first event less than `new_within_days` ago with fewer than `new_max_events` events: `New`
/// 4. otherwise `Current`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultStatusPolicy {
    pub former_after_days: i64,
    pub new_within_days: i64,
    pub new_max_events: i64,
}

impl Default for DefaultStatusPolicy {
    fn default() -> Self {
        Self {
            former_after_days: 60,
            new_within_days: 90,
            new_max_events: 5,
        }
    }
}

impl DefaultStatusPolicy {
    pub fn new(former_after_days: u32, new_within_days: u32, new_max_events: u32) -> Self {
        Self {
            former_after_days: former_after_days.into(),
            new_within_days: new_within_days.into(),
            new_max_events: new_max_events.into(),
        }
    }
}

impl StatusPolicy for DefaultStatusPolicy {
    fn status(
        &self,
        first_event: Option<NaiveDate>,
        last_event: Option<NaiveDate>,
        total_events: i64,
        today: NaiveDate,
    ) -> ActivistStatus {
        let (first, last) = match (first_event, last_event) {
            (Some(first), Some(last)) => (first, last),
            _ => return ActivistStatus::NoAttendance,
        };

        if (today - last).num_days() > self.former_after_days {
            return ActivistStatus::Former;
        }

        if (today - first).num_days() < self.new_within_days && total_events < self.new_max_events
        {
            return ActivistStatus::New;
        }

        ActivistStatus::Current
    }
}
