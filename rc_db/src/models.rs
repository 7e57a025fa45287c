//! ABOUTME: Activist read models and their flat JSON shape
//! ABOUTME: The full record is a composition of identity, attendance, and membership groups

use crate::status::ActivistStatus;
use chrono::NaiveDate;
use rc_core::{format_event_date, time::parse_event_date};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity fields stored on the activists table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Activist {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub chapter: String,
    pub phone: String,
    pub location: Option<String>,
    pub facebook: String,
    pub liberation_pledge: bool,
}

/// Aggregates derived from event attendance, never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub first_event: Option<NaiveDate>,
    pub last_event: Option<NaiveDate>,
    pub total_events: i64,
    pub status: ActivistStatus,
}

impl Default for AttendanceSummary {
    fn default() -> Self {
        Self {
            first_event: None,
            last_event: None,
            total_events: 0,
            status: ActivistStatus::NoAttendance,
        }
    }
}

/// Organizational membership flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub core_staff: bool,
    pub exclude_from_leaderboard: bool,
    pub global_team_member: bool,
    pub activist_level: String,
}

/// Full read model returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivistExtra {
    pub activist: Activist,
    pub attendance: AttendanceSummary,
    pub membership: Membership,
}

/// Flat JSON record with string dates and 0/1 flags
///
/// The attendance fields are derived and may be left out when reading a record back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivistJson {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub chapter: String,
    pub phone: String,
    pub location: String,
    pub facebook: String,
    #[serde(default)]
    pub first_event: String,
    #[serde(default)]
    pub last_event: String,
    #[serde(default)]
    pub total_events: i64,
    #[serde(default)]
    pub status: String,
    pub core_staff: u8,
    pub exclude_from_leaderboard: u8,
    pub liberation_pledge: u8,
    pub global_team_member: u8,
    pub activist_level: String,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn optional_date(raw: &str) -> Option<Option<NaiveDate>> {
    if raw.is_empty() {
        return Some(None);
    }
    parse_event_date(raw).map(Some)
}

fn attendance_from_json(json: &ActivistJson) -> Option<AttendanceSummary> {
    Some(AttendanceSummary {
        first_event: optional_date(&json.first_event)?,
        last_event: optional_date(&json.last_event)?,
        total_events: json.total_events,
        status: json.status.parse().ok()?,
    })
}

impl From<ActivistExtra> for ActivistJson {
    fn from(extra: ActivistExtra) -> Self {
        let ActivistExtra {
            activist,
            attendance,
            membership,
        } = extra;

        Self {
            id: activist.id,
            name: activist.name,
            email: activist.email,
            chapter: activist.chapter,
            phone: activist.phone,
            location: activist.location.unwrap_or_default(),
            facebook: activist.facebook,
            first_event: format_event_date(attendance.first_event),
            last_event: format_event_date(attendance.last_event),
            total_events: attendance.total_events,
            status: attendance.status.to_string(),
            core_staff: flag(membership.core_staff),
            exclude_from_leaderboard: flag(membership.exclude_from_leaderboard),
            liberation_pledge: flag(activist.liberation_pledge),
            global_team_member: flag(membership.global_team_member),
            activist_level: membership.activist_level,
        }
    }
}

impl From<ActivistJson> for ActivistExtra {
    fn from(json: ActivistJson) -> Self {
        // Attendance is never written back; an unreadable summary becomes the empty one
        let attendance = attendance_from_json(&json).unwrap_or_default();

        Self {
            activist: Activist {
                id: json.id,
                name: json.name,
                email: json.email,
                chapter: json.chapter,
                phone: json.phone,
                // Empty location reads back as absent
                location: Some(json.location).filter(|l| !l.is_empty()),
                facebook: json.facebook,
                liberation_pledge: json.liberation_pledge != 0,
            },
            attendance,
            membership: Membership {
                core_staff: json.core_staff != 0,
                exclude_from_leaderboard: json.exclude_from_leaderboard != 0,
                global_team_member: json.global_team_member != 0,
                activist_level: json.activist_level,
            },
        }
    }
}
