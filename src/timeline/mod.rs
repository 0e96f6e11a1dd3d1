pub mod conflicts;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

pub const END_OF_DAY_MINUTES: u32 = 23 * 60 + 59;

/// Externally constructed schedule for the event day, consumed as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Timeline {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub name: String,
    /// Wall-clock "HH:MM" within the event day.
    pub start_time: String,
    pub duration_hours: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Per-severity feasibility penalty. Additive-then-clamp by design so
    /// the result stays comparable with fitness scores on the same scale.
    pub fn penalty(self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Medium => 0.15,
            Self::High => 0.30,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TimelineOverlap,
    VendorUnavailable,
    RestrictedWeekday,
    LocationSplit,
    VenueOverrun,
    PhotographerOverrun,
    MissingPrep,
    MalformedActivityTime,
}

impl Display for ConflictKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::TimelineOverlap => "timeline_overlap",
            Self::VendorUnavailable => "vendor_unavailable",
            Self::RestrictedWeekday => "restricted_weekday",
            Self::LocationSplit => "location_split",
            Self::VenueOverrun => "venue_overrun",
            Self::PhotographerOverrun => "photographer_overrun",
            Self::MissingPrep => "missing_prep",
            Self::MalformedActivityTime => "malformed_activity_time",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub service: Option<String>,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictReport {
    pub feasibility_score: f64,
    pub conflicts: Vec<Conflict>,
    pub total_conflicts: usize,
    pub conflicts_by_severity: BTreeMap<Severity, usize>,
}

impl ConflictReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.conflicts_by_severity
            .get(&severity)
            .copied()
            .unwrap_or(0)
    }
}

/// Minutes since midnight for an "HH:MM" string. Malformed input yields
/// `None`; callers clamp to end of day and flag the activity instead of
/// failing the whole report.
pub fn parse_minutes(raw: &str) -> Option<u32> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()?;
    Some(minutes_of(time))
}

fn minutes_of(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// End minute for a start and a duration, clamped at 23:59 when the
/// activity would run past midnight.
pub fn end_minutes(start: u32, duration_hours: f64) -> u32 {
    let duration_minutes = (duration_hours * 60.0).round().max(0.0) as u32;
    start.saturating_add(duration_minutes).min(END_OF_DAY_MINUTES)
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
