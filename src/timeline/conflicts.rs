use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::TimelineConfig;
use crate::timeline::{
    end_minutes, format_minutes, parse_minutes, Conflict, ConflictKind, ConflictReport, Severity,
    Timeline, END_OF_DAY_MINUTES,
};
use crate::vendors::{ServiceType, VendorCombination};

/// Validates a combination against the event date and proposed timeline.
/// Deterministic given identical inputs; the report is regenerated in full
/// on every call.
pub fn detect(
    combination: &VendorCombination,
    event_date: NaiveDate,
    timeline: &Timeline,
    config: &TimelineConfig,
) -> ConflictReport {
    let mut conflicts = availability_conflicts(combination, event_date);
    conflicts.extend(timeline_conflicts(combination, timeline, config));
    build_report(conflicts)
}

pub fn build_report(conflicts: Vec<Conflict>) -> ConflictReport {
    let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    for conflict in &conflicts {
        *by_severity.entry(conflict.severity).or_insert(0) += 1;
    }
    ConflictReport {
        feasibility_score: feasibility(&conflicts),
        total_conflicts: conflicts.len(),
        conflicts_by_severity: by_severity,
        conflicts,
    }
}

/// Linear penalty per severity, floored at zero. A design decision, not a
/// probability; the weights keep the score comparable to fitness scores.
pub fn feasibility(conflicts: &[Conflict]) -> f64 {
    let penalty: f64 = conflicts.iter().map(|c| c.severity.penalty()).sum();
    round4((1.0 - penalty).max(0.0))
}

fn availability_conflicts(combination: &VendorCombination, event_date: NaiveDate) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (service, vendor) in &combination.vendors {
        let Some(availability) = &vendor.availability else {
            continue;
        };
        if availability.blackout_dates.contains(&event_date) {
            conflicts.push(Conflict {
                kind: ConflictKind::VendorUnavailable,
                service: Some(service.as_slug().to_string()),
                severity: Severity::High,
                description: format!(
                    "{} is blacked out on {event_date}",
                    vendor.name
                ),
            });
        }
        if availability.restricted_weekdays.contains(&event_date.weekday()) {
            conflicts.push(Conflict {
                kind: ConflictKind::RestrictedWeekday,
                service: Some(service.as_slug().to_string()),
                severity: Severity::Medium,
                description: format!(
                    "{} does not work on {}s",
                    vendor.name,
                    event_date.weekday()
                ),
            });
        }
    }

    // Pairwise, so N vendors across 2+ cities produce multiple entries.
    let located: Vec<(&ServiceType, String)> = combination
        .vendors
        .iter()
        .map(|(service, vendor)| (service, vendor.location_city.trim().to_ascii_lowercase()))
        .collect();
    for i in 0..located.len() {
        for j in (i + 1)..located.len() {
            let (service_a, city_a) = &located[i];
            let (service_b, city_b) = &located[j];
            if city_a != city_b {
                conflicts.push(Conflict {
                    kind: ConflictKind::LocationSplit,
                    service: Some(format!("{}+{}", service_a.as_slug(), service_b.as_slug())),
                    severity: Severity::Medium,
                    description: format!(
                        "{service_a} ({city_a}) and {service_b} ({city_b}) are in different cities"
                    ),
                });
            }
        }
    }

    conflicts
}

struct ScheduledActivity<'a> {
    name: &'a str,
    activity_type: String,
    start: u32,
    end: u32,
}

fn timeline_conflicts(
    combination: &VendorCombination,
    timeline: &Timeline,
    config: &TimelineConfig,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let mut scheduled: Vec<ScheduledActivity<'_>> = Vec::with_capacity(timeline.activities.len());

    for activity in &timeline.activities {
        let (start, end) = match parse_minutes(&activity.start_time) {
            Some(start) => (start, end_minutes(start, activity.duration_hours)),
            None => {
                conflicts.push(Conflict {
                    kind: ConflictKind::MalformedActivityTime,
                    service: None,
                    severity: Severity::Low,
                    description: format!(
                        "activity '{}' has unparseable start time '{}', clamped to 23:59",
                        activity.name, activity.start_time
                    ),
                });
                (END_OF_DAY_MINUTES, END_OF_DAY_MINUTES)
            }
        };
        scheduled.push(ScheduledActivity {
            name: &activity.name,
            activity_type: activity.activity_type.to_ascii_lowercase(),
            start,
            end,
        });
    }

    scheduled.sort_by_key(|a| a.start);

    for pair in scheduled.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.end > next.start {
            conflicts.push(Conflict {
                kind: ConflictKind::TimelineOverlap,
                service: None,
                severity: Severity::High,
                description: format!(
                    "'{}' runs until {} but '{}' starts at {}",
                    current.name,
                    format_minutes(current.end),
                    next.name,
                    format_minutes(next.start)
                ),
            });
        }
    }

    if let (Some(first), Some(last)) = (scheduled.first(), scheduled.last()) {
        let span_minutes = scheduled
            .iter()
            .map(|a| a.end)
            .max()
            .unwrap_or(last.end)
            .saturating_sub(first.start);
        let span_hours = f64::from(span_minutes) / 60.0;

        if combination.vendors.contains_key(&ServiceType::Venue)
            && span_hours > config.max_venue_hours
        {
            conflicts.push(Conflict {
                kind: ConflictKind::VenueOverrun,
                service: Some(ServiceType::Venue.as_slug().to_string()),
                severity: Severity::High,
                description: format!(
                    "event spans {span_hours:.1}h, over the venue limit of {:.1}h",
                    config.max_venue_hours
                ),
            });
        }
        // The venue is booked for the whole day, but the photographer only
        // shoots continuously within a block; a gap resets the clock.
        let coverage_hours = f64::from(longest_continuous_run(&scheduled)) / 60.0;
        if combination.vendors.contains_key(&ServiceType::Photographer)
            && coverage_hours > config.max_photographer_hours
        {
            conflicts.push(Conflict {
                kind: ConflictKind::PhotographerOverrun,
                service: Some(ServiceType::Photographer.as_slug().to_string()),
                severity: Severity::Medium,
                description: format!(
                    "continuous coverage of {coverage_hours:.1}h exceeds the photographer limit of {:.1}h",
                    config.max_photographer_hours
                ),
            });
        }
    }

    if let Some(ceremony) = scheduled.iter().find(|a| a.activity_type == "ceremony") {
        let has_prep = scheduled.iter().any(|a| {
            (a.activity_type.contains("makeup") || a.activity_type.contains("prep"))
                && a.start < ceremony.start
        });
        if !has_prep {
            conflicts.push(Conflict {
                kind: ConflictKind::MissingPrep,
                service: Some(ServiceType::MakeupArtist.as_slug().to_string()),
                severity: Severity::Medium,
                description: format!(
                    "no makeup or preparation activity scheduled before the ceremony at {}",
                    format_minutes(ceremony.start)
                ),
            });
        }
    }

    conflicts
}

/// Longest back-to-back stretch of activities, in minutes. Expects the
/// slice sorted by start time; any gap between activities ends the run.
fn longest_continuous_run(scheduled: &[ScheduledActivity<'_>]) -> u32 {
    let Some(first) = scheduled.first() else {
        return 0;
    };
    let mut longest = 0u32;
    let mut run_start = first.start;
    let mut run_end = first.end;
    for activity in &scheduled[1..] {
        if activity.start <= run_end {
            run_end = run_end.max(activity.end);
        } else {
            longest = longest.max(run_end.saturating_sub(run_start));
            run_start = activity.start;
            run_end = activity.end;
        }
    }
    longest.max(run_end.saturating_sub(run_start))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
