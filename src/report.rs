use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use tracing::debug;
use ulid::Ulid;

use crate::config::Settings;
use crate::model::*;
use crate::observability::REPORTS_TOTAL;
use crate::resolver::{is_available_now, next_slot_for, open_until};
use crate::schedule::WeeklySchedule;
use crate::time::format_instant;

/// Everything known about one resource at query time. Owned by the caller;
/// nothing here is cached between queries.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub id: Ulid,
    pub name: Option<String>,
    /// Zone the schedule is read in. Falls back to the configured default.
    pub timezone: Option<Tz>,
    pub schedule: Option<WeeklySchedule>,
    pub constraints: BookingConstraints,
    pub bookings: Vec<BookingInterval>,
}

impl ResourceSnapshot {
    pub fn new(id: Ulid) -> Self {
        Self {
            id,
            name: None,
            timezone: None,
            schedule: None,
            constraints: BookingConstraints::default(),
            bookings: Vec::new(),
        }
    }
}

/// What the UI and concierge show for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub resource_id: Ulid,
    pub name: Option<String>,
    #[serde(skip)]
    pub availability: Availability,
    pub available: bool,
    pub reason: Option<String>,
    /// End of the current open stretch. Only set while available.
    #[serde(serialize_with = "instant_opt")]
    pub open_until: Option<Ms>,
    /// Earliest bookable start. Only set while unavailable.
    #[serde(serialize_with = "instant_opt")]
    pub next_slot: Option<Ms>,
}

fn instant_opt<S: Serializer>(t: &Option<Ms>, serializer: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => serializer.serialize_some(&format_instant(*t)),
        None => serializer.serialize_none(),
    }
}

pub fn report(snapshot: &ResourceSnapshot, now: Ms, settings: &Settings) -> AvailabilityReport {
    let tz = settings.timezone_for(snapshot.timezone);
    let schedule = snapshot.schedule.as_ref();
    let availability = is_available_now(schedule, &snapshot.bookings, now, tz);

    let (open_until, next_slot) = if availability.is_available() {
        (open_until(schedule, now, tz), None)
    } else {
        let next = next_slot_for(
            schedule,
            &snapshot.bookings,
            &snapshot.constraints,
            now,
            settings.horizon_days,
            tz,
        );
        (None, next)
    };

    metrics::counter!(REPORTS_TOTAL).increment(1);
    debug!(resource = %snapshot.id, %availability, ?next_slot, "availability report built");

    AvailabilityReport {
        resource_id: snapshot.id,
        name: snapshot.name.clone(),
        availability,
        available: availability.is_available(),
        reason: availability.reason(),
        open_until,
        next_slot,
    }
}

/// Earliest next slot across `snapshots`; ties go to the resource listed
/// first. Resources with no slot in the horizon are skipped.
pub fn earliest_among(
    snapshots: &[ResourceSnapshot],
    now: Ms,
    settings: &Settings,
) -> Option<(Ulid, Ms)> {
    let mut best: Option<(Ulid, Ms)> = None;
    for snapshot in snapshots {
        let tz = settings.timezone_for(snapshot.timezone);
        let Some(slot) = next_slot_for(
            snapshot.schedule.as_ref(),
            &snapshot.bookings,
            &snapshot.constraints,
            now,
            settings.horizon_days,
            tz,
        ) else {
            continue;
        };
        if best.is_none_or(|(_, current)| slot < current) {
            best = Some((snapshot.id, slot));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_schedule;
    use crate::time::{DAY, HOUR};
    use serde_json::json;

    // 1970-01-05 was a Monday.
    const MON: Ms = 4 * DAY;

    fn utc_settings() -> Settings {
        Settings {
            timezone: Tz::UTC,
            horizon_days: 7,
        }
    }

    fn room(id: Ulid, open: &str, close: &str) -> ResourceSnapshot {
        let mut snapshot = ResourceSnapshot::new(id);
        snapshot.schedule =
            parse_schedule(&json!({"monday": [{"start": open, "end": close}]}));
        snapshot
    }

    fn approved(start: Ms, end: Ms) -> BookingInterval {
        BookingInterval::new(Span::new(start, end), BookingStatus::Approved)
    }

    #[test]
    fn available_resource_reports_closing_time() {
        let r = report(&room(Ulid::new(), "09:00", "17:00"), MON + 10 * HOUR, &utc_settings());
        assert!(r.available);
        assert_eq!(r.reason, None);
        assert_eq!(r.open_until, Some(MON + 17 * HOUR));
        assert_eq!(r.next_slot, None);
    }

    #[test]
    fn booked_resource_reports_next_slot() {
        let mut snapshot = room(Ulid::new(), "09:00", "17:00");
        snapshot.bookings.push(approved(MON + 10 * HOUR, MON + 12 * HOUR));
        let r = report(&snapshot, MON + 10 * HOUR, &utc_settings());
        assert!(!r.available);
        assert_eq!(r.availability, Availability::BookedUntil(MON + 12 * HOUR));
        assert_eq!(r.open_until, None);
        assert_eq!(r.next_slot, Some(MON + 12 * HOUR));
    }

    #[test]
    fn closed_resource_without_hours_has_no_slot() {
        let mut snapshot = ResourceSnapshot::new(Ulid::new());
        snapshot.bookings.push(approved(MON, MON + HOUR));
        let r = report(&snapshot, MON, &utc_settings());
        assert!(!r.available);
        assert_eq!(r.next_slot, None);
    }

    #[test]
    fn report_serializes_instants_as_rfc3339() {
        let mut snapshot = room(Ulid::new(), "09:00", "17:00");
        snapshot.name = Some("Seminar room".into());
        let r = report(&snapshot, MON + 18 * HOUR, &utc_settings());
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["name"], "Seminar room");
        assert_eq!(value["available"], false);
        assert_eq!(value["reason"], "outside operating hours");
        assert_eq!(value["open_until"], serde_json::Value::Null);
        assert_eq!(value["next_slot"], "1970-01-12T09:00:00Z");
        assert!(value.get("availability").is_none());
    }

    #[test]
    fn earliest_among_picks_soonest_and_breaks_ties_by_order() {
        let (a, b, c) = (Ulid::new(), Ulid::new(), Ulid::new());
        let mut busy = room(a, "09:00", "17:00");
        busy.bookings.push(approved(MON + 9 * HOUR, MON + 13 * HOUR));
        let late = room(b, "11:00", "17:00");
        let twin = room(c, "11:00", "17:00");
        let snapshots = vec![busy, late, twin];
        assert_eq!(
            earliest_among(&snapshots, MON + 9 * HOUR, &utc_settings()),
            Some((b, MON + 11 * HOUR))
        );
        assert_eq!(earliest_among(&[], MON, &utc_settings()), None);
    }

    #[test]
    fn resource_timezone_overrides_settings() {
        let mut snapshot = room(Ulid::new(), "09:00", "17:00");
        snapshot.timezone = Some("America/New_York".parse().unwrap());
        // 10:00 UTC is 05:00 EST: closed, opens at 14:00 UTC.
        let r = report(&snapshot, MON + 10 * HOUR, &utc_settings());
        assert!(!r.available);
        assert_eq!(r.next_slot, Some(MON + 14 * HOUR));
    }
}
