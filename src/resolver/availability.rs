use chrono_tz::Tz;
use tracing::debug;

use crate::model::*;
use crate::observability::AVAILABILITY_CHECKS_TOTAL;
use crate::schedule::{covers_instant, WeeklySchedule};
use crate::time::{from_local, to_local};

use super::conflict::active_sorted;

/// Is the resource usable at `now`?
///
/// Hours are checked on the local clock in `tz`; bookings are compared in
/// UTC. When several active bookings cover `now`, the one starting first is
/// reported.
pub fn is_available_now(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    now: Ms,
    tz: Tz,
) -> Availability {
    let in_hours = match to_local(now, tz) {
        Some(local) => covers_instant(schedule, local),
        None => schedule.is_none(),
    };

    let availability = if !in_hours {
        Availability::OutsideHours
    } else {
        match active_sorted(bookings)
            .into_iter()
            .find(|b| b.span.contains_instant(now))
        {
            Some(b) => Availability::BookedUntil(b.span.end),
            None => Availability::Available,
        }
    };

    let outcome = match availability {
        Availability::Available => "available",
        Availability::OutsideHours => "outside_hours",
        Availability::BookedUntil(_) => "booked",
    };
    metrics::counter!(AVAILABILITY_CHECKS_TOTAL, "outcome" => outcome).increment(1);
    debug!(now, outcome, "availability checked");
    availability
}

/// When the open stretch containing `now` ends, as a UTC instant. `None`
/// without a schedule or outside hours.
///
/// This is the close of the window `now` falls in, carried across midnight
/// into contiguous windows. It is not the day's last closing time: with
/// 09:00–12:00 and 13:00–17:00, asking at 10:00 gives 12:00, not 17:00.
pub fn open_until(schedule: Option<&WeeklySchedule>, now: Ms, tz: Tz) -> Option<Ms> {
    let local = to_local(now, tz)?;
    let closes = schedule?.window_end_containing(local)?;
    from_local(closes, tz)
}
