use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::limits::{MAX_HORIZON_DAYS, MAX_SCAN_STEPS};
use crate::model::*;
use crate::observability::{SLOT_SCAN_STEPS, SLOT_SEARCHES_TOTAL};
use crate::schedule::WeeklySchedule;
use crate::time::{align_up, from_local, to_local, DAY, HOUR, MINUTE};

use super::conflict::{blocked_spans, blocks};

/// Parameters of one next-slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSearch {
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    /// Search origin ("now"), UTC.
    pub start_from: Ms,
    pub lead_time_hours: u32,
    pub max_days_ahead: u32,
    /// Zero means [`DEFAULT_INCREMENT_MINUTES`].
    pub increment_minutes: u32,
    /// Zone the weekly schedule is read in.
    pub tz: Tz,
}

impl SlotSearch {
    pub fn new(start_from: Ms, duration_minutes: u32, tz: Tz) -> Self {
        Self {
            duration_minutes,
            buffer_minutes: 0,
            start_from,
            lead_time_hours: 0,
            max_days_ahead: 7,
            increment_minutes: DEFAULT_INCREMENT_MINUTES,
            tz,
        }
    }

    pub fn buffer(mut self, minutes: u32) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    pub fn lead_time(mut self, hours: u32) -> Self {
        self.lead_time_hours = hours;
        self
    }

    pub fn horizon(mut self, days: u32) -> Self {
        self.max_days_ahead = days;
        self
    }

    pub fn increment(mut self, minutes: u32) -> Self {
        self.increment_minutes = minutes;
        self
    }

    fn increment_ms(&self) -> Ms {
        let minutes = if self.increment_minutes == 0 {
            DEFAULT_INCREMENT_MINUTES
        } else {
            self.increment_minutes
        };
        Ms::from(minutes) * MINUTE
    }

    fn duration_ms(&self) -> Ms {
        Ms::from(self.duration_minutes.max(1)) * MINUTE
    }

    fn horizon_end(&self) -> Ms {
        self.start_from + Ms::from(self.max_days_ahead.min(MAX_HORIZON_DAYS)) * DAY
    }

    /// Lead time pushes the earliest start forward, then it is aligned.
    fn first_candidate(&self) -> Ms {
        let floor = self.start_from + Ms::from(self.lead_time_hours) * HOUR;
        align_up(floor, self.increment_ms(), self.tz)
    }
}

/// Why a candidate was passed over, and where to look next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// Resource not open for the whole candidate; next opening, if any.
    Closed(Option<Ms>),
    /// Candidate overlaps a blocked span ending at the given instant.
    Blocked(Ms),
}

fn advance_reason(
    schedule: &WeeklySchedule,
    blocked: &[Span],
    candidate: &Span,
    tz: Tz,
) -> Option<Advance> {
    // The local end comes from the UTC end, so a DST change inside the
    // candidate moves it on the wall clock.
    let start = to_local(candidate.start, tz);
    let end = to_local(candidate.end, tz);
    let (Some(local), Some(local_end)) = (start, end) else {
        return Some(Advance::Closed(None));
    };
    if !schedule.covers_local_span(local, local_end) {
        let reopens = schedule
            .next_opening_after(local)
            .and_then(|open| from_local(open, tz));
        return Some(Advance::Closed(reopens));
    }

    // `blocked` is sorted and disjoint: the first span ending after our start
    // is the only one that can block.
    let idx = blocked.partition_point(|b| b.end <= candidate.start);
    match blocked.get(idx) {
        Some(b) if blocks(b, candidate) => Some(Advance::Blocked(b.end)),
        _ => None,
    }
}

/// Earliest start at or after the lead-time floor at which a slot of
/// `search.duration_minutes` fits inside the schedule without touching any
/// active booking or its buffer. `None` when there is no schedule (hours
/// unknown) or when nothing fits before the horizon.
///
/// Candidates only ever move forward, by jumping to the next opening or past
/// the blocking booking, so the work is bounded by the number of windows and
/// bookings in the horizon rather than by its length.
pub fn next_available_slot(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    search: &SlotSearch,
) -> Option<Ms> {
    let Some(schedule) = schedule else {
        debug!("no operating hours declared; next slot is undeterminable");
        metrics::counter!(SLOT_SEARCHES_TOTAL, "outcome" => "no_schedule").increment(1);
        return None;
    };

    let tz = search.tz;
    let increment = search.increment_ms();
    let duration = search.duration_ms();
    let horizon_end = search.horizon_end();
    let blocked = blocked_spans(bookings, Ms::from(search.buffer_minutes) * MINUTE);

    let mut candidate = search.first_candidate();
    let mut steps = 0usize;
    let (found, outcome) = loop {
        if candidate >= horizon_end {
            break (None, "horizon");
        }
        steps += 1;
        if steps > MAX_SCAN_STEPS {
            warn!(
                start_from = search.start_from,
                steps, "slot search hit the step cap; giving up"
            );
            break (None, "step_cap");
        }

        let span = Span::new(candidate, candidate + duration);
        let target = match advance_reason(schedule, &blocked, &span, tz) {
            None => break (Some(candidate), "found"),
            Some(Advance::Closed(None)) => break (None, "closed"),
            Some(Advance::Closed(Some(reopens))) => reopens,
            Some(Advance::Blocked(clear_at)) => clear_at,
        };

        let next = align_up(target, increment, tz);
        candidate = if next > candidate {
            next
        } else {
            align_up(candidate + 1, increment, tz)
        };
    };

    metrics::counter!(SLOT_SEARCHES_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(SLOT_SCAN_STEPS).record(steps as f64);
    debug!(start_from = search.start_from, steps, outcome, ?found, "slot search finished");
    found
}

/// Next slot for a resource, with every search parameter taken from its
/// constraints. The horizon is the tighter of `horizon_days` and the
/// resource's advance-booking window.
pub fn next_slot_for(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    constraints: &BookingConstraints,
    now: Ms,
    horizon_days: u32,
    tz: Tz,
) -> Option<Ms> {
    let horizon = constraints
        .advance_booking_days
        .map_or(horizon_days, |days| days.min(horizon_days));
    let search = SlotSearch::new(now, constraints.search_duration_minutes(), tz)
        .buffer(constraints.buffer_minutes)
        .lead_time(constraints.lead_time_hours)
        .horizon(horizon)
        .increment(constraints.increment_minutes);
    next_available_slot(schedule, bookings, &search)
}
