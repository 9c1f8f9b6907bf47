use chrono::Datelike;
use chrono_tz::Tz;

use crate::model::*;
use crate::schedule::WeeklySchedule;
use crate::time::{from_local, local_at, to_local, MINUTE};

use super::conflict::blocked_spans;

/// Free time inside `query`: the schedule's windows laid out on the calendar
/// (all of `query` when there is no schedule), minus active bookings grown by
/// `buffer_minutes`. Spans shorter than `min_duration` are dropped.
///
/// A request must end strictly before a block, so a span that stops at a
/// booking cannot be booked right up to its end.
pub fn free_windows(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    buffer_minutes: u32,
    query: &Span,
    tz: Tz,
    min_duration: Option<Ms>,
) -> Vec<Span> {
    let open = match schedule {
        Some(schedule) => open_spans(schedule, query, tz),
        None => vec![*query],
    };

    let blocked = blocked_spans(bookings, Ms::from(buffer_minutes) * MINUTE);
    let mut free = if blocked.is_empty() {
        open
    } else {
        subtract_intervals(&open, &blocked)
    };

    if let Some(min_dur) = min_duration {
        free.retain(|span| span.duration_ms() >= min_dur);
    }
    free
}

/// Schedule windows converted to UTC spans and clamped to `query`.
///
/// Starts a day early so a window running into `query.start` from the
/// previous local day is not missed.
pub fn open_spans(schedule: &WeeklySchedule, query: &Span, tz: Tz) -> Vec<Span> {
    let (Some(first), Some(last)) = (to_local(query.start, tz), to_local(query.end, tz)) else {
        return Vec::new();
    };
    let Some(mut date) = first.date().pred_opt() else {
        return Vec::new();
    };
    let last = last.date();

    let mut spans = Vec::new();
    while date <= last {
        for window in schedule.windows(date.weekday()) {
            let opens = from_local(local_at(date, window.start_ms()), tz);
            let closes = from_local(local_at(date, window.end_ms()), tz);
            if let (Some(opens), Some(closes)) = (opens, closes)
                && let Some(span) = Span::checked(opens.max(query.start), closes.min(query.end)) {
                    spans.push(span);
                }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    spans.sort_by_key(|s| s.start);
    merge_overlapping(&spans)
}

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        merged.push(span);
    }
    merged
}

/// Remove every span of `to_remove` from `base`. Both inputs sorted by start;
/// `base` disjoint.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Span::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Span::new(current_start, current_end));
        }
    }

    result
}
