use chrono_tz::Tz;
use tracing::debug;

use crate::model::*;
use crate::schedule::WeeklySchedule;
use crate::time::{align_up, to_local, DAY, HOUR, MINUTE};

use super::error::BookingRejection;
use super::free::merge_overlapping;

/// Active bookings with a usable span, ascending by start.
///
/// Callers may pre-filter by status, but nothing here relies on it.
pub(crate) fn active_sorted(bookings: &[BookingInterval]) -> Vec<&BookingInterval> {
    let mut active: Vec<&BookingInterval> = bookings
        .iter()
        .filter(|b| b.is_active())
        .filter(|b| {
            let valid = b.span.start < b.span.end;
            if !valid {
                debug!(id = ?b.id, start = b.span.start, end = b.span.end, "ignoring booking with empty span");
            }
            valid
        })
        .collect();
    active.sort_by_key(|b| b.span.start);
    active
}

/// Active bookings grown by `buffer` on both sides, sorted and merged.
pub fn blocked_spans(bookings: &[BookingInterval], buffer: Ms) -> Vec<Span> {
    let buffer = buffer.max(0);
    let padded: Vec<Span> = active_sorted(bookings)
        .into_iter()
        .map(|b| b.span.padded(buffer, buffer))
        .collect();
    // Padding by a constant keeps the start order.
    merge_overlapping(&padded)
}

/// A blocked span stops `request` if they overlap or if `request` ends
/// exactly where the block starts. Starting at the block's end is clear.
pub(crate) fn blocks(blocked: &Span, request: &Span) -> bool {
    blocked.start <= request.end && request.start < blocked.end
}

/// Validate one requested booking against the resource's rules, its hours and
/// the active bookings already on it. Checks run cheapest first and the first
/// failure is returned.
pub fn check_request(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    constraints: &BookingConstraints,
    request: &Span,
    now: Ms,
    tz: Tz,
) -> Result<(), BookingRejection> {
    let result = check_request_inner(schedule, bookings, constraints, request, now, tz);
    if let Err(rejection) = &result {
        debug!(start = request.start, end = request.end, %rejection, "booking request rejected");
        metrics::counter!(crate::observability::REQUEST_REJECTIONS_TOTAL, "reason" => rejection.label())
            .increment(1);
    }
    result
}

fn check_request_inner(
    schedule: Option<&WeeklySchedule>,
    bookings: &[BookingInterval],
    constraints: &BookingConstraints,
    request: &Span,
    now: Ms,
    tz: Tz,
) -> Result<(), BookingRejection> {
    if request.start < now {
        return Err(BookingRejection::StartsInPast { start: request.start });
    }

    let minutes = request.duration_ms() / MINUTE;
    if let Some(min) = constraints.min_booking_minutes
        && request.duration_ms() < Ms::from(min) * MINUTE {
            return Err(BookingRejection::TooShort { minutes, min });
        }
    if let Some(max) = constraints.max_booking_minutes
        && request.duration_ms() > Ms::from(max) * MINUTE {
            return Err(BookingRejection::TooLong { minutes, max });
        }

    let increment = constraints.increment_minutes;
    if align_up(request.start, Ms::from(increment) * MINUTE, tz) != request.start {
        return Err(BookingRejection::Misaligned { increment });
    }

    let hours = constraints.lead_time_hours;
    if request.start < now + Ms::from(hours) * HOUR {
        return Err(BookingRejection::InsufficientLeadTime { hours });
    }

    if let Some(days) = constraints.advance_booking_days
        && request.start > now + Ms::from(days) * DAY {
            return Err(BookingRejection::BeyondAdvanceWindow { days });
        }

    if let Some(schedule) = schedule {
        let fits = match (to_local(request.start, tz), to_local(request.end, tz)) {
            (Some(start), Some(end)) => schedule.covers_local_span(start, end),
            _ => false,
        };
        if !fits {
            return Err(BookingRejection::OutsideHours);
        }
    }

    let buffer = Ms::from(constraints.buffer_minutes) * MINUTE;
    if let Some(existing) = active_sorted(bookings)
        .into_iter()
        .find(|b| blocks(&b.span.padded(buffer, buffer), request))
    {
        return Err(BookingRejection::Conflict(existing.id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(start: Ms, end: Ms, status: BookingStatus) -> BookingInterval {
        BookingInterval::new(Span::new(start, end), status)
    }

    #[test]
    fn blocked_spans_skip_inactive_and_merge() {
        let bookings = vec![
            booking(5 * HOUR, 6 * HOUR, BookingStatus::Approved),
            booking(HOUR, 2 * HOUR, BookingStatus::Pending),
            booking(2 * HOUR, 3 * HOUR, BookingStatus::Cancelled),
            booking(2 * HOUR + 10 * MINUTE, 3 * HOUR, BookingStatus::Approved),
        ];
        let blocked = blocked_spans(&bookings, 10 * MINUTE);
        assert_eq!(
            blocked,
            vec![
                Span::new(HOUR - 10 * MINUTE, 3 * HOUR + 10 * MINUTE),
                Span::new(5 * HOUR - 10 * MINUTE, 6 * HOUR + 10 * MINUTE),
            ]
        );
    }

    #[test]
    fn blocked_spans_ignore_empty_bookings() {
        let bad = BookingInterval {
            id: None,
            span: Span { start: HOUR, end: HOUR },
            status: BookingStatus::Approved,
        };
        assert!(blocked_spans(&[bad], 0).is_empty());
    }

    #[test]
    fn ending_at_a_block_start_is_blocked_but_starting_at_its_end_is_not() {
        let block = Span::new(2 * HOUR, 3 * HOUR);
        assert!(blocks(&block, &Span::new(HOUR, 2 * HOUR)));
        assert!(blocks(&block, &Span::new(2 * HOUR + MINUTE, 4 * HOUR)));
        assert!(!blocks(&block, &Span::new(3 * HOUR, 4 * HOUR)));
        assert!(!blocks(&block, &Span::new(0, HOUR + 59 * MINUTE)));
    }

    #[test]
    fn active_sorted_orders_by_start() {
        let bookings = vec![
            booking(3 * HOUR, 4 * HOUR, BookingStatus::Approved),
            booking(HOUR, 2 * HOUR, BookingStatus::Pending),
            booking(0, HOUR, BookingStatus::Completed),
        ];
        let starts: Vec<Ms> = active_sorted(&bookings).iter().map(|b| b.span.start).collect();
        assert_eq!(starts, vec![HOUR, 3 * HOUR]);
    }
}
