use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::time::format_instant;

/// Unix milliseconds, UTC. The only instant type.
pub type Ms = i64;

/// Search duration used when a resource declares no minimum booking length.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Start-time granularity used when a resource declares none (or zero).
pub const DEFAULT_INCREMENT_MINUTES: u32 = 30;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Like `new`, but returns `None` for empty or inverted bounds.
    pub fn checked(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Grow the span by `before` on the left and `after` on the right.
    pub fn padded(&self, before: Ms, after: Ms) -> Span {
        Span::new(self.start - before, self.end + after)
    }
}

/// Lifecycle state of a reservation, as persisted by the booking store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Pending and approved bookings hold the resource; everything else is history.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }
}

/// Read-only view of one existing reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInterval {
    #[serde(default)]
    pub id: Option<Ulid>,
    pub span: Span,
    pub status: BookingStatus,
}

impl BookingInterval {
    pub fn new(span: Span, status: BookingStatus) -> Self {
        Self {
            id: None,
            span,
            status,
        }
    }

    pub fn with_id(mut self, id: Ulid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Constraint fields exactly as stored on a resource record. Every field may
/// be missing, null, zero or negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConstraints {
    pub min_booking_minutes: Option<i64>,
    pub max_booking_minutes: Option<i64>,
    pub booking_increment_minutes: Option<i64>,
    pub buffer_minutes: Option<i64>,
    pub advance_booking_days: Option<i64>,
    pub min_lead_time_hours: Option<i64>,
}

/// Booking rules of one resource with defaulting already applied.
///
/// Zero or negative raw values count as "not set": bounds become unbounded,
/// the increment falls back to [`DEFAULT_INCREMENT_MINUTES`], buffer and lead
/// time fall back to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingConstraints {
    pub min_booking_minutes: Option<u32>,
    pub max_booking_minutes: Option<u32>,
    pub increment_minutes: u32,
    pub buffer_minutes: u32,
    pub advance_booking_days: Option<u32>,
    pub lead_time_hours: u32,
}

impl Default for BookingConstraints {
    fn default() -> Self {
        Self::from(RawConstraints::default())
    }
}

fn positive(v: Option<i64>) -> Option<u32> {
    v.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

impl From<RawConstraints> for BookingConstraints {
    fn from(raw: RawConstraints) -> Self {
        Self {
            min_booking_minutes: positive(raw.min_booking_minutes),
            max_booking_minutes: positive(raw.max_booking_minutes),
            increment_minutes: positive(raw.booking_increment_minutes)
                .unwrap_or(DEFAULT_INCREMENT_MINUTES),
            buffer_minutes: positive(raw.buffer_minutes).unwrap_or(0),
            advance_booking_days: positive(raw.advance_booking_days),
            lead_time_hours: positive(raw.min_lead_time_hours).unwrap_or(0),
        }
    }
}

impl BookingConstraints {
    /// Slot searches always look for the shortest bookable slot.
    pub fn search_duration_minutes(&self) -> u32 {
        self.min_booking_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }
}

/// Answer to "can this resource be used right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    OutsideHours,
    /// Held by an active booking ending at the given instant.
    BookedUntil(Ms),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            Availability::Available => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::OutsideHours => write!(f, "outside operating hours"),
            Availability::BookedUntil(end) => write!(f, "booked until {}", format_instant(*end)),
        }
    }
}
