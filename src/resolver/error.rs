use ulid::Ulid;

use crate::model::Ms;
use crate::time::format_instant;

/// Why a requested booking cannot be accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingRejection {
    StartsInPast { start: Ms },
    TooShort { minutes: i64, min: u32 },
    TooLong { minutes: i64, max: u32 },
    Misaligned { increment: u32 },
    InsufficientLeadTime { hours: u32 },
    BeyondAdvanceWindow { days: u32 },
    OutsideHours,
    /// Overlaps an active booking (or its buffer). The id is reported when
    /// the booking store supplied one.
    Conflict(Option<Ulid>),
}

impl BookingRejection {
    /// Short stable label, used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            BookingRejection::StartsInPast { .. } => "starts_in_past",
            BookingRejection::TooShort { .. } => "too_short",
            BookingRejection::TooLong { .. } => "too_long",
            BookingRejection::Misaligned { .. } => "misaligned",
            BookingRejection::InsufficientLeadTime { .. } => "lead_time",
            BookingRejection::BeyondAdvanceWindow { .. } => "advance_window",
            BookingRejection::OutsideHours => "outside_hours",
            BookingRejection::Conflict(_) => "conflict",
        }
    }
}

impl std::fmt::Display for BookingRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingRejection::StartsInPast { start } => {
                write!(f, "booking starts in the past ({})", format_instant(*start))
            }
            BookingRejection::TooShort { minutes, min } => {
                write!(f, "booking of {minutes} minutes is shorter than the {min} minute minimum")
            }
            BookingRejection::TooLong { minutes, max } => {
                write!(f, "booking of {minutes} minutes exceeds the {max} minute maximum")
            }
            BookingRejection::Misaligned { increment } => {
                write!(f, "booking must start on a {increment} minute boundary")
            }
            BookingRejection::InsufficientLeadTime { hours } => {
                write!(f, "booking must be made at least {hours} hours in advance")
            }
            BookingRejection::BeyondAdvanceWindow { days } => {
                write!(f, "booking cannot start more than {days} days ahead")
            }
            BookingRejection::OutsideHours => write!(f, "booking falls outside operating hours"),
            BookingRejection::Conflict(Some(id)) => write!(f, "conflict with booking: {id}"),
            BookingRejection::Conflict(None) => write!(f, "conflict with an existing booking"),
        }
    }
}

impl std::error::Error for BookingRejection {}
