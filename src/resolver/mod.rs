//! Availability decisions over one resource's hours and bookings.
//!
//! Every function here is pure: inputs are caller-owned snapshots, nothing is
//! cached or shared, and "no answer" is a return value, never an error.

mod availability;
mod conflict;
mod error;
mod free;
mod slot;

pub use availability::{is_available_now, open_until};
pub use conflict::{blocked_spans, check_request};
pub use error::BookingRejection;
pub use free::{free_windows, merge_overlapping, open_spans, subtract_intervals};
pub use slot::{next_available_slot, next_slot_for, SlotSearch};
