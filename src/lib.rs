//! Availability core for bookable campus resources: weekly operating hours,
//! point-in-time availability, next-slot search and booking validation.
//!
//! Pure computation over caller-owned snapshots. Instants are Unix
//! milliseconds (UTC); schedules are read on a resource-local clock.

pub mod config;
pub mod limits;
pub mod model;
pub mod observability;
pub mod report;
pub mod resolver;
pub mod schedule;
pub mod time;

pub use config::{ConfigError, Settings};
pub use model::{
    Availability, BookingConstraints, BookingInterval, BookingStatus, Ms, RawConstraints, Span,
};
pub use report::{earliest_among, report, AvailabilityReport, ResourceSnapshot};
pub use resolver::{
    check_request, free_windows, is_available_now, next_available_slot, next_slot_for, open_until,
    BookingRejection, SlotSearch,
};
pub use schedule::{parse_schedule, parse_schedule_str, WeeklySchedule, Window};
