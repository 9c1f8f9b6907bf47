// Metric names. Recording goes through the `metrics` facade; installing an
// exporter is up to the embedding application.

/// Counter: point-in-time availability checks. Labels: outcome.
pub const AVAILABILITY_CHECKS_TOTAL: &str = "bookable_availability_checks_total";

/// Counter: next-slot searches. Labels: outcome.
pub const SLOT_SEARCHES_TOTAL: &str = "bookable_slot_searches_total";

/// Histogram: candidates evaluated per next-slot search.
pub const SLOT_SCAN_STEPS: &str = "bookable_slot_scan_steps";

/// Counter: booking requests rejected by `check_request`. Labels: reason.
pub const REQUEST_REJECTIONS_TOTAL: &str = "bookable_request_rejections_total";

/// Counter: availability reports built for the concierge/UI.
pub const REPORTS_TOTAL: &str = "bookable_reports_total";
