/// Furthest a slot search may look ahead, whatever the caller asks for.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Hard cap on candidate evaluations in one slot search. Jump scanning keeps
/// real searches far below this; hitting it means pathological input.
pub const MAX_SCAN_STEPS: usize = 20_000;

/// Windows kept per weekday when parsing a schedule record.
pub const MAX_WINDOWS_PER_DAY: usize = 48;
