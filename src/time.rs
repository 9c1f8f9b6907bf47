//! Conversions between UTC instants (`Ms`) and resource-local wall time.
//!
//! Bookings are compared in UTC; weekly schedules are read on the local
//! clock. Everything that crosses between the two goes through here.

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

use crate::model::Ms;

pub const SECOND: Ms = 1_000;
pub const MINUTE: Ms = 60 * SECOND;
pub const HOUR: Ms = 60 * MINUTE;
pub const DAY: Ms = 24 * HOUR;

pub fn to_utc(t: Ms) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(t)
}

pub fn from_utc(dt: DateTime<Utc>) -> Ms {
    dt.timestamp_millis()
}

/// Wall-clock reading of `t` in `tz`.
pub fn to_local(t: Ms, tz: Tz) -> Option<NaiveDateTime> {
    to_utc(t).map(|dt| dt.with_timezone(&tz).naive_local())
}

/// Instant at which the wall clock in `tz` reads `local`.
///
/// Ambiguous readings (clocks going back) resolve to the earlier instant.
/// Readings inside a spring-forward gap resolve to the first valid reading
/// an hour later.
pub fn from_local(local: NaiveDateTime, tz: Tz) -> Option<Ms> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis())
}

/// Milliseconds elapsed since local midnight.
pub fn ms_of_day(t: NaiveTime) -> u32 {
    // Leap-second readings carry nanos >= 1e9; clamp them into the last ms.
    let millis = (t.nanosecond() / 1_000_000).min(999);
    t.num_seconds_from_midnight() * 1_000 + millis
}

/// Local wall time `ms` milliseconds after midnight of `date`.
pub fn local_at(date: NaiveDate, ms: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + TimeDelta::milliseconds(i64::from(ms))
}

/// Round `t` up to the next multiple of `increment` counted from local
/// midnight in `tz`. Already aligned instants are returned unchanged.
pub fn align_up(t: Ms, increment: Ms, tz: Tz) -> Ms {
    if increment <= 0 {
        return t;
    }
    let offset = match to_local(t, tz) {
        Some(local) => Ms::from(ms_of_day(local.time())),
        None => t.rem_euclid(DAY),
    };
    let rem = offset.rem_euclid(increment);
    if rem == 0 { t } else { t + (increment - rem) }
}

pub fn format_instant(t: Ms) -> String {
    match to_utc(t) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => format!("{t}ms"),
    }
}
