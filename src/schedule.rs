//! Weekly operating hours.
//!
//! A resource publishes its hours as a JSON record keyed by lowercase day
//! name, each day holding a list of `{"start": "HH:MM", "end": "HH:MM"}`
//! windows. Windows are half-open on the local clock: open at `start`,
//! closed at `end`. A missing day is closed all day; a missing schedule
//! means the resource declares no hours at all.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde_json::Value;
use tracing::{debug, warn};

use crate::limits::MAX_WINDOWS_PER_DAY;
use crate::time::{local_at, ms_of_day};

const DAY_MS: u32 = 86_400_000;

/// One opening window, in milliseconds since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: u32,
    end: u32,
}

impl Window {
    /// `end` may be a full day (`24:00`). Returns `None` unless `start < end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start < end && end <= DAY_MS).then_some(Self { start, end })
    }

    pub fn start_ms(&self) -> u32 {
        self.start
    }

    pub fn end_ms(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, ms: u32) -> bool {
        self.start <= ms && ms < self.end
    }

    fn runs_to_midnight(&self) -> bool {
        self.end == DAY_MS
    }
}

/// Opening windows for each weekday, sorted and merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Vec<Window>; 7],
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

impl WeeklySchedule {
    /// Build from unordered, possibly overlapping windows.
    pub fn from_windows(windows: impl IntoIterator<Item = (Weekday, Window)>) -> Self {
        let mut days: [Vec<Window>; 7] = Default::default();
        for (day, window) in windows {
            days[day_index(day)].push(window);
        }
        for list in &mut days {
            list.sort_by_key(|w| w.start);
            *list = merge_windows(list);
        }
        Self { days }
    }

    pub fn windows(&self, day: Weekday) -> &[Window] {
        &self.days[day_index(day)]
    }

    pub fn is_closed_all_week(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    fn window_at(&self, day: Weekday, ms: u32) -> Option<&Window> {
        self.windows(day).iter().find(|w| w.contains(ms))
    }

    /// True if the local wall time `local` falls inside an opening window.
    pub fn covers(&self, local: NaiveDateTime) -> bool {
        self.window_at(local.weekday(), ms_of_day(local.time())).is_some()
    }

    /// True if every instant of the local interval `[start, end)` is open.
    ///
    /// The interval may cross midnight as long as one day's window runs to
    /// `24:00` and the next day's window opens at `00:00`.
    pub fn covers_local_span(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if end <= start {
            return false;
        }
        let mut cursor = start;
        while cursor < end {
            let date = cursor.date();
            let Some(window) = self.window_at(date.weekday(), ms_of_day(cursor.time())) else {
                return false;
            };
            let closes = local_at(date, window.end);
            if end <= closes {
                return true;
            }
            if !window.runs_to_midnight() {
                return false;
            }
            cursor = closes;
        }
        true
    }

    /// Earliest window opening strictly after `local`, looking one week ahead.
    pub fn next_opening_after(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut date = local.date();
        for _ in 0..=7 {
            let opening = self
                .windows(date.weekday())
                .iter()
                .map(|w| local_at(date, w.start))
                .find(|open| *open > local);
            if opening.is_some() {
                return opening;
            }
            date = date.succ_opt()?;
        }
        None
    }

    /// When the open stretch containing `local` closes, following windows
    /// that continue past midnight. `None` when closed at `local`.
    pub fn window_end_containing(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut date = local.date();
        let mut window = *self.window_at(date.weekday(), ms_of_day(local.time()))?;
        for _ in 0..7 {
            if !window.runs_to_midnight() {
                break;
            }
            let next = date.succ_opt()?;
            match self.windows(next.weekday()).first() {
                Some(w) if w.start == 0 => {
                    date = next;
                    window = *w;
                }
                _ => break,
            }
        }
        Some(local_at(date, window.end))
    }
}

/// Merge sorted overlapping/adjacent windows.
fn merge_windows(sorted: &[Window]) -> Vec<Window> {
    let mut merged: Vec<Window> = Vec::new();
    for &w in sorted {
        if let Some(last) = merged.last_mut()
            && w.start <= last.end {
                last.end = last.end.max(w.end);
                continue;
            }
        merged.push(w);
    }
    merged
}

/// `None` schedule means no declared hours: every instant is covered.
pub fn covers_instant(schedule: Option<&WeeklySchedule>, local: NaiveDateTime) -> bool {
    schedule.is_none_or(|s| s.covers(local))
}

/// Parse a strict `HH:MM` 24-hour time of day.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

fn parse_window_end(s: &str) -> Option<u32> {
    if s.trim() == "24:00" {
        return Some(DAY_MS);
    }
    parse_time_of_day(s).map(ms_of_day)
}

pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_window(day: &str, entry: &Value) -> Option<Window> {
    let start = entry.get("start").and_then(Value::as_str);
    let end = entry.get("end").and_then(Value::as_str);
    let (Some(start_str), Some(end_str)) = (start, end) else {
        debug!(day, ?entry, "skipping schedule window without start/end");
        return None;
    };
    let start = parse_time_of_day(start_str).map(ms_of_day);
    let (Some(start), Some(end)) = (start, parse_window_end(end_str)) else {
        debug!(day, start = start_str, end = end_str, "skipping unparseable schedule window");
        return None;
    };
    let window = Window::new(start, end);
    if window.is_none() {
        warn!(
            day,
            start = start_str,
            end = end_str,
            "skipping schedule window that does not end after it starts (cross-midnight windows are unsupported)"
        );
    }
    window
}

/// Parse a weekly-hours record.
///
/// Returns `None` when the record is null, not an object, or names no known
/// day. Bad windows and unknown keys are dropped; a day whose entries are
/// all bad is closed. A JSON string holding the record is unwrapped once.
pub fn parse_schedule(raw: &Value) -> Option<WeeklySchedule> {
    let obj = match raw {
        Value::Object(obj) => obj,
        Value::String(text) => return parse_schedule_str(text),
        _ => return None,
    };

    let mut known_day = false;
    let mut windows = Vec::new();
    for (key, entries) in obj {
        let Some(day) = weekday_from_name(key) else {
            debug!(key = %key, "ignoring unknown schedule day");
            continue;
        };
        known_day = true;
        let Some(list) = entries.as_array() else {
            debug!(day = %key, "schedule day is not a list; treating as closed");
            continue;
        };
        for entry in list.iter().take(MAX_WINDOWS_PER_DAY) {
            if let Some(window) = parse_window(key, entry) {
                windows.push((day, window));
            }
        }
        if list.len() > MAX_WINDOWS_PER_DAY {
            warn!(day = %key, count = list.len(), "too many schedule windows; extra entries dropped");
        }
    }

    known_day.then(|| WeeklySchedule::from_windows(windows))
}

/// Parse a weekly-hours record stored as JSON text. Blank or invalid text
/// yields `None`.
pub fn parse_schedule_str(text: &str) -> Option<WeeklySchedule> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(_)) => None,
        Ok(value) => parse_schedule(&value),
        Err(e) => {
            debug!(error = %e, "schedule text is not valid JSON");
            None
        }
    }
}
