use std::time::{Duration, Instant};

use bookable::resolver::{check_request, free_windows, next_available_slot, SlotSearch};
use bookable::schedule::parse_schedule;
use bookable::time::{DAY, HOUR, MINUTE};
use bookable::{BookingConstraints, BookingInterval, BookingStatus, Ms, RawConstraints, Span};
use chrono_tz::Tz;
use serde_json::json;
use ulid::Ulid;

// 2024-01-01T00:00:00Z, a Monday.
const ORIGIN: Ms = 1_704_067_200_000;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        percentile(latencies, 100.0).as_secs_f64() * 1000.0,
    );
}

/// Bookings filling most of every open hour for `days` days: 50 minutes
/// booked, 10 minutes free, with a sprinkling of cancelled ones.
fn dense_bookings(days: i64) -> Vec<BookingInterval> {
    let mut bookings = Vec::new();
    for d in 0..days {
        for h in 8..20 {
            let start = ORIGIN + d * DAY + h * HOUR;
            let status = if (d + h) % 7 == 0 {
                BookingStatus::Cancelled
            } else {
                BookingStatus::Approved
            };
            bookings.push(
                BookingInterval::new(Span::new(start, start + 50 * MINUTE), status)
                    .with_id(Ulid::new()),
            );
        }
    }
    bookings
}

fn phase1_slot_search(bookings: &[BookingInterval]) {
    let day = json!([{"start": "08:00", "end": "20:00"}]);
    let schedule = parse_schedule(&json!({
        "monday": day, "tuesday": day, "wednesday": day, "thursday": day,
        "friday": day, "saturday": day, "sunday": day,
    }));

    let n = 2000;
    let mut latencies = Vec::with_capacity(n);
    let mut found = 0usize;
    let start = Instant::now();
    for i in 0..n {
        let from = ORIGIN + (i as i64 % 300) * DAY / 10;
        let search = SlotSearch::new(from, 30, Tz::UTC)
            .buffer(5)
            .increment(15)
            .horizon(90);
        let t = Instant::now();
        if next_available_slot(schedule.as_ref(), bookings, &search).is_some() {
            found += 1;
        }
        latencies.push(t.elapsed());
    }
    let elapsed = start.elapsed();
    println!(
        "  {n} searches over {} bookings in {:.2}s ({found} found)",
        bookings.len(),
        elapsed.as_secs_f64()
    );
    print_latency("next_available_slot", &mut latencies);
}

fn phase2_request_checks(bookings: &[BookingInterval]) {
    let schedule = parse_schedule(&json!({
        "monday": [{"start": "00:00", "end": "24:00"}],
        "tuesday": [{"start": "00:00", "end": "24:00"}],
        "wednesday": [{"start": "00:00", "end": "24:00"}],
        "thursday": [{"start": "00:00", "end": "24:00"}],
        "friday": [{"start": "00:00", "end": "24:00"}],
        "saturday": [{"start": "00:00", "end": "24:00"}],
        "sunday": [{"start": "00:00", "end": "24:00"}],
    }));
    let constraints = BookingConstraints::from(RawConstraints {
        min_booking_minutes: Some(15),
        max_booking_minutes: Some(240),
        booking_increment_minutes: Some(15),
        buffer_minutes: Some(5),
        ..RawConstraints::default()
    });

    let n = 10_000;
    let mut latencies = Vec::with_capacity(n);
    let mut accepted = 0usize;
    for i in 0..n {
        let start = ORIGIN + (i as i64) * 15 * MINUTE;
        let request = Span::new(start, start + 30 * MINUTE);
        let t = Instant::now();
        if check_request(schedule.as_ref(), bookings, &constraints, &request, ORIGIN, Tz::UTC)
            .is_ok()
        {
            accepted += 1;
        }
        latencies.push(t.elapsed());
    }
    println!("  {n} requests checked, {accepted} accepted");
    print_latency("check_request", &mut latencies);
}

fn phase3_free_windows(bookings: &[BookingInterval]) {
    let tz: Tz = chrono_tz::America::New_York;
    let schedule = parse_schedule(&json!({
        "monday": [{"start": "07:00", "end": "12:00"}, {"start": "13:00", "end": "22:00"}],
        "wednesday": [{"start": "07:00", "end": "22:00"}],
        "friday": [{"start": "07:00", "end": "18:00"}],
    }));

    let n = 500;
    let mut latencies = Vec::with_capacity(n);
    let mut spans = 0usize;
    for i in 0..n {
        let from = ORIGIN + (i as i64 % 60) * DAY;
        let query = Span::new(from, from + 30 * DAY);
        let t = Instant::now();
        spans += free_windows(schedule.as_ref(), bookings, 10, &query, tz, Some(20 * MINUTE)).len();
        latencies.push(t.elapsed());
    }
    println!("  {n} month-long queries, {spans} free spans total");
    print_latency("free_windows", &mut latencies);
}

fn main() {
    tracing_subscriber::fmt::init();

    let days: i64 = std::env::var("BOOKABLE_BENCH_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120);

    println!("=== bookable stress benchmark ===");
    println!("[setup]");
    let bookings = dense_bookings(days);
    println!("  generated {} bookings over {days} days", bookings.len());

    println!("\n[phase 1] next-slot search over dense calendars");
    phase1_slot_search(&bookings);

    println!("\n[phase 2] booking request validation");
    phase2_request_checks(&bookings);

    println!("\n[phase 3] free-window listing");
    phase3_free_windows(&bookings);

    println!("\n=== benchmark complete ===");
}
