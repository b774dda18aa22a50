use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time is before Unix epoch")
        .as_secs() as i64
}

/// Whole-second timestamp for a kiosk-reported event time.
///
/// Fractional seconds are floored and anything later than `now` is clamped
/// to `now`, so a fast kiosk clock cannot stretch a cooldown window.
/// Returns `None` for negative or non-finite input.
pub fn reported_timestamp(reported: f64, now: i64) -> Option<i64> {
    if !reported.is_finite() || reported < 0.0 {
        return None;
    }
    let floored = reported.floor();
    if floored >= now as f64 {
        return Some(now);
    }
    Some(floored as i64)
}
