use chrono::{DateTime, Utc};

/// Whole seconds from `from` to `to`, truncated toward zero.
///
/// Skewed or malformed timestamps can put `to` before `from`; that span is
/// clamped to zero so callers never subtract a negative delta.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

/// Remaining seconds after `delta` has elapsed from an `elapsed` baseline.
pub fn remaining_after(elapsed: u32, delta: u64) -> u32 {
    u64::from(elapsed).saturating_sub(delta) as u32
}

/// Render seconds as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(total_seconds: u32) -> String {
    let hrs = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
