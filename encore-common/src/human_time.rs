//! Human-readable play time formatting
//!
//! Dashboards show cumulative practice time as `HH:MM:SS`. Hours are not
//! wrapped at 24, so a user with 30 hours of practice shows `30:00:00`.

/// Format a duration in seconds as `HH:MM:SS`.
///
/// Negative input is clamped to zero; accumulated play time never decreases.
///
/// # Examples
///
/// ```
/// use encore_common::human_time::format_play_time;
///
/// assert_eq!(format_play_time(0), "00:00:00");
/// assert_eq!(format_play_time(195), "00:03:15");
/// assert_eq!(format_play_time(108_000), "30:00:00");
/// ```
pub fn format_play_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Parse `HH:MM:SS` (hours unbounded, minutes and seconds below 60).
///
/// Returns `None` for anything else, including negative components.
pub fn parse_play_time(text: &str) -> Option<i64> {
    let mut parts = text.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let mins: i64 = parts.next()?.parse().ok()?;
    let secs: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if hours < 0 || !(0..60).contains(&mins) || !(0..60).contains(&secs) {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(mins * 60 + secs)
}
