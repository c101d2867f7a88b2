// Display formatting for durations and start times.

use chrono::Timelike;

use crate::event::parse_time;

/// Render a duration in minutes as `"{h}h {m}m"`, dropping whichever term is
/// zero. A zero duration renders as `"0m"`.
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Render a 24-hour `HH:MM[:SS]` time as 12-hour `h:MM AM|PM`.
///
/// Input that does not parse is returned unchanged.
pub fn format_time(raw: &str) -> String {
    let Some(time) = parse_time(raw) else {
        return raw.to_string();
    };
    let (is_pm, hour12) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour12, time.minute(), suffix)
}
