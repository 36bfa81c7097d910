//! `HH:MM` time-of-day handling for schedule and fill-window fields.

use time::macros::format_description;
use time::{Duration, Time};

/// Parse a time-of-day as entered in a form: `HH:MM` or `HH:MM:SS`,
/// surrounding whitespace ignored.
pub fn parse_time_of_day(input: &str) -> Option<Time> {
    let s = input.trim();
    Time::parse(s, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]:[second]")))
        .ok()
}

/// Canonical `HH:MM` rendering. Seconds are dropped.
pub fn format_time_of_day(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Parse and re-render, or `None` if the input is not a time of day.
pub fn normalize(input: &str) -> Option<String> {
    parse_time_of_day(input).map(format_time_of_day)
}

/// Move `t` by `minutes` (negative for earlier), wrapping around midnight.
pub fn shift_minutes(t: Time, minutes: i64) -> Time {
    t + Duration::minutes(minutes)
}
