//! Display formatting for durations and delivery dates.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Duration in days as hours, days and hours, or weeks and days.
pub fn format_duration(days: f64) -> String {
    let days = if days.is_nan() { 0.0 } else { days.max(0.0) };

    if days < 1.0 {
        return plural((days * 24.0).round() as u64, "hour");
    }

    if days < 7.0 {
        let whole = days.floor() as u64;
        let hours = ((days - days.floor()) * 24.0).round() as u64;
        return if hours > 0 {
            format!("{} {}", plural(whole, "day"), plural(hours, "hour"))
        } else {
            plural(whole, "day")
        };
    }

    let weeks = (days / 7.0).floor() as u64;
    let remaining = (days % 7.0).floor() as u64;
    if remaining > 0 {
        format!("{} {}", plural(weeks, "week"), plural(remaining, "day"))
    } else {
        plural(weeks, "week")
    }
}

/// Short delivery date such as `Thu 15 Oct`, in the date's own time zone.
pub fn format_delivery_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format("%a %-d %b").to_string()
}
