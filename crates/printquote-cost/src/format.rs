//! Display formatting for costs, weights and print times.

/// Currency with two decimals, e.g. `$12.34`.
pub fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

/// Weight in grams below one kilogram, kilograms above.
pub fn format_weight(grams: f64) -> String {
    if grams < 1000.0 {
        format!("{:.1}g", grams)
    } else {
        format!("{:.2}kg", grams / 1000.0)
    }
}

/// Print time as minutes, hours and minutes, or days and hours.
///
/// Negative or NaN durations display as zero.
pub fn format_print_time(hours: f64) -> String {
    let hours = if hours.is_nan() { 0.0 } else { hours.max(0.0) };

    if hours < 1.0 {
        let minutes = (hours * 60.0).round() as u64;
        if minutes < 60 {
            return format!("{minutes} mins");
        }
        return "1h".to_string();
    }

    if hours < 24.0 {
        let mut whole = hours.floor() as u64;
        let mut minutes = ((hours - hours.floor()) * 60.0).round() as u64;
        if minutes == 60 {
            whole += 1;
            minutes = 0;
        }
        if whole < 24 {
            return if minutes > 0 {
                format!("{whole}h {minutes}m")
            } else {
                format!("{whole}h")
            };
        }
        return "1d".to_string();
    }

    let days = (hours / 24.0).floor() as u64;
    let remaining = (hours % 24.0).floor() as u64;
    if remaining > 0 {
        format!("{days}d {remaining}h")
    } else {
        format!("{days}d")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(12.345_6), "$12.35");
        assert_eq!(format_cost(15.0), "$15.00");
        assert_eq!(format_cost(0.0), "$0.00");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(12.46), "12.5g");
        assert_eq!(format_weight(999.9), "999.9g");
        assert_eq!(format_weight(1250.0), "1.25kg");
    }

    #[test]
    fn test_format_print_time() {
        assert_eq!(format_print_time(0.75), "45 mins");
        assert_eq!(format_print_time(0.0), "0 mins");
        assert_eq!(format_print_time(2.5), "2h 30m");
        assert_eq!(format_print_time(3.0), "3h");
        assert_eq!(format_print_time(27.0), "1d 3h");
        assert_eq!(format_print_time(48.0), "2d");
        assert_eq!(format_print_time(f64::NAN), "0 mins");
    }

    #[test]
    fn test_format_print_time_rounding_carries() {
        assert_eq!(format_print_time(0.9999), "1h");
        assert_eq!(format_print_time(1.9999), "2h");
        assert_eq!(format_print_time(23.9999), "1d");
    }
}
