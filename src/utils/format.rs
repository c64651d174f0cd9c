//! Formatting utilities for file sizes, dates, and other display values.
//!
//! The server exchanges dates as UTC strings in the form
//! `YYYY-MM-DD HH:MM:SS.mmm`, which order lexicographically.

/// Format file size for display (e.g., "1.2 KB", "3.4 MB").
pub fn format_size(size: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    let Some(bytes) = size else {
        return "-".to_string();
    };
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Format Unix timestamp as ISO date (YYYY-MM-DD).
///
/// Properly calculates year/month/day accounting for leap years.
pub fn format_date_iso(timestamp: u64) -> String {
    let days = timestamp / 86400;
    let mut year = 1970i64;
    let mut remaining_days = days as i64;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let days_in_months: [i64; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    for days_in_month in days_in_months.iter() {
        if remaining_days < *days_in_month {
            break;
        }
        remaining_days -= days_in_month;
        month += 1;
    }

    let day = remaining_days + 1;
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Check if a year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Server-style timestamp (`YYYY-MM-DD HH:MM:SS.mmm`) of a Unix time in ms.
pub fn format_timestamp(millis: u64) -> String {
    let seconds = millis / 1000;
    let time = seconds % 86400;
    format!(
        "{} {:02}:{:02}:{:02}.{:03}",
        format_date_iso(seconds),
        time / 3600,
        (time % 3600) / 60,
        time % 60,
        millis % 1000
    )
}

/// Current UTC time in the server's timestamp format.
pub fn current_timestamp() -> String {
    format_timestamp(now_millis())
}

#[cfg(target_arch = "wasm32")]
fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Shorten a server timestamp to minutes (`2024-03-01 10:15`).
pub fn format_changed(changed: Option<&str>) -> String {
    match changed {
        None => String::new(),
        Some(value) => value.get(..16).unwrap_or(value).replace('T', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "-");
        assert_eq!(format_size(Some(500)), "500 B");
        assert_eq!(format_size(Some(1536)), "1.5 KB");
        assert_eq!(format_size(Some(5 * 1024 * 1024)), "5.0 MB");
        assert_eq!(format_size(Some(u64::MAX)), "16777216.0 TB");
    }

    #[test]
    fn test_format_date_iso() {
        // Unix epoch
        assert_eq!(format_date_iso(0), "1970-01-01");
        // 2024-01-01 00:00:00 UTC = 1704067200
        assert_eq!(format_date_iso(1704067200), "2024-01-01");
        // Leap day
        assert_eq!(format_date_iso(1709164800), "2024-02-29");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000");
        assert_eq!(
            format_timestamp(1_704_067_200_000 + 3_723_045),
            "2024-01-01 01:02:03.045"
        );
        assert!(current_timestamp().as_str() > "2024-01-01");
    }

    #[test]
    fn test_format_changed() {
        assert_eq!(format_changed(None), "");
        assert_eq!(
            format_changed(Some("2024-03-01 10:15:42.123")),
            "2024-03-01 10:15"
        );
        assert_eq!(format_changed(Some("2024-03-01")), "2024-03-01");
    }
}
