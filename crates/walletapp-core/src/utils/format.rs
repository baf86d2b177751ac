use chrono::NaiveDate;

use crate::models::Amount;

/// Currency suffix used throughout the app
pub const CURRENCY: &str = "RWF";

/// Format an amount with two decimals and the currency suffix
pub fn format_currency(amount: Amount) -> String {
    format!("{} {}", amount, CURRENCY)
}

/// Whole-number percentage, as shown on budget cards
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}

/// Format a date as e.g. "May 1, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Fixed-width text bar for a percentage; values past 100 fill the bar
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Amount::new(1234.5)), "1234.50 RWF");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(25.0), "25%");
        assert_eq!(format_percent(33.333), "33%");
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(format_date(d), "May 1, 2024");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(25.0, 8), "[##------]");
        assert_eq!(progress_bar(150.0, 4), "[####]");
        assert_eq!(progress_bar(-5.0, 4), "[----]");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
