//! Utility functions for formatting values for display.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_currency, format_date, format_percent, progress_bar, truncate_string};
