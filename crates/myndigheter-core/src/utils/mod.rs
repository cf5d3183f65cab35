//! Utility functions for string formatting and comparison.

pub mod format;

pub use format::{cmp_swedish, contains_ignore_case, format_number, format_optional, truncate_string};
