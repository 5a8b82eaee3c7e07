//! Error fingerprinting for deduplication.
//!
//! The fingerprint identifies an error's shape, not its object identity:
//! two errors with the same message and the same first meaningful stack
//! line collapse to one fingerprint. It is a plain derived string used only
//! as a cache key, never persisted.

use crate::report::ErrorReport;

/// Message component used when a report carries an empty message.
const UNKNOWN_MESSAGE: &str = "Unknown";

/// Compute a stable fingerprint for a report.
///
/// Format: `message + ":" + first stable stack frame`. Reports without a
/// stack get an empty frame component, so stackless errors with the same
/// message always collapse together. This function cannot fail.
#[must_use]
pub fn fingerprint(report: &ErrorReport) -> String {
    let message = if report.message().is_empty() {
        UNKNOWN_MESSAGE
    } else {
        report.message()
    };
    let frame = report.stack().map(stable_frame).unwrap_or_default();
    format!("{message}:{frame}")
}

/// First non-empty stack line after the leading message line, with
/// whitespace runs collapsed to single spaces.
fn stable_frame(stack: &str) -> String {
    stack
        .lines()
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(collapse_whitespace)
        .unwrap_or_default()
}

/// Collapse internal whitespace runs to single spaces.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_whitespace = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_whitespace {
                result.push(' ');
            }
            prev_whitespace = true;
        } else {
            result.push(c);
            prev_whitespace = false;
        }
    }

    result.trim().to_owned()
}
