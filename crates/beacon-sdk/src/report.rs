//! Error reports and severity levels.
//!
//! An [`ErrorReport`] is a point-in-time record of a host error: message,
//! type tag, optional stack text, and a one-shot "already captured" marker.
//! The marker lives on the report rather than on a host-owned error value,
//! so the pipeline never mutates the host's data.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Severity attached to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A failure worth paging over.
    #[default]
    Error,
    /// Degraded but functioning.
    Warning,
    /// Informational report.
    Info,
}

impl Severity {
    /// String form as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A host error snapshot with recursive-capture protection.
///
/// The captured marker is set on the first capture attempt and never
/// cleared, so re-entering the same report into the pipeline (for example
/// from a wrapping layer that re-raises after reporting) is a silent no-op.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
    error_type: String,
    stack: Option<String>,
    captured: AtomicBool,
}

impl ErrorReport {
    /// Create a report from a plain message, typed as a generic `Error`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: "Error".to_owned(),
            stack: None,
            captured: AtomicBool::new(false),
        }
    }

    /// Create a report from any error value.
    ///
    /// The type tag is the error's unqualified type name.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self {
            message: error.to_string(),
            error_type: short_type_name::<E>().to_owned(),
            stack: None,
            captured: AtomicBool::new(false),
        }
    }

    /// Attach stack trace text, for example a rendered
    /// `std::backtrace::Backtrace`.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error type tag.
    #[must_use]
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// The stack trace text, if any.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Whether this report has already entered the capture pipeline.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured.load(Ordering::Relaxed)
    }

    /// One-shot test-and-set of the captured marker.
    ///
    /// Returns the previous value: `true` means the report was already
    /// captured and must not be reported again.
    pub(crate) fn mark_captured(&self) -> bool {
        self.captured.swap(true, Ordering::Relaxed)
    }
}

/// Last path segment of a type name, e.g. `std::io::Error` -> `Error`.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_takes_message_and_short_type() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let report = ErrorReport::from_error(&err);
        assert_eq!(report.message(), "disk on fire");
        assert_eq!(report.error_type(), "Error");
    }

    #[test]
    fn captured_marker_is_one_shot() {
        let report = ErrorReport::new("boom");
        assert!(!report.is_captured());
        assert!(!report.mark_captured());
        assert!(report.mark_captured());
        assert!(report.is_captured());
    }

    #[test]
    fn with_stack_attaches_text() {
        let report = ErrorReport::new("boom").with_stack("Error: boom\n    at main");
        assert_eq!(report.stack(), Some("Error: boom\n    at main"));
    }

    #[test]
    fn severity_wire_names() {
        assert_eq!(Severity::Error.as_str(), "error");
        assert_eq!(Severity::Warning.as_str(), "warning");
        assert_eq!(Severity::Info.as_str(), "info");
        assert_eq!(Severity::default(), Severity::Error);
    }
}
