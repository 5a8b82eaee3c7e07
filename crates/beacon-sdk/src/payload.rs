//! Wire payload types.
//!
//! A payload is a point-in-time snapshot of a report, immutable after
//! construction and owned solely by the in-flight delivery that carries it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Environment;
use crate::report::{ErrorReport, Severity};

/// Message used when a report carries an empty message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Type tag used when a report carries an empty type.
pub const DEFAULT_ERROR_TYPE: &str = "Error";

/// Sentinel stack text for reports without a stack trace.
pub const NO_STACK_SENTINEL: &str = "No stack trace available";

/// The JSON body POSTed to the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// The error being reported.
    pub error: ErrorBody,
    /// Context the error occurred in.
    pub context: EventContext,
}

/// Error fields of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    pub message: String,
    /// Error type tag.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Stack trace text.
    pub stack: String,
    /// Report severity.
    pub severity: Severity,
}

/// Context fields of the payload: the environment tag plus caller-supplied
/// extra context passed through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    /// Deployment environment.
    pub environment: Environment,
    /// Opaque extra context merged alongside the environment.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl EventPayload {
    /// Build a payload snapshot from a report.
    ///
    /// Missing report fields degrade to safe defaults. A non-object extra
    /// value is nested under an `"extra"` key rather than dropped.
    #[must_use]
    pub fn build(
        report: &ErrorReport,
        environment: Environment,
        extra: Option<Value>,
        severity: Severity,
    ) -> Self {
        let message = if report.message().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_owned()
        } else {
            report.message().to_owned()
        };
        let error_type = if report.error_type().is_empty() {
            DEFAULT_ERROR_TYPE.to_owned()
        } else {
            report.error_type().to_owned()
        };
        let stack = report
            .stack()
            .map_or_else(|| NO_STACK_SENTINEL.to_owned(), str::to_owned);

        let extra = match extra {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => serde_json::Map::new(),
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("extra".to_owned(), other);
                map
            }
        };

        Self {
            error: ErrorBody {
                message,
                error_type,
                stack,
                severity,
            },
            context: EventContext { environment, extra },
        }
    }
}
