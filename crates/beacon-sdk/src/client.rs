//! The capture orchestrator.
//!
//! Ties recursive-capture protection, fingerprinting, deduplication, rate
//! limiting, and payload construction together, then hands off to the
//! transport. The whole decision path is synchronous, so dedup and
//! rate-limiter state is effectively single-writer: no other capture can
//! interleave mid-decision for a single report.
//!
//! The entire path is fail-silent by contract: the worst observable symptom
//! of any internal fault is a dropped report, never a host-visible error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::config::{ClientConfig, Environment, Options};
use crate::dedup::DedupCache;
use crate::error::SdkResult;
use crate::fingerprint::fingerprint;
use crate::payload::EventPayload;
use crate::rate_limit::RateWindow;
use crate::report::{ErrorReport, Severity};
use crate::transport::{settled, Delivery, Transport, DEFAULT_FLUSH_TIMEOUT_MS};

/// Status assumed for an error with no explicit status and no 5xx response.
const DEFAULT_HTTP_STATUS: u16 = 500;

/// An error-capture pipeline bound to one collector.
///
/// The dedup cache and rate window are shared across everything captured
/// through this client, not namespaced by caller: multiple logical sources
/// reporting through one client will cross-throttle each other.
pub struct Client {
    config: ClientConfig,
    debug: Arc<AtomicBool>,
    dedup: Mutex<DedupCache>,
    rate: Mutex<RateWindow>,
    transport: Transport,
}

impl Client {
    /// Create a client from options.
    ///
    /// Fails when the API key is missing or the HTTP client cannot be
    /// built. The global [`crate::init`] swallows this error; explicit
    /// instances (tests, multi-tenant hosts) get to see it.
    pub fn new(options: Options) -> SdkResult<Self> {
        let config = ClientConfig::resolve(&options)?;
        let debug = Arc::new(AtomicBool::new(options.debug));
        let transport = Transport::new(&config, Arc::clone(&debug))?;

        Ok(Self {
            config,
            debug,
            dedup: Mutex::new(DedupCache::new()),
            rate: Mutex::new(RateWindow::new()),
            transport,
        })
    }

    /// Toggle the SDK's own debug logging.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    /// The resolved environment tag.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Capture a report and start its delivery.
    ///
    /// Returns a completion handle that is safe to drop (the delivery
    /// proceeds regardless) or to await. Suppressed captures - recursive
    /// re-entry, duplicates inside the dedup window, rate-limited storms -
    /// return an already-settled handle. Never panics and never errors.
    pub fn capture(
        &self,
        report: &ErrorReport,
        extra: Option<Value>,
        severity: Option<Severity>,
    ) -> Delivery {
        if report.mark_captured() {
            self.debug_log("recursive capture prevented");
            return settled();
        }

        let fp = fingerprint(report);
        let now_ms = epoch_millis();

        {
            let Ok(mut dedup) = self.dedup.lock() else {
                return settled();
            };
            if dedup.should_suppress(&fp, now_ms) {
                self.debug_log("duplicate report suppressed");
                return settled();
            }
        }

        {
            let Ok(mut rate) = self.rate.lock() else {
                return settled();
            };
            if rate.should_limit(now_ms) {
                self.debug_log("rate limit exceeded, report dropped");
                return settled();
            }
        }

        let severity = severity.unwrap_or_default();
        let payload = EventPayload::build(report, self.config.environment, extra, severity);
        if self.debug.load(Ordering::Relaxed) {
            tracing::debug!(
                message = payload.error.message,
                severity = severity.as_str(),
                "sending report"
            );
        }
        self.transport.send(payload)
    }

    /// Run a fallible closure, capturing any error before returning it
    /// unchanged.
    ///
    /// The capture is fire-and-forget; call [`Client::flush`] to wait for
    /// the delivery.
    pub fn wrap<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        match f() {
            Ok(value) => Ok(value),
            Err(error) => {
                let report = ErrorReport::from_error(&error);
                drop(self.capture(&report, None, None));
                Err(error)
            }
        }
    }

    /// Await a fallible future, capturing any error before returning it
    /// unchanged.
    pub async fn wrap_future<T, E, Fut>(&self, fut: Fut) -> Result<T, E>
    where
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        match fut.await {
            Ok(value) => Ok(value),
            Err(error) => {
                let report = ErrorReport::from_error(&error);
                drop(self.capture(&report, None, None));
                Err(error)
            }
        }
    }

    /// Capture a request-handling failure, gated on the inferred status.
    ///
    /// The status is taken first from an explicit status on the error, then
    /// from a response status that is already 5xx, and defaults to 500.
    /// Client errors (inferred status below 500) produce no capture. The
    /// request method, path, and status are attached as extra context.
    pub fn capture_http_error(
        &self,
        report: &ErrorReport,
        error_status: Option<u16>,
        response_status: Option<u16>,
        method: &str,
        path: &str,
    ) -> Delivery {
        let status = inferred_status(error_status, response_status);
        if status < 500 {
            return settled();
        }

        let extra = serde_json::json!({
            "source": "http",
            "method": method,
            "path": path,
            "status_code": status,
        });
        self.capture(report, Some(extra), None)
    }

    /// Drain in-flight deliveries, waiting at most `timeout_ms`
    /// (default 5000).
    pub async fn flush(&self, timeout_ms: Option<u64>) {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_FLUSH_TIMEOUT_MS));
        self.transport.flush(timeout).await;
    }

    /// Number of deliveries currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.transport.in_flight_count()
    }

    fn debug_log(&self, message: &str) {
        if self.debug.load(Ordering::Relaxed) {
            tracing::debug!("{message}");
        }
    }
}

/// Infer the response status for gating.
fn inferred_status(error_status: Option<u16>, response_status: Option<u16>) -> u16 {
    error_status
        .or_else(|| response_status.filter(|&status| status >= 500))
        .unwrap_or(DEFAULT_HTTP_STATUS)
}

/// Milliseconds since the Unix epoch.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
