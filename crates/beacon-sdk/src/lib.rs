//! Beacon SDK - in-process error telemetry for Rust hosts.
//!
//! This crate embeds an error-capture pipeline inside a host application:
//! it intercepts runtime failures, decides whether each is worth reporting,
//! and delivers a bounded, non-blocking stream of reports to a remote
//! collector - without ever crashing, blocking, or meaningfully slowing the
//! host.
//!
//! ## Architecture
//!
//! ```text
//! ErrorReport -> recursive guard -> fingerprint -> dedup -> rate limit
//!                                                              |
//!                                          payload -> transport (tracked)
//!                                                              |
//!                                flush: race in-flight set vs. timer
//! ```
//!
//! Every stage is fail-silent: the worst observable symptom of any internal
//! fault is a dropped report.
//!
//! ## Example
//!
//! ```no_run
//! use beacon_sdk::{ErrorReport, Options};
//!
//! #[tokio::main]
//! async fn main() {
//!     beacon_sdk::init(Options::new("my-api-key").with_environment("production"));
//!
//!     let report = ErrorReport::new("payment provider unreachable");
//!     beacon_sdk::capture(&report, None, None);
//!
//!     // Before exit, give in-flight reports a bounded chance to land.
//!     beacon_sdk::flush(None).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod payload;
pub mod rate_limit;
pub mod report;
pub mod transport;

use std::sync::OnceLock;

use serde_json::Value;

pub use client::Client;
pub use config::{Environment, Options, DEFAULT_COLLECTOR_URL};
pub use error::{SdkError, SdkResult};
pub use fingerprint::fingerprint;
pub use payload::EventPayload;
pub use report::{ErrorReport, Severity};
pub use transport::{Delivery, DEFAULT_FLUSH_TIMEOUT_MS, INGEST_PATH};

/// The process-wide client. Initialised at most once, never torn down.
static GLOBAL: OnceLock<Client> = OnceLock::new();

/// Initialise the process-wide client.
///
/// One-shot: calls after the first successful initialisation are no-ops,
/// and initialisation is silently refused without an API key. This never
/// fails or panics; a host must be able to ship with the SDK misconfigured.
pub fn init(options: Options) {
    let Ok(client) = Client::new(options) else {
        return;
    };
    let _ = GLOBAL.set(client);
}

/// Capture a report through the process-wide client.
///
/// A no-op returning an already-settled [`Delivery`] when [`init`] has not
/// succeeded. The handle is safe to drop; awaiting it waits for the
/// delivery to settle.
pub fn capture(report: &ErrorReport, extra: Option<Value>, severity: Option<Severity>) -> Delivery {
    match GLOBAL.get() {
        Some(client) => client.capture(report, extra, severity),
        None => transport::settled(),
    }
}

/// Drain in-flight deliveries before exit, waiting at most `timeout_ms`
/// (default 5000).
///
/// Returns immediately when nothing is in flight; otherwise returns as soon
/// as the snapshot of in-flight deliveries settles or the timer fires,
/// whichever is first.
pub async fn flush(timeout_ms: Option<u64>) {
    if let Some(client) = GLOBAL.get() {
        client.flush(timeout_ms).await;
    }
}

/// Toggle the SDK's own debug logging on the process-wide client.
pub fn set_debug(enabled: bool) {
    if let Some(client) = GLOBAL.get() {
        client.set_debug(enabled);
    }
}

/// Run a fallible closure, capturing any error before returning it
/// unchanged. Runs the closure directly when [`init`] has not succeeded.
pub fn wrap<T, E, F>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    match GLOBAL.get() {
        Some(client) => client.wrap(f),
        None => f(),
    }
}

/// Await a fallible future, capturing any error before returning it
/// unchanged. Awaits the future directly when [`init`] has not succeeded.
pub async fn wrap_future<T, E, Fut>(fut: Fut) -> Result<T, E>
where
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::error::Error,
{
    match GLOBAL.get() {
        Some(client) => client.wrap_future(fut).await,
        None => fut.await,
    }
}
