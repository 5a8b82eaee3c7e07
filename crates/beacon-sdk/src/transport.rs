//! Asynchronous delivery to the collector and the shutdown drain.
//!
//! Every delivery is fire-and-forget from the orchestrator's point of view
//! but tracked: while outstanding it is registered in the in-flight set so a
//! concurrent [`Transport::flush`] can observe and await it. Delivery is
//! best-effort; network failures, timeouts, and malformed URLs are all
//! swallowed here so the telemetry path can never raise a secondary error
//! into the host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::oneshot;

use crate::config::ClientConfig;
use crate::error::SdkResult;
use crate::payload::EventPayload;

/// Per-request timeout. Terminates a single delivery only.
pub const REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Default bound on the aggregate wait in [`Transport::flush`].
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 5_000;

/// Collector ingestion path, appended to the collector base URL.
pub const INGEST_PATH: &str = "/api/ingest";

/// Completion handle for one delivery.
///
/// Cloneable and safe to drop: dropping it never cancels the underlying
/// send. It settles when the delivery finishes, whether by response,
/// transport error, or timeout.
pub type Delivery = Shared<BoxFuture<'static, ()>>;

/// An already-settled delivery, returned wherever the pipeline degrades to
/// a no-op.
pub(crate) fn settled() -> Delivery {
    futures::future::ready(()).boxed().shared()
}

/// Sends payloads to the collector and tracks in-flight deliveries.
pub struct Transport {
    http: reqwest::Client,
    collector_url: String,
    api_key: SecretString,
    debug: Arc<AtomicBool>,
    in_flight: Arc<Mutex<HashMap<u64, Delivery>>>,
    next_id: AtomicU64,
}

impl Transport {
    /// Create a transport for the given configuration.
    pub fn new(config: &ClientConfig, debug: Arc<AtomicBool>) -> SdkResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            http,
            collector_url: config.collector_url.clone(),
            api_key: config.api_key.clone(),
            debug,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        })
    }

    /// Start a delivery and return its completion handle.
    ///
    /// The POST runs on a spawned task; the returned [`Delivery`] settles
    /// when it finishes and never errors. Outside a tokio runtime this
    /// degrades to an already-settled no-op.
    pub fn send(&self, payload: EventPayload) -> Delivery {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.debug_log("no async runtime, dropping report");
            return settled();
        };

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let delivery: Delivery = async move {
            // The sender is either used or dropped; both settle us.
            let _ = done_rx.await;
        }
        .boxed()
        .shared();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.insert(id, delivery.clone());
        }

        let http = self.http.clone();
        let url = format!("{}{INGEST_PATH}", self.collector_url);
        let api_key = self.api_key.clone();
        let debug = Arc::clone(&self.debug);
        let in_flight = Arc::clone(&self.in_flight);

        handle.spawn(async move {
            let result = http
                .post(&url)
                .bearer_auth(api_key.expose_secret())
                .json(&payload)
                .send()
                .await;

            if debug.load(Ordering::Relaxed) {
                match result {
                    Ok(response) => {
                        tracing::debug!(status = %response.status(), "report delivered");
                    }
                    Err(error) => {
                        tracing::debug!(%error, "report delivery failed");
                    }
                }
            }

            // Deregister before settling so observers of a settled delivery
            // see a consistent in-flight set.
            if let Ok(mut in_flight) = in_flight.lock() {
                in_flight.remove(&id);
            }
            let _ = done_tx.send(());
        });

        delivery
    }

    /// Wait for in-flight deliveries to settle, bounded by `timeout`.
    ///
    /// Returns immediately when nothing is in flight. Otherwise races the
    /// snapshot of currently tracked deliveries against the timer and
    /// returns as soon as either finishes; deliveries started after the
    /// snapshot are not waited on.
    pub async fn flush(&self, timeout: Duration) {
        let pending: Vec<Delivery> = match self.in_flight.lock() {
            Ok(in_flight) => in_flight.values().cloned().collect(),
            Err(_) => return,
        };
        if pending.is_empty() {
            return;
        }

        tokio::select! {
            _ = futures::future::join_all(pending) => {}
            () = tokio::time::sleep(timeout) => {
                self.debug_log("flush timed out with deliveries still in flight");
            }
        }
    }

    /// Number of deliveries currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|in_flight| in_flight.len()).unwrap_or(0)
    }

    fn debug_log(&self, message: &str) {
        if self.debug.load(Ordering::Relaxed) {
            tracing::debug!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use std::time::Instant;

    fn transport() -> Transport {
        let options = Options::new("test-key").with_collector_url("http://127.0.0.1:9");
        let config = ClientConfig::resolve(&options).unwrap();
        Transport::new(&config, Arc::new(AtomicBool::new(false))).unwrap()
    }

    #[tokio::test]
    async fn settled_deliveries_complete_immediately() {
        settled().await;
    }

    #[tokio::test]
    async fn flush_with_nothing_in_flight_returns_immediately() {
        let transport = transport();
        let start = Instant::now();
        transport.flush(Duration::from_secs(5)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn failed_delivery_settles_and_deregisters() {
        // Port 9 (discard) refuses connections; the send must still settle.
        let transport = transport();
        let delivery = transport.send(EventPayload::build(
            &crate::report::ErrorReport::new("boom"),
            crate::config::Environment::Preview,
            None,
            crate::report::Severity::Error,
        ));
        delivery.await;
        assert_eq!(transport.in_flight_count(), 0);
    }
}
