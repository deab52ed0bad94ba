//! Background poller: fetch, normalize and publish on a fixed interval.
//!
//! The poller owns one tokio task. Each cycle fetches the portfolio, runs the
//! normalizer and overwrites the hand-off slot. A failed cycle is logged and
//! skipped; the slot keeps whatever was last published. Stopping is
//! cooperative: the flag is checked at the top of each cycle, so an in-flight
//! fetch and the following sleep always run to completion.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::api::{PortfolioClient, PortfolioSource};
use crate::error::{PollerError, Result};
use crate::models::{Config, RawResponse, Snapshot};
use crate::normalizer::normalize;
use crate::slot::SnapshotSlot;

/// Lifecycle of a poller. A poller runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Cycle counters. `cycles` counts cycles started; `published` and `failed` count finished ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub cycles: u64,
    pub published: u64,
    pub failed: u64,
}

#[derive(Debug)]
struct Shared {
    stop_requested: AtomicBool,
    state: Mutex<PollerState>,
    cycles: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(PollerState::Created),
            cycles: AtomicU64::new(0),
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    fn state(&self) -> PollerState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: PollerState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

/// Periodically fetches the portfolio and publishes the latest [`Snapshot`].
pub struct PortfolioPoller<S: PortfolioSource + 'static> {
    source: Option<S>,
    interval: Duration,
    slot: SnapshotSlot,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl PortfolioPoller<PortfolioClient> {
    /// Build a poller that talks to the configured HTTP endpoint.
    pub fn from_config(config: &Config, slot: SnapshotSlot) -> Result<Self> {
        let client = PortfolioClient::new(config)?;
        Self::new(client, config.interval(), slot)
    }
}

impl<S: PortfolioSource + 'static> PortfolioPoller<S> {
    /// Create a poller. Fails when `interval` is zero.
    pub fn new(source: S, interval: Duration, slot: SnapshotSlot) -> Result<Self> {
        if interval.is_zero() {
            return Err(PollerError::Config("poll interval must be positive".to_string()));
        }

        Ok(Self {
            source: Some(source),
            interval,
            slot,
            shared: Arc::new(Shared::new()),
            handle: None,
        })
    }

    pub fn state(&self) -> PollerState {
        self.shared.state()
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            cycles: self.shared.cycles.load(Ordering::SeqCst),
            published: self.shared.published.load(Ordering::SeqCst),
            failed: self.shared.failed.load(Ordering::SeqCst),
        }
    }

    /// Spawn the polling task. The first fetch happens immediately.
    ///
    /// Must be called from within a tokio runtime; otherwise `Runtime` is
    /// returned and the poller stays `Created`. Returns `AlreadyStarted` if the
    /// poller was started or stopped before.
    pub fn start(&mut self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PollerError::Runtime(e.to_string()))?;

        {
            let mut state = self.shared.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if *state != PollerState::Created {
                return Err(PollerError::AlreadyStarted);
            }
            *state = PollerState::Running;
        }

        let source = self.source.take().ok_or(PollerError::AlreadyStarted)?;
        let shared = Arc::clone(&self.shared);
        let slot = self.slot.clone();
        let interval = self.interval;

        info!("🚀 Portfolio listener started (interval {:?})", interval);
        self.handle = Some(runtime.spawn(run_loop(source, interval, slot, shared)));
        Ok(())
    }

    /// Ask the polling task to exit at its next cycle boundary. Idempotent.
    pub fn stop(&self) {
        if self.shared.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut state = self.shared.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match *state {
            PollerState::Running => *state = PollerState::Stopping,
            // Never started: nothing to wait for, and start() is now refused.
            PollerState::Created => *state = PollerState::Stopped,
            PollerState::Stopping | PollerState::Stopped => {}
        }
        debug!("Stop requested, state now {:?}", *state);
    }

    /// Wait for the polling task to finish. Returns immediately if it was never started.
    pub async fn join(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let result = handle.await;
        self.shared.set_state(PollerState::Stopped);
        result.map_err(|e| PollerError::Task(e.to_string()))
    }

    /// `stop()` followed by `join()`.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stop();
        self.join().await
    }
}

impl<S: PortfolioSource + 'static> Drop for PortfolioPoller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop<S: PortfolioSource>(
    source: S,
    interval: Duration,
    slot: SnapshotSlot,
    shared: Arc<Shared>,
) {
    while !shared.stop_requested.load(Ordering::SeqCst) {
        shared.cycles.fetch_add(1, Ordering::SeqCst);

        match fetch_and_publish(&source, &slot).await {
            Ok(snapshot_pv) => {
                shared.published.fetch_add(1, Ordering::SeqCst);
                debug!("Portfolio updated (PV={:?})", snapshot_pv);
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::SeqCst);
                error!("❌ Error fetching portfolio: {}", e);
            }
        }

        tokio::time::sleep(interval).await;
    }

    shared.set_state(PollerState::Stopped);
    info!("Portfolio listener stopped gracefully.");
}

/// One cycle: fetch, normalize, overwrite the slot. Returns the published PV.
async fn fetch_and_publish<S: PortfolioSource>(source: &S, slot: &SnapshotSlot) -> Result<Option<f64>> {
    let raw = source.fetch_portfolio().await?;
    let snapshot = normalize_guarded(&raw)?;
    let pv = snapshot.portfolio_value();

    if slot.publish(snapshot).is_some() {
        debug!("Unconsumed snapshot replaced by a newer one");
    }
    Ok(pv)
}

/// The normalizer does not fail; a panic inside it costs one cycle, not the task.
fn normalize_guarded(raw: &RawResponse) -> Result<Snapshot> {
    std::panic::catch_unwind(AssertUnwindSafe(|| normalize(raw))).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PollerError::Normalize(reason)
    })
}
