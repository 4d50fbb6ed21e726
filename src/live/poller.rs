//! Polling data source
//!
//! A feed task requests the full sensor list once on start and then every
//! period, delivering each successful result through a watch channel. Failed
//! ticks are logged and skipped; the last delivered list stays available.
//! Dropping the [`FeedHandle`] stops the feed. A request already in flight
//! still completes but its result is thrown away.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, SensorSnapshot};
use crate::errors::ApiError;

/// Immutable list of sensors delivered by one poll
pub type Snapshot = Arc<[SensorSnapshot]>;

/// Anything that can produce the current sensor list
#[async_trait]
pub trait SensorSource: Send + Sync + 'static {
    async fn fetch_sensors(&self) -> Result<Vec<SensorSnapshot>, ApiError>;
}

#[async_trait]
impl SensorSource for ApiClient {
    async fn fetch_sensors(&self) -> Result<Vec<SensorSnapshot>, ApiError> {
        ApiClient::fetch_sensors(self).await
    }
}

/// Consumer side of a running feed
pub struct FeedHandle {
    name: String,
    rx: watch::Receiver<Option<Snapshot>>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Start polling `source` every `period`.
    ///
    /// The feed also stops when `shutdown` is cancelled.
    pub fn spawn<S: SensorSource>(
        name: impl Into<String>,
        source: Arc<S>,
        period: Duration,
        shutdown: &CancellationToken,
    ) -> Self {
        let name = name.into();
        let cancel = shutdown.child_token();
        let (tx, rx) = watch::channel(None);

        tokio::spawn(poll_loop(name.clone(), source, period, tx, cancel.clone()));

        Self { name, rx, cancel }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next delivered snapshot.
    ///
    /// Returns `None` once the feed has stopped.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    /// Last successfully delivered snapshot, if any
    pub fn latest(&self) -> Option<Snapshot> {
        self.rx.borrow().clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop<S: SensorSource>(
    name: String,
    source: Arc<S>,
    period: Duration,
    tx: watch::Sender<Option<Snapshot>>,
    cancel: CancellationToken,
) {
    info!("Feed '{}' polling every {:?}", name, period);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = source.fetch_sensors().await;
        if cancel.is_cancelled() {
            debug!("Feed '{}' stopped, discarding in-flight result", name);
            break;
        }

        match result {
            Ok(sensors) => {
                debug!("Feed '{}' received {} sensors", name, sensors.len());
                tx.send_replace(Some(sensors.into()));
            }
            Err(e) => {
                warn!("Feed '{}' poll failed, keeping previous data: {}", name, e);
            }
        }
    }

    info!("Feed '{}' stopped", name);
}
