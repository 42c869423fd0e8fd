use crate::data_sync::tracker::{DepthTracker, RefreshReport};
use eyre::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Supervised background refresh of a [`DepthTracker`].
///
/// The first refresh runs as soon as the service starts, then once per configured
/// interval. Each cycle's [`RefreshReport`] is forwarded on the channel returned by
/// [`DepthRefreshService::start`]. Route requests never wait on this loop; they read
/// whatever the tracker's store holds.
pub struct DepthRefreshService {
    tracker: Arc<DepthTracker>,

    report_tx: mpsc::Sender<RefreshReport>,
    report_rx: Option<mpsc::Receiver<RefreshReport>>,

    refresh_task: Option<JoinHandle<()>>,

    // Shutdown coordination
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl DepthRefreshService {
    pub fn new(tracker: Arc<DepthTracker>) -> Self {
        let (report_tx, report_rx) = mpsc::channel(tracker.config().report_buffer_size);
        Self { tracker, report_tx, report_rx: Some(report_rx), refresh_task: None, shutdown_tx: None }
    }

    /// Start the periodic refresh task
    pub async fn start(&mut self) -> Result<mpsc::Receiver<RefreshReport>> {
        let report_rx = self.report_rx.take().ok_or_else(|| eyre::eyre!("DepthRefreshService already started"))?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let tracker = Arc::clone(&self.tracker);
        let report_tx = self.report_tx.clone();
        let interval = tracker.config().refresh_interval();
        info!("Starting DepthRefreshService for {} sources (interval {:?})", tracker.sources().len(), interval);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // A closed shutdown channel (service dropped) stops the loop as well.
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {}
                }

                let report = tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Shutdown requested during refresh, abandoning cycle");
                        break;
                    }
                    report = tracker.refresh() => report,
                };

                if report.live_count() == 0 {
                    error!("Refresh #{} reached no source, serving fallback depth only", report.generation);
                }

                if let Err(e) = report_tx.try_send(report) {
                    match e {
                        mpsc::error::TrySendError::Full(report) => {
                            warn!("Refresh report channel is full, dropping report #{}", report.generation);
                        }
                        mpsc::error::TrySendError::Closed(_) => {
                            debug!("Refresh report receiver dropped, continuing without reports");
                        }
                    }
                }
            }

            info!("Depth refresh task ended");
        });

        self.refresh_task = Some(task);
        Ok(report_rx)
    }

    /// Stop the refresh task and wait for it to finish
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping DepthRefreshService");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }

        if let Some(refresh_task) = self.refresh_task.take() {
            if let Err(e) = refresh_task.await {
                warn!("Refresh task error during shutdown: {}", e);
            }
        }

        info!("DepthRefreshService stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn tracker(&self) -> &Arc<DepthTracker> {
        &self.tracker
    }
}

impl Drop for DepthRefreshService {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("DepthRefreshService dropped while running, shutting down refresh task");
        }
    }
}
