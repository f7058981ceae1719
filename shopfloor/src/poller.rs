//! Periodic completion detection and drift repair

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use shared::{logging::Component, shop_debug, shop_error, shop_info};

use crate::error::ShopFloorResult;
use crate::shop_floor::ShopFloor;

/// Totals accumulated over a poller run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u32,
    pub completed_found: usize,
    pub repairs: usize,
    pub failed_passes: u32,
}

/// Runs a detector scan followed by a reconciliation pass on every tick
/// until told to stop
pub struct Poller {
    shop_floor: ShopFloor,
    period: Duration,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Poller {
    pub fn new(shop_floor: ShopFloor, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Self {
            shop_floor,
            period,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Poller using the configured poll interval
    pub fn from_config(shop_floor: ShopFloor) -> Self {
        let period = shop_floor.context().config.poll_interval;
        Self::new(shop_floor, period)
    }

    pub fn shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Loop until a shutdown signal arrives or `max_ticks` passes have run
    ///
    /// The first pass runs immediately. A failing pass is logged and the
    /// loop carries on.
    pub async fn run(&mut self, max_ticks: Option<u32>) -> ShopFloorResult<PollStats> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = PollStats::default();

        shop_info!(Component::Poller, "⏱️ Polling every {:?}", self.period);

        loop {
            if max_ticks.is_some_and(|max| stats.ticks >= max) {
                shop_debug!(Component::Poller, "Tick budget of {} reached", stats.ticks);
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    stats.ticks += 1;
                    if let Err(e) = self.poll_once(&mut stats).await {
                        stats.failed_passes += 1;
                        shop_error!(Component::Poller, "⚠️ Poll pass failed: {}. Will retry on next interval.", e);
                    }
                },

                Some(_) = self.shutdown_rx.recv() => {
                    shop_debug!(Component::Poller, "🛑 Shutdown requested");
                    break;
                }
            }
        }

        shop_info!(
            Component::Poller,
            "Stopped after {} tick(s): {} completion(s) found, {} repair(s)",
            stats.ticks,
            stats.completed_found,
            stats.repairs
        );
        Ok(stats)
    }

    async fn poll_once(&self, stats: &mut PollStats) -> ShopFloorResult<()> {
        let report = self.shop_floor.scan().await?;
        for finding in report.completed() {
            shop_info!(
                Component::Poller,
                "🏁 {} ({}) reached {}/{} on {}",
                finding.operation_id,
                finding.drawing_number,
                finding.check.total_produced,
                finding.check.target_quantity,
                finding
                    .machine_id
                    .map_or_else(|| "no machine".to_string(), |id| id.to_string())
            );
            stats.completed_found += 1;
        }

        let repairs = self.shop_floor.reconcile().await?;
        stats.repairs += repairs.len();
        Ok(())
    }
}
