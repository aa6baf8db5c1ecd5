// Background discovery worker: re-polls the configuration store on a timer
// so the registry tracks satellites added or removed at runtime.

use crate::registry::SatelliteRegistry;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, interval};

pub struct DiscoveryDeps {
    pub registry: Arc<SatelliteRegistry>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub fn spawn(deps: DiscoveryDeps, poll_interval_secs: u64) -> tokio::task::JoinHandle<()> {
    let DiscoveryDeps {
        registry,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(poll_interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let count = registry.refresh().await;
                    tracing::debug!(satellites = count, operation = "discover", "registry refreshed");
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("discovery worker shutting down");
                    break;
                }
            }
        }
    })
}
