use anyhow::Result;
use redfish_gateway::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{} v{}", version::NAME, version::VERSION);
    let app_config = config::AppConfig::load()?;

    let store = Arc::new(registry::FileStore::new(&app_config.satellites.store_path));
    let satellite_registry = Arc::new(registry::SatelliteRegistry::new(store));
    let count = satellite_registry.refresh().await;
    tracing::info!(satellites = count, "initial satellite discovery complete");

    let forwarder = forwarder::Forwarder::new(
        app_config.forwarding.request_timeout_secs,
        app_config.forwarding.max_inflight_requests,
    )?;
    let metrics = Arc::new(metrics::MetricStore::new());
    let aggregator = Arc::new(aggregator::RedfishAggregator::new(
        satellite_registry.clone(),
        forwarder,
        metrics,
    ));
    let local = Arc::new(local::LocalTree::new(app_config.local.chassis.clone()));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let discovery_handle = discovery::spawn(
        discovery::DiscoveryDeps {
            registry: satellite_registry,
            shutdown_rx,
        },
        app_config.satellites.discovery_interval_secs,
    );

    let app = routes::app(aggregator, local);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                tokio::signal::ctrl_c().await
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = discovery_handle.await;
        }
    }

    Ok(())
}
