// Shared test helpers

use axum::Router;
use axum_test::TestServer;
use redfish_gateway::aggregator::RedfishAggregator;
use redfish_gateway::forwarder::Forwarder;
use redfish_gateway::local::LocalTree;
use redfish_gateway::metrics::MetricStore;
use redfish_gateway::registry::{ConfigStore, PropertyBag, SatelliteRegistry, StoreError};
use redfish_gateway::routes;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// Fixed in-memory satellite configuration source.
pub struct StaticStore(pub Vec<PropertyBag>);

#[async_trait::async_trait]
impl ConfigStore for StaticStore {
    async fn satellite_configs(&self) -> Result<Vec<PropertyBag>, StoreError> {
        Ok(self.0.clone())
    }
}

/// A satellite record pointing at a locally spawned server.
pub fn satellite_record(name: &str, addr: SocketAddr) -> PropertyBag {
    let record = json!({
        "Name": name,
        "Hostname": addr.ip().to_string(),
        "Port": addr.port(),
        "AuthType": "None",
    });
    match record {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Serves `router` on an ephemeral local port, standing in for a satellite
/// BMC.
pub async fn spawn_satellite(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Full gateway wired to the given satellite records and local chassis ids.
pub async fn gateway(records: Vec<PropertyBag>, chassis: &[&str]) -> TestServer {
    let registry = Arc::new(SatelliteRegistry::new(Arc::new(StaticStore(records))));
    registry.refresh().await;
    let forwarder = Forwarder::new(5, 16).unwrap();
    let aggregator = Arc::new(RedfishAggregator::new(
        registry,
        forwarder,
        Arc::new(MetricStore::new()),
    ));
    let local = Arc::new(LocalTree::new(
        chassis.iter().map(|s| s.to_string()).collect(),
    ));
    TestServer::new(routes::app(aggregator, local))
}
