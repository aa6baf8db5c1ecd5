// Request orchestration: classify, serve locally, fan out to satellites,
// and merge the answers as they arrive.

use crate::classify::{self, AggregationClass};
use crate::forwarder::{ForwardedRequest, Forwarder};
use crate::local::LocalTree;
use crate::merge::{self, AggregateResponse, MergeFn};
use crate::messages;
use crate::metrics::{MetricStore, RawMetric};
use crate::registry::{SatelliteDescriptor, SatelliteRegistry};
use axum::http::{Method, request::Parts};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::sync::Arc;
use tokio::time::Instant;

pub struct RedfishAggregator {
    registry: Arc<SatelliteRegistry>,
    forwarder: Forwarder,
    metrics: Arc<MetricStore>,
}

impl RedfishAggregator {
    pub fn new(
        registry: Arc<SatelliteRegistry>,
        forwarder: Forwarder,
        metrics: Arc<MetricStore>,
    ) -> Self {
        Self {
            registry,
            forwarder,
            metrics,
        }
    }

    pub fn metrics(&self) -> &MetricStore {
        &self.metrics
    }

    /// Entry point for every request under the service root.
    pub async fn handle(&self, parts: &Parts, body: Bytes, local: &LocalTree) -> AggregateResponse {
        let satellites = self.registry.snapshot();
        let class = classify::classify(parts.uri.path(), &satellites);
        tracing::debug!(path = %parts.uri.path(), class = ?class, "classified request");

        match class {
            AggregationClass::NotAggregated => local.handle(parts),
            AggregationClass::Resource { prefix, target } => {
                let Some(satellite) = satellites.get(&prefix) else {
                    // The registry changed between classify and lookup.
                    let mut agg = AggregateResponse::new();
                    messages::internal_error(&mut agg);
                    return agg;
                };
                let class = AggregationClass::Resource {
                    prefix: prefix.clone(),
                    target,
                };
                let request = ForwardedRequest::new(parts, body, &class);
                let response = self.dispatch(satellite, &request).await;
                let mut agg = AggregateResponse::new();
                merge::process_response(&prefix, &mut agg, &response, &self.metrics);
                agg
            }
            AggregationClass::Collection => {
                self.fan_out(
                    parts,
                    body,
                    local,
                    AggregationClass::Collection,
                    &satellites,
                    merge::process_collection_response,
                )
                .await
            }
            AggregationClass::ContainsSubordinate => {
                self.fan_out(
                    parts,
                    body,
                    local,
                    AggregationClass::ContainsSubordinate,
                    &satellites,
                    merge::process_contains_subordinate_response,
                )
                .await
            }
        }
    }

    /// Collection and subordinate-container handling: the local answer seeds
    /// the aggregate, every satellite contributes in arrival order.  Writes
    /// only ever target a single resource, so non-GET requests stay local.
    async fn fan_out(
        &self,
        parts: &Parts,
        body: Bytes,
        local: &LocalTree,
        class: AggregationClass,
        satellites: &crate::registry::SatelliteMap,
        merge_fn: MergeFn,
    ) -> AggregateResponse {
        let mut agg = local.handle(parts);
        if parts.method != Method::GET || satellites.is_empty() {
            return agg;
        }

        let request = ForwardedRequest::new(parts, body, &class);
        let request = &request;
        let mut pending: FuturesUnordered<_> = satellites
            .values()
            .map(|satellite| async move { (satellite, self.dispatch(satellite, request).await) })
            .collect();
        while let Some((satellite, response)) = pending.next().await {
            merge_fn(&satellite.prefix, &mut agg, &response, &self.metrics);
        }
        agg
    }

    /// Sends one request and charges the round-trip latency to the
    /// satellite's metrics, synthetic responses included.
    async fn dispatch(
        &self,
        satellite: &SatelliteDescriptor,
        request: &ForwardedRequest,
    ) -> crate::forwarder::SatelliteResponse {
        let start = Instant::now();
        let response = self.forwarder.send(satellite, request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.metrics.update(&satellite.prefix, |m| {
            m.increment(RawMetric::LatencyMs, elapsed_ms);
        });
        response
    }
}
