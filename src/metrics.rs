// Per-entity request counters, updated while merging satellite responses and
// read by observability tooling.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Counters updated as raw events arrive.  One to one with the private state
/// of [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawMetric {
    LatencyMs,
    /// The outbound connection pool was saturated (synthetic 429).
    RequestsDropped,
    /// The connect/send/receive flow failed (synthetic 502).
    RequestsFailed,
    RequestsSucceeded,
    Responses1xx,
    Responses2xx,
    Responses3xx,
    Responses4xx,
    Responses5xx,
}

/// Values actually served by the store; derived on read instead of being
/// kept up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedMetric {
    AverageLatencyMs,
    RequestsDropped,
    RequestsFailed,
    RequestsSucceeded,
    Responses1xx,
    Responses2xx,
    Responses3xx,
    Responses4xx,
    Responses5xx,
    ResponsesTotal,
}

/// Raw counters for one entity (a satellite prefix or another caller-chosen
/// label).
#[derive(Debug, Default, Clone)]
pub struct Metrics {
    raw: HashMap<RawMetric, u64>,
}

impl Metrics {
    pub fn increment(&mut self, metric: RawMetric, amount: u64) {
        *self.raw.entry(metric).or_insert(0) += amount;
    }

    /// Buckets a response code and classifies the dispatch outcome.  429 and
    /// 502 are the synthetic "no real response" codes produced locally.
    pub fn record_response_code(&mut self, code: u16) {
        match code {
            100..=199 => self.increment(RawMetric::Responses1xx, 1),
            200..=299 => self.increment(RawMetric::Responses2xx, 1),
            300..=399 => self.increment(RawMetric::Responses3xx, 1),
            400..=499 => self.increment(RawMetric::Responses4xx, 1),
            500..=599 => self.increment(RawMetric::Responses5xx, 1),
            _ => {}
        }
        match code {
            429 => self.increment(RawMetric::RequestsDropped, 1),
            502 => self.increment(RawMetric::RequestsFailed, 1),
            _ => self.increment(RawMetric::RequestsSucceeded, 1),
        }
    }

    fn raw(&self, metric: RawMetric) -> u64 {
        self.raw.get(&metric).copied().unwrap_or(0)
    }

    fn responses_total(&self) -> u64 {
        self.raw(RawMetric::RequestsSucceeded)
            + self.raw(RawMetric::RequestsDropped)
            + self.raw(RawMetric::RequestsFailed)
    }

    pub fn get(&self, metric: DerivedMetric) -> u64 {
        match metric {
            DerivedMetric::AverageLatencyMs => {
                let total = self.responses_total();
                if total > 0 {
                    self.raw(RawMetric::LatencyMs) / total
                } else {
                    0
                }
            }
            DerivedMetric::RequestsDropped => self.raw(RawMetric::RequestsDropped),
            DerivedMetric::RequestsFailed => self.raw(RawMetric::RequestsFailed),
            DerivedMetric::RequestsSucceeded => self.raw(RawMetric::RequestsSucceeded),
            DerivedMetric::Responses1xx => self.raw(RawMetric::Responses1xx),
            DerivedMetric::Responses2xx => self.raw(RawMetric::Responses2xx),
            DerivedMetric::Responses3xx => self.raw(RawMetric::Responses3xx),
            DerivedMetric::Responses4xx => self.raw(RawMetric::Responses4xx),
            DerivedMetric::Responses5xx => self.raw(RawMetric::Responses5xx),
            DerivedMetric::ResponsesTotal => self.responses_total(),
        }
    }
}

/// Entity-keyed metrics, created lazily on first access and kept for the
/// process lifetime.  Explicitly constructed and shared by the aggregator
/// rather than living behind a global.
#[derive(Debug, Default)]
pub struct MetricStore {
    entities: Mutex<HashMap<String, Metrics>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the entity's counters, creating them if needed.
    pub fn update(&self, entity: &str, f: impl FnOnce(&mut Metrics)) {
        let mut entities = self
            .entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(entities.entry(entity.to_string()).or_default());
    }

    /// Read API for the observability exporter.
    pub fn get(&self, entity: &str, metric: DerivedMetric) -> u64 {
        let mut entities = self
            .entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entities.entry(entity.to_string()).or_default().get(metric)
    }
}
