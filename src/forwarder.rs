// Outbound dispatch to satellite BMCs: sanitized request copies, a shared
// bounded connection pool, and synthetic status codes for transport
// failures.

use crate::classify::AggregationClass;
use crate::registry::SatelliteDescriptor;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, header, request::Parts};
use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::time::Duration;

/// Query parameters that must not be forwarded verbatim when fanning out a
/// collection request; they would skew the merged Members array.
const COLLECTION_UNSAFE_PARAMS: &[&str] = &["$skip", "$top", "only"];

/// Locally produced when the outbound pool is saturated.
pub const DROPPED: StatusCode = StatusCode::TOO_MANY_REQUESTS;
/// Locally produced when connect/send/receive fails (including timeout).
pub const FAILED: StatusCode = StatusCode::BAD_GATEWAY;

/// Immutable, sanitized copy of the inbound request.  Headers are rebuilt
/// from scratch rather than filtered, so auth tokens and HTTP/2
/// pseudo-headers never leak to a satellite.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub method: Method,
    /// Path to request on the satellite; the caller's prefix token is
    /// already stripped for `Resource`-class requests.
    pub target: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl ForwardedRequest {
    pub fn new(parts: &Parts, body: Bytes, class: &AggregationClass) -> Self {
        let target = match class {
            AggregationClass::Resource { target, .. } => target.clone(),
            _ => parts.uri.path().to_string(),
        };
        let query = parts.uri.query().map(str::to_string);
        let query = if matches!(class, AggregationClass::Collection) {
            query
                .map(|q| strip_collection_params(&q))
                .filter(|q| !q.is_empty())
        } else {
            query
        };
        Self {
            method: parts.method.clone(),
            target,
            query,
            content_type: header_string(&parts.headers, header::CONTENT_TYPE),
            body,
        }
    }
}

fn strip_collection_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or(pair);
            !COLLECTION_UNSAFE_PARAMS.contains(&key)
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// One satellite's answer, reduced to the status, the headers the mergers
/// care about, and the raw body.
#[derive(Debug, Clone)]
pub struct SatelliteResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub allow: Option<String>,
    pub location: Option<String>,
    pub retry_after: Option<String>,
    pub body: Bytes,
}

impl SatelliteResponse {
    /// A locally fabricated response: no headers, no body.
    pub fn synthetic(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            allow: None,
            location: None,
            retry_after: None,
            body: Bytes::new(),
        }
    }

    /// 429/502 mean no real response was received; such responses must not
    /// contribute headers or bodies to the aggregate.
    pub fn is_synthetic(&self) -> bool {
        self.status == DROPPED || self.status == FAILED
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref() == Some("application/json")
    }
}

/// Shared HTTP client for all satellite traffic.  Zero retries: any HTTP
/// status is surfaced to the caller; only transport failures map to
/// synthetic codes.
pub struct Forwarder {
    client: reqwest::Client,
    inflight: Semaphore,
}

impl Forwarder {
    pub fn new(request_timeout_secs: u64, max_inflight: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            inflight: Semaphore::new(max_inflight),
        })
    }

    pub async fn send(
        &self,
        satellite: &SatelliteDescriptor,
        request: &ForwardedRequest,
    ) -> SatelliteResponse {
        let Ok(_permit) = self.inflight.try_acquire() else {
            tracing::warn!(
                prefix = %satellite.prefix,
                "outbound pool saturated, dropping dispatch"
            );
            return SatelliteResponse::synthetic(DROPPED);
        };

        let mut url = format!("{}{}", satellite.base_url(), request.target);
        if let Some(query) = &request.query {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::ACCEPT, "application/json, application/octet-stream");
        if let Some(content_type) = &request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some((username, password)) = satellite.credentials() {
            builder = builder.basic_auth(username, Some(password));
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    prefix = %satellite.prefix,
                    target = %request.target,
                    "satellite dispatch failed"
                );
                return SatelliteResponse::synthetic(FAILED);
            }
        };

        let status = response.status();
        let content_type = header_string(response.headers(), header::CONTENT_TYPE);
        let allow = header_string(response.headers(), header::ALLOW);
        let location = header_string(response.headers(), header::LOCATION);
        let retry_after = header_string(response.headers(), header::RETRY_AFTER);
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, prefix = %satellite.prefix, "satellite body read failed");
                return SatelliteResponse::synthetic(FAILED);
            }
        };
        SatelliteResponse {
            status,
            content_type,
            allow,
            location,
            retry_after,
            body,
        }
    }
}
