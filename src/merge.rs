// Response merging: folds one or more satellite responses into the
// caller-visible aggregate, rewriting URIs and keeping the metric store
// current as a side effect.

use crate::collections::{self, SearchType};
use crate::forwarder::SatelliteResponse;
use crate::messages;
use crate::metrics::MetricStore;
use crate::rewrite;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use bytes::Bytes;
use serde_json::Value;

/// Signature shared by the fan-out merge strategies.
pub type MergeFn = fn(&str, &mut AggregateResponse, &SatelliteResponse, &MetricStore);

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateBody {
    None,
    Json(Value),
    Raw(Bytes),
}

/// The caller-visible response, built incrementally as satellite responses
/// arrive.
#[derive(Debug, Clone)]
pub struct AggregateResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: AggregateBody,
}

impl Default for AggregateResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: AggregateBody::None,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            AggregateBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn json_mut(&mut self) -> Option<&mut Value> {
        match &mut self.body {
            AggregateBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Replaces status and body, marking the payload as JSON.
    pub fn set_json(&mut self, status: StatusCode, value: Value) {
        self.status = status;
        self.body = AggregateBody::Json(value);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    fn set_header(&mut self, name: header::HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }
}

impl IntoResponse for AggregateResponse {
    fn into_response(self) -> axum::response::Response {
        let mut headers = self.headers;
        let bytes = match self.body {
            AggregateBody::None => Bytes::new(),
            AggregateBody::Raw(bytes) => bytes,
            AggregateBody::Json(value) => {
                if !headers.contains_key(header::CONTENT_TYPE) {
                    headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    );
                }
                serde_json::to_vec(&value).unwrap_or_default().into()
            }
        };
        (self.status, headers, bytes).into_response()
    }
}

/// True when overwriting the aggregate with an error body would not mask a
/// valid or still-pending response.
fn no_valid_response(agg: &AggregateResponse) -> bool {
    agg.status != StatusCode::OK
        && agg.status != StatusCode::TOO_MANY_REQUESTS
        && agg.status != StatusCode::BAD_GATEWAY
}

/// Copies the satellite headers the aggregate is allowed to relay.
/// Location is itself a URI into the satellite's namespace and gets the
/// prefix treatment.
fn add_aggregated_headers(agg: &mut AggregateResponse, resp: &SatelliteResponse, prefix: &str) {
    if let Some(content_type) = &resp.content_type {
        agg.set_header(header::CONTENT_TYPE, content_type);
    }
    if let Some(allow) = &resp.allow {
        agg.set_header(header::ALLOW, allow);
    }
    if let Some(location) = &resp.location {
        let location = rewrite::add_prefix_to_string(location, prefix)
            .unwrap_or_else(|| location.clone());
        agg.set_header(header::LOCATION, &location);
    }
    if let Some(retry_after) = &resp.retry_after {
        agg.set_header(header::RETRY_AFTER, retry_after);
    }
}

/// Single-resource merge: the one satellite's response becomes the
/// aggregate, URI fields rewritten under its prefix.
pub fn process_response(
    prefix: &str,
    agg: &mut AggregateResponse,
    resp: &SatelliteResponse,
    metrics: &MetricStore,
) {
    metrics.update(prefix, |m| m.record_response_code(resp.status.as_u16()));

    // No real response was received; surface the code without touching the
    // accumulated headers.
    if resp.is_synthetic() {
        agg.status = resp.status;
        return;
    }

    if resp.is_json() {
        match serde_json::from_slice::<Value>(&resp.body) {
            Ok(mut json) => {
                rewrite::add_prefixes(&mut json, prefix);
                agg.status = resp.status;
                agg.body = AggregateBody::Json(json);
            }
            Err(e) => {
                tracing::error!(error = %e, prefix, "error parsing satellite response as JSON");
                agg.status = resp.status;
                agg.body = AggregateBody::Json(messages::internal_error_body());
            }
        }
    } else {
        // Opaque passthrough, but never clobber a JSON success from another
        // contributor.
        if agg.status.is_success() && matches!(agg.body, AggregateBody::Json(_)) {
            tracing::warn!(prefix, "dropping non-JSON satellite response, JSON result already present");
            return;
        }
        agg.status = resp.status;
        agg.body = AggregateBody::Raw(resp.body.clone());
    }
    add_aggregated_headers(agg, resp, prefix);
}

/// Collection merge: the first successful contributor seeds the aggregate,
/// later ones append their Members and the count is recomputed from the
/// array length.
pub fn process_collection_response(
    prefix: &str,
    agg: &mut AggregateResponse,
    resp: &SatelliteResponse,
    metrics: &MetricStore,
) {
    metrics.update(prefix, |m| m.record_response_code(resp.status.as_u16()));

    if resp.is_synthetic() {
        return;
    }

    if resp.status != StatusCode::OK {
        tracing::debug!(
            prefix,
            status = %resp.status,
            "collection resource does not exist on satellite"
        );
        // Relay the satellite's error only if nothing succeeded yet.
        if agg.status != StatusCode::OK {
            agg.status = resp.status;
            agg.body = if resp.body.is_empty() {
                AggregateBody::None
            } else {
                AggregateBody::Raw(resp.body.clone())
            };
            if let Some(content_type) = &resp.content_type {
                agg.set_header(header::CONTENT_TYPE, content_type);
            }
        }
        return;
    }

    if !resp.is_json() {
        tracing::error!(prefix, "received non-JSON collection response");
        if no_valid_response(agg) {
            messages::operation_failed(agg);
        }
        return;
    }

    let mut json = match serde_json::from_slice::<Value>(&resp.body) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, prefix, "error parsing satellite response as JSON");
            if no_valid_response(agg) {
                messages::operation_failed(agg);
            }
            return;
        }
    };
    rewrite::add_prefixes(&mut json, prefix);

    if agg.status != StatusCode::OK {
        // The collection does not exist locally and no satellite has seeded
        // it yet; only resources exposing a Members array aggregate.
        if !json.get("Members").is_some_and(Value::is_array) {
            tracing::debug!(prefix, "skipping aggregation of unsupported resource");
            return;
        }
        agg.set_json(resp.status, json);
        return;
    }

    let Some(agg_json) = agg.json_mut() else {
        tracing::debug!(prefix, "skipping aggregation, local response is not JSON");
        return;
    };
    let Some(members) = agg_json.get_mut("Members").and_then(Value::as_array_mut) else {
        tracing::debug!(prefix, "skipping aggregation of unsupported resource");
        return;
    };
    let Some(satellite_members) = json.get_mut("Members").and_then(Value::as_array_mut) else {
        tracing::debug!(prefix, "satellite response has no Members array");
        return;
    };
    members.append(satellite_members);
    let count = members.len();
    agg_json["Members@odata.count"] = count.into();
}

/// Subordinate-container merge: only top-level links to collections (or
/// containers of collections) the aggregate is missing are copied over.  A
/// local error is promoted to the satellite's answer once a link lands.
pub fn process_contains_subordinate_response(
    prefix: &str,
    agg: &mut AggregateResponse,
    resp: &SatelliteResponse,
    metrics: &MetricStore,
) {
    metrics.update(prefix, |m| m.record_response_code(resp.status.as_u16()));

    if resp.is_synthetic() {
        return;
    }
    if resp.status != StatusCode::OK {
        tracing::debug!(
            prefix,
            status = %resp.status,
            "satellite could not serve subordinate container"
        );
        return;
    }
    if !resp.is_json() {
        tracing::error!(prefix, "received non-JSON subordinate response");
        if no_valid_response(agg) {
            messages::operation_failed(agg);
        }
        return;
    }
    let mut json = match serde_json::from_slice::<Value>(&resp.body) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, prefix, "error parsing satellite response as JSON");
            if no_valid_response(agg) {
                messages::operation_failed(agg);
            }
            return;
        }
    };
    rewrite::add_prefixes(&mut json, prefix);
    let Some(satellite_obj) = json.as_object() else {
        return;
    };

    let mut added: Vec<(String, Value)> = Vec::new();
    for (property, value) in satellite_obj {
        let Some(id) = value
            .as_object()
            .and_then(|o| o.get("@odata.id"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if !collections::search_collections(id, SearchType::CollOrCon) {
            continue;
        }
        let already_present = agg
            .json()
            .and_then(Value::as_object)
            .is_some_and(|o| o.contains_key(property));
        if !already_present {
            added.push((property.clone(), value.clone()));
        }
    }
    if added.is_empty() {
        return;
    }

    let promote = agg.status != StatusCode::OK;
    if !matches!(agg.body, AggregateBody::Json(Value::Object(_))) {
        agg.body = AggregateBody::Json(Value::Object(Default::default()));
    }
    let AggregateBody::Json(Value::Object(object)) = &mut agg.body else {
        return;
    };
    for (property, value) in added {
        object.insert(property, value);
    }
    if promote {
        // The local pipeline had no answer; take the satellite's identity
        // and clear any previously written error payload.
        object.remove("error");
        for field in ["@odata.id", "@odata.type", "Id", "Name"] {
            if let Some(value) = satellite_obj.get(field) {
                object.insert(field.to_string(), value.clone());
            }
        }
        agg.status = resp.status;
        agg.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
}
