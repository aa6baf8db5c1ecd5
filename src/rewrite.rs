// URI prefix rewriter: walks satellite JSON and namespaces resource
// identifiers with the satellite's prefix so they stay unique in the
// aggregate.

use crate::collections;
use serde_json::Value;

// Properties whose type is "string (URI)" but whose name does not end in a
// case-insensitive "uri" (Redfish Resource and Schema Guide 2022.2).  New
// schema URI properties end in URI, so this list should not need to grow.
// Pre-sorted for binary search.
const NON_URI_PROPERTIES: &[&str] = &[
    "@Redfish.ActionInfo",
    "@odata.id",
    "Image",
    "MetricProperty",
    "TaskMonitor",
    "target",
];

/// Does this property name hold a Redfish URI?
pub fn is_property_uri(property: &str) -> bool {
    property.to_ascii_lowercase().ends_with("uri")
        || NON_URI_PROPERTIES.binary_search(&property).is_ok()
}

/// Rewrites one URI string, returning `None` when no rewrite applies.  The
/// segment after the first taxonomy match gets `<prefix>_` prepended; bare
/// collection URIs, foreign paths, the JsonSchemas subtree, and segments
/// already carrying the prefix are left alone.
pub fn add_prefix_to_string(value: &str, prefix: &str) -> Option<String> {
    let path = value.strip_prefix('/')?;
    let mut parts = path.split('/');
    if parts.next() != Some("redfish") || parts.next() != Some("v1") {
        return None;
    }
    let rest: Vec<&str> = parts.collect();
    // Schema URIs are never prefixed; the aggregator serves all schemas.
    if rest.first() == Some(&"JsonSchemas") {
        return None;
    }

    let mut candidate = String::new();
    for (i, segment) in rest.iter().enumerate() {
        if collections::is_top_collection(&candidate) {
            // A trailing slash yields an empty segment here; that is a bare
            // collection URI and collections themselves stay unprefixed.
            if segment.is_empty() {
                return None;
            }
            let token = format!("{prefix}_");
            if segment.starts_with(&token) {
                return None;
            }
            let mut out = String::from("/redfish/v1");
            out.push_str(&candidate);
            out.push('/');
            out.push_str(&token);
            out.push_str(segment);
            for later in &rest[i + 1..] {
                out.push('/');
                out.push_str(later);
            }
            return Some(out);
        }
        if segment.is_empty() {
            return None;
        }
        candidate.push('/');
        candidate.push_str(segment);
    }
    None
}

/// Recursively walks a JSON document and prefixes every URI-bearing field.
pub fn add_prefixes(json: &mut Value, prefix: &str) {
    match json {
        Value::Object(object) => {
            for (property, item) in object.iter_mut() {
                if is_property_uri(property) {
                    add_prefix_to_item(item, prefix);
                    continue;
                }
                // Task-like resources embed raw header lines under
                // "HttpHeaders"; their Location values need fixing too.
                if property == "HttpHeaders" {
                    add_prefix_to_headers(item, prefix);
                    continue;
                }
                add_prefixes(item, prefix);
            }
        }
        Value::Array(array) => {
            for item in array.iter_mut() {
                add_prefixes(item, prefix);
            }
        }
        _ => {}
    }
}

fn add_prefix_to_item(item: &mut Value, prefix: &str) {
    let Value::String(value) = item else {
        tracing::error!("URI-bearing field was not a string");
        return;
    };
    if let Some(rewritten) = add_prefix_to_string(value, prefix) {
        *value = rewritten;
    }
}

/// Each entry is a single string of the form "<Field>: <Value>"; only the
/// Location header's URI portion is rewritten.
fn add_prefix_to_headers(item: &mut Value, prefix: &str) {
    let Value::Array(headers) = item else {
        return;
    };
    for header in headers.iter_mut() {
        let Value::String(line) = header else {
            tracing::error!("HttpHeaders entry was not a string");
            continue;
        };
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 2 || parts[0] != "Location:" {
            continue;
        }
        if let Some(rewritten) = add_prefix_to_string(parts[1], prefix) {
            *line = format!("Location: {rewritten}");
        }
    }
}
