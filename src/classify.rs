// Per-request routing decision for the aggregator.

use crate::collections::{self, SearchType};
use crate::registry::SatelliteMap;

/// Outcome of classifying one request URI.  Computed fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationClass {
    /// The path is a top-level resource collection; fan out and merge
    /// `Members`.
    Collection,
    /// The path is not a collection but has one or more collections beneath
    /// it; fan out and merge top-level links.
    ContainsSubordinate,
    /// The path is a satellite-owned resource below a collection.  `target`
    /// is the caller path with the satellite prefix token stripped.
    Resource { prefix: String, target: String },
    /// Locally owned, or outside the aggregated namespace.
    NotAggregated,
}

/// Classifies a request path against the collection taxonomy and the set of
/// currently registered satellite prefixes.  Total: every input maps to
/// exactly one class.
///
/// The JsonSchemas subtree is always handled locally; schema versions on
/// satellites may not match ours.
pub fn classify(path: &str, satellites: &SatelliteMap) -> AggregationClass {
    let Some(sub) = collections::service_subpath(path) else {
        return AggregationClass::NotAggregated;
    };
    if sub == "/JsonSchemas" || sub.starts_with("/JsonSchemas/") {
        return AggregationClass::NotAggregated;
    }

    let segments: Vec<&str> = if sub.is_empty() {
        Vec::new()
    } else {
        sub[1..].split('/').collect()
    };

    // Walk the path one segment at a time.  The first time the accumulated
    // candidate names a collection, the following segment is a member id and
    // may carry a satellite prefix.
    let mut candidate = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if collections::is_top_collection(&candidate) {
            for prefix in satellites.keys() {
                let token = format!("{prefix}_");
                if let Some(rest) = segment.strip_prefix(token.as_str()) {
                    return AggregationClass::Resource {
                        prefix: prefix.clone(),
                        target: rebuild_target(&segments, i, rest),
                    };
                }
            }
            // Member id without a known prefix: locally owned.
            return AggregationClass::NotAggregated;
        }
        candidate.push('/');
        candidate.push_str(segment);
    }

    if collections::is_top_collection(&candidate) {
        return AggregationClass::Collection;
    }
    if collections::search_collections(path, SearchType::ContainsSubordinate) {
        return AggregationClass::ContainsSubordinate;
    }
    AggregationClass::NotAggregated
}

/// Reassembles the forwardable path with segment `i` replaced by its
/// prefix-stripped remainder.
fn rebuild_target(segments: &[&str], i: usize, rest: &str) -> String {
    let mut target = String::from("/redfish/v1");
    for (j, segment) in segments.iter().enumerate() {
        target.push('/');
        if j == i {
            target.push_str(rest);
        } else {
            target.push_str(segment);
        }
    }
    target
}
