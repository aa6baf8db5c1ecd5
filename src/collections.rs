// Static taxonomy of top-level resource collections (Redfish Resource and
// Schema Guide 2022.2).  Paths are relative to the service root so the
// classifier and rewriter can binary search them by accumulated prefix.

/// Every resource collection that participates in aggregation, sorted
/// lexicographically.  Never mutated at runtime.
pub const TOP_COLLECTIONS: &[&str] = &[
    "/AggregationService/Aggregates",
    "/AggregationService/AggregationSources",
    "/AggregationService/ConnectionMethods",
    "/Cables",
    "/Chassis",
    "/ComponentIntegrity",
    "/CompositionService/ActivePool",
    "/CompositionService/CompositionReservations",
    "/CompositionService/FreePool",
    "/CompositionService/ResourceBlocks",
    "/CompositionService/ResourceZones",
    "/EventService/Subscriptions",
    "/Fabrics",
    "/Facilities",
    "/JobService/Jobs",
    "/JobService/Log/Entries",
    "/KeyService/NVMeoFKeyPolicies",
    "/KeyService/NVMeoFSecrets",
    "/LicenseService/Licenses",
    "/Managers",
    "/NVMeDomains",
    "/PowerEquipment/ElectricalBuses",
    "/PowerEquipment/FloorPDUs",
    "/PowerEquipment/PowerShelves",
    "/PowerEquipment/RackPDUs",
    "/PowerEquipment/Switchgear",
    "/PowerEquipment/TransferSwitches",
    "/RegisteredClients",
    "/SessionService/Sessions",
    "/Storage",
    "/StorageServices",
    "/StorageSystems",
    "/Systems",
    "/TaskService/Tasks",
    "/TelemetryService/LogService/Entries",
    "/TelemetryService/MetricDefinitions",
    "/TelemetryService/MetricReportDefinitions",
    "/TelemetryService/MetricReports",
    "/TelemetryService/Triggers",
    "/UpdateService/FirmwareInventory",
    "/UpdateService/SoftwareInventory",
];

/// What a taxonomy lookup should answer about a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// The URI is itself a top-level collection.
    Collection,
    /// The URI is a strict ancestor of at least one top-level collection.
    ContainsSubordinate,
    /// Either of the above.
    CollOrCon,
}

/// Returns the request path below `/redfish/v1` in canonical form (leading
/// slash per segment, no trailing slash), or `None` if the URI is not under
/// the service root.  A single trailing slash is tolerated; empty segments
/// anywhere else disqualify the URI.
pub fn service_subpath(uri: &str) -> Option<String> {
    let path = uri.strip_prefix('/')?;
    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.len() > 1 && segments.last() == Some(&"") {
        segments.pop();
    }
    let mut it = segments.into_iter();
    if it.next() != Some("redfish") || it.next() != Some("v1") {
        return None;
    }
    let mut sub = String::new();
    for segment in it {
        if segment.is_empty() {
            return None;
        }
        sub.push('/');
        sub.push_str(segment);
    }
    Some(sub)
}

/// Checks a URI against the collection taxonomy.  The service root itself
/// (`/redfish/v1`) contains every collection, so it always satisfies
/// `ContainsSubordinate`.
pub fn search_collections(uri: &str, search: SearchType) -> bool {
    let Some(sub) = service_subpath(uri) else {
        return false;
    };
    let is_collection = TOP_COLLECTIONS.binary_search(&sub.as_str()).is_ok();
    match search {
        SearchType::Collection => is_collection,
        SearchType::ContainsSubordinate => contains_subordinate(&sub),
        SearchType::CollOrCon => is_collection || contains_subordinate(&sub),
    }
}

/// True when `sub` (canonical subpath) is a strict ancestor of some entry in
/// the taxonomy.
fn contains_subordinate(sub: &str) -> bool {
    if sub.is_empty() {
        return !TOP_COLLECTIONS.is_empty();
    }
    let child_prefix = format!("{sub}/");
    let idx = TOP_COLLECTIONS.partition_point(|c| *c < child_prefix.as_str());
    TOP_COLLECTIONS
        .get(idx)
        .is_some_and(|c| c.starts_with(&child_prefix))
}

/// True when the accumulated candidate path (relative to the service root)
/// names a top-level collection exactly.
pub fn is_top_collection(candidate: &str) -> bool {
    TOP_COLLECTIONS.binary_search(&candidate).is_ok()
}
