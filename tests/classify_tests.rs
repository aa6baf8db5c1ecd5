// Collection taxonomy and request classification tests

use redfish_gateway::classify::{AggregationClass, classify};
use redfish_gateway::collections::{SearchType, TOP_COLLECTIONS, search_collections};
use redfish_gateway::registry::{SatelliteDescriptor, SatelliteMap};

fn satellites(prefixes: &[&str]) -> SatelliteMap {
    let mut map = SatelliteMap::new();
    for prefix in prefixes {
        map.insert(
            prefix.to_string(),
            SatelliteDescriptor {
                prefix: prefix.to_string(),
                host: "127.0.0.1".into(),
                port: 8000,
                scheme: "http",
                username: None,
                password: None,
            },
        );
    }
    map
}

#[test]
fn test_taxonomy_is_sorted() {
    assert!(TOP_COLLECTIONS.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_search_recognizes_collections() {
    for uri in [
        "/redfish/v1/Chassis",
        "/redfish/v1/Chassis/",
        "/redfish/v1/UpdateService/FirmwareInventory",
        "/redfish/v1/TelemetryService/LogService/Entries",
    ] {
        assert!(
            search_collections(uri, SearchType::Collection),
            "{uri} should be a collection"
        );
    }
}

#[test]
fn test_search_recognizes_subordinate_containers() {
    for uri in [
        "/redfish/v1",
        "/redfish/v1/",
        "/redfish/v1/UpdateService",
        "/redfish/v1/CompositionService",
        "/redfish/v1/TelemetryService",
        "/redfish/v1/TelemetryService/LogService",
    ] {
        assert!(
            search_collections(uri, SearchType::ContainsSubordinate),
            "{uri} should contain a subordinate collection"
        );
        assert!(
            !search_collections(uri, SearchType::Collection),
            "{uri} is not itself a collection"
        );
    }
}

#[test]
fn test_search_rejects_malformed_uris() {
    for uri in [
        "/redfish/v11",
        "/redfish/v11/Chassis",
        "/redfish/v1//",
        "/redfish/v1//Chassis",
        "/redfish/v1/Chassis//",
        "/redfish//v1/Chassis",
        "/Chassis",
        "redfish/v1/Chassis",
        "",
    ] {
        assert!(
            !search_collections(uri, SearchType::CollOrCon),
            "{uri} should not match"
        );
    }
}

#[test]
fn test_search_rejects_collection_members() {
    assert!(!search_collections(
        "/redfish/v1/Chassis/Node1",
        SearchType::CollOrCon
    ));
    assert!(!search_collections(
        "/redfish/v1/Chassis/Node1/Power",
        SearchType::CollOrCon
    ));
}

#[test]
fn test_classify_collection() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(
        classify("/redfish/v1/Chassis", &sats),
        AggregationClass::Collection
    );
    assert_eq!(
        classify("/redfish/v1/UpdateService/FirmwareInventory", &sats),
        AggregationClass::Collection
    );
}

#[test]
fn test_classify_contains_subordinate() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(
        classify("/redfish/v1", &sats),
        AggregationClass::ContainsSubordinate
    );
    assert_eq!(
        classify("/redfish/v1/UpdateService", &sats),
        AggregationClass::ContainsSubordinate
    );
}

#[test]
fn test_classify_prefixed_resource() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(
        classify("/redfish/v1/Chassis/RACK1_Node1", &sats),
        AggregationClass::Resource {
            prefix: "RACK1".into(),
            target: "/redfish/v1/Chassis/Node1".into(),
        }
    );
    // Deeper segments are forwarded untouched.
    assert_eq!(
        classify("/redfish/v1/Chassis/RACK1_Node1/Power", &sats),
        AggregationClass::Resource {
            prefix: "RACK1".into(),
            target: "/redfish/v1/Chassis/Node1/Power".into(),
        }
    );
}

#[test]
fn test_classify_local_member_not_aggregated() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(
        classify("/redfish/v1/Chassis/Local1", &sats),
        AggregationClass::NotAggregated
    );
    // Unknown prefix token stays local.
    assert_eq!(
        classify("/redfish/v1/Chassis/OTHER_Node1", &sats),
        AggregationClass::NotAggregated
    );
}

#[test]
fn test_classify_without_satellites() {
    let sats = satellites(&[]);
    assert_eq!(
        classify("/redfish/v1/Chassis", &sats),
        AggregationClass::Collection
    );
    assert_eq!(
        classify("/redfish/v1/Chassis/RACK1_Node1", &sats),
        AggregationClass::NotAggregated
    );
}

#[test]
fn test_classify_json_schemas_stays_local() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(
        classify("/redfish/v1/JsonSchemas", &sats),
        AggregationClass::NotAggregated
    );
    assert_eq!(
        classify("/redfish/v1/JsonSchemas/Chassis", &sats),
        AggregationClass::NotAggregated
    );
}

#[test]
fn test_classify_outside_service_root() {
    let sats = satellites(&["RACK1"]);
    assert_eq!(classify("/redfish", &sats), AggregationClass::NotAggregated);
    assert_eq!(classify("/", &sats), AggregationClass::NotAggregated);
    assert_eq!(
        classify("/redfish/v11/Chassis", &sats),
        AggregationClass::NotAggregated
    );
}
