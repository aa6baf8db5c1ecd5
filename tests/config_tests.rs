// Config loading and validation tests

use redfish_gateway::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[satellites]
store_path = "data/satellites.json"
discovery_interval_secs = 30

[forwarding]
request_timeout_secs = 10
max_inflight_requests = 32

[local]
chassis = ["Local1"]
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.satellites.store_path, "data/satellites.json");
    assert_eq!(config.satellites.discovery_interval_secs, 30);
    assert_eq!(config.forwarding.request_timeout_secs, 10);
    assert_eq!(config.forwarding.max_inflight_requests, 32);
    assert_eq!(config.local.chassis, vec!["Local1"]);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_store_path() {
    let bad = VALID_CONFIG.replace("store_path = \"data/satellites.json\"", "store_path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("satellites.store_path"));
}

#[test]
fn test_config_validation_rejects_discovery_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "discovery_interval_secs = 30",
        "discovery_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("discovery_interval_secs"));
}

#[test]
fn test_config_validation_rejects_request_timeout_zero() {
    let bad = VALID_CONFIG.replace("request_timeout_secs = 10", "request_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("request_timeout_secs"));
}

#[test]
fn test_config_validation_rejects_max_inflight_zero() {
    let bad = VALID_CONFIG.replace("max_inflight_requests = 32", "max_inflight_requests = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_inflight_requests"));
}

#[test]
fn test_config_local_section_optional() {
    let without_local = VALID_CONFIG
        .replace("[local]", "")
        .replace("chassis = [\"Local1\"]", "");
    let config = AppConfig::load_from_str(&without_local).expect("valid");
    assert!(config.local.chassis.is_empty());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.satellites.store_path, "data/satellites.json");
}
