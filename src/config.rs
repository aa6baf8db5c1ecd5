use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub satellites: SatellitesConfig,
    pub forwarding: ForwardingConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatellitesConfig {
    /// JSON file listing the satellite controller records.
    pub store_path: String,
    /// How often to re-poll the store for added or removed satellites.
    pub discovery_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForwardingConfig {
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent outbound requests; excess dispatches are
    /// dropped with a 429.
    pub max_inflight_requests: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalConfig {
    /// Chassis ids served by this BMC itself.
    #[serde(default)]
    pub chassis: Vec<String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.satellites.store_path.is_empty(),
            "satellites.store_path must be non-empty"
        );
        anyhow::ensure!(
            self.satellites.discovery_interval_secs > 0,
            "satellites.discovery_interval_secs must be > 0, got {}",
            self.satellites.discovery_interval_secs
        );
        anyhow::ensure!(
            self.forwarding.request_timeout_secs > 0,
            "forwarding.request_timeout_secs must be > 0, got {}",
            self.forwarding.request_timeout_secs
        );
        anyhow::ensure!(
            self.forwarding.max_inflight_requests > 0,
            "forwarding.max_inflight_requests must be > 0, got {}",
            self.forwarding.max_inflight_requests
        );
        Ok(())
    }
}
