// Satellite registry: discovers peer BMCs from the configuration store and
// publishes an atomically swapped snapshot of prefix -> backend descriptor.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// One configuration-store record: a flat bag of properties.
pub type PropertyBag = serde_json::Map<String, Value>;

/// Published registry snapshot.
pub type SatelliteMap = HashMap<String, SatelliteDescriptor>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("satellite store I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("satellite store parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of satellite-controller configuration records.  Stands in for the
/// platform configuration store; tests supply in-memory implementations.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn satellite_configs(&self) -> Result<Vec<PropertyBag>, StoreError>;
}

/// Reads satellite records from a JSON file: an array of property bags with
/// at least `Hostname`, `Port`, `AuthType`, and `Name`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn satellite_configs(&self) -> Result<Vec<PropertyBag>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<PropertyBag> = serde_json::from_str(&raw)?;
        Ok(records)
    }
}

/// Connection details for one satellite BMC.  `prefix` doubles as the URI
/// namespace token (joined to member ids with `_`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteDescriptor {
    pub prefix: String,
    pub host: String,
    pub port: u16,
    pub scheme: &'static str,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SatelliteDescriptor {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Basic-auth credentials, only when both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }

    /// Validates one configuration record.  Missing or invalid fields drop
    /// the whole descriptor, never a partial one.
    pub fn from_properties(bag: &PropertyBag) -> Option<Self> {
        let Some(name) = bag.get("Name").and_then(Value::as_str) else {
            tracing::error!("satellite config missing Name");
            return None;
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            tracing::error!(name, "satellite Name must be non-empty alphanumeric");
            return None;
        }
        let Some(host) = bag.get("Hostname").and_then(Value::as_str) else {
            tracing::error!(name, "satellite config missing Hostname");
            return None;
        };
        let Some(port) = bag.get("Port").and_then(Value::as_u64) else {
            tracing::error!(name, "satellite config missing Port");
            return None;
        };
        let Ok(port) = u16::try_from(port) else {
            tracing::error!(name, port, "satellite Port out of range");
            return None;
        };
        let Some(auth) = bag.get("AuthType").and_then(Value::as_str) else {
            tracing::error!(name, "satellite config missing AuthType");
            return None;
        };
        // Only unauthenticated satellite links are supported today.
        if auth != "None" {
            tracing::error!(
                name,
                auth,
                "unsupported AuthType, only \"None\" is supported"
            );
            return None;
        }
        Some(Self {
            prefix: name.to_string(),
            host: host.to_string(),
            port,
            scheme: "http",
            username: bag.get("Username").and_then(Value::as_str).map(String::from),
            password: bag.get("Password").and_then(Value::as_str).map(String::from),
        })
    }
}

/// Builds the prefix map from raw store records.  Current policy: exactly
/// 0 or 1 satellite is supported; finding more than one valid descriptor
/// discards them all and disables aggregation.
pub fn collect_descriptors(records: &[PropertyBag]) -> SatelliteMap {
    let mut map = SatelliteMap::new();
    for bag in records {
        let Some(descriptor) = SatelliteDescriptor::from_properties(bag) else {
            continue;
        };
        if !map.is_empty() {
            tracing::error!("aggregation only supports one satellite, clearing all configs");
            return SatelliteMap::new();
        }
        tracing::debug!(
            prefix = %descriptor.prefix,
            url = %descriptor.base_url(),
            "added satellite config"
        );
        map.insert(descriptor.prefix.clone(), descriptor);
    }
    map
}

/// Holds the last published satellite snapshot.  Rebuilt wholesale on every
/// discovery poll; readers clone the `Arc` and never block discovery.
pub struct SatelliteRegistry {
    store: Arc<dyn ConfigStore>,
    snapshot: RwLock<Arc<SatelliteMap>>,
}

impl SatelliteRegistry {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Arc::new(SatelliteMap::new())),
        }
    }

    pub fn snapshot(&self) -> Arc<SatelliteMap> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-queries the configuration store and swaps in the new snapshot.
    /// A store failure keeps the previous snapshot; discovery is never fatal
    /// to request handling.  Returns the published satellite count.
    pub async fn refresh(&self) -> usize {
        let records = match self.store.satellite_configs().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "satellite discovery failed, keeping previous snapshot");
                return self.snapshot().len();
            }
        };
        let map = collect_descriptors(&records);
        let count = map.len();
        if count == 0 {
            tracing::debug!("no satellite BMCs detected, aggregation not enabled");
        } else {
            tracing::debug!(count, "satellite discovery complete");
        }
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(map);
        count
    }
}
