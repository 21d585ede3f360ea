//! Client-side key-value storage.
//!
//! The widget keeps two tiny pieces of client state: the tenant identifier
//! (durable scope, survives restarts) and the display counter (session
//! scope, dies with the session). Both scopes share one storage contract;
//! the scope is a property of the chosen implementation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Result, SurveyrError};

/// Durable storage key holding the tenant identifier.
pub const TENANT_KEY: &str = "tenant_id";

/// Session storage key holding the display counter.
pub const DISPLAY_COUNT_KEY: &str = "display_count";

/// String key-value storage scoped to one client.
pub trait ClientStore: Send + Sync {
    /// Read a value by key.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value if present.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory client storage.
///
/// Used as the session scope (its lifetime is the process) and as the
/// durable scope in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| SurveyrError::ClientStorage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| SurveyrError::ClientStorage(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| SurveyrError::ClientStorage(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

/// File-backed client storage for the durable scope.
///
/// Persists the key-value map as a single JSON object. Writes rewrite the
/// whole file; the map holds a handful of short strings at most.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open (or create the parent directory for) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let values = serde_json::from_str(&content)?;
        Ok(values)
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ClientStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Resolve the tenant identifier from durable storage, if one exists.
pub fn resolve_tenant(durable: &dyn ClientStore) -> Result<Option<String>> {
    durable.get(TENANT_KEY)
}

/// Resolve the tenant identifier, generating and persisting one if absent.
///
/// The publisher side uses this; the widget side never generates.
pub fn ensure_tenant(durable: &dyn ClientStore) -> Result<String> {
    if let Some(tenant) = durable.get(TENANT_KEY)? {
        return Ok(tenant);
    }
    let tenant = crate::id::generate_tenant_id();
    durable.set(TENANT_KEY, &tenant)?;
    log::info!("Generated tenant identifier {}", tenant);
    Ok(tenant)
}
