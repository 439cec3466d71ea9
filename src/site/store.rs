use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One stored record. Every record carries a string `id`.
pub type Record = Map<String, Value>;

/// File that marks a directory under the sites root as a site.
pub const MANIFEST_FILE: &str = "site.json";

/// Generic query/command interface onto one site's content.
///
/// Capabilities never see the storage layout; they only address
/// collections (`pages`, `menus`, `templates`, `users`, ...) by name.
#[async_trait]
pub trait SiteStore: Send + Sync {
    fn domain(&self) -> &str;

    async fn manifest(&self) -> Result<Value>;

    async fn list(&self, collection: &str) -> Result<Vec<Record>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>>;

    /// Inserts or replaces the record with the same `id`.
    async fn put(&self, collection: &str, record: Record) -> Result<Record>;

    /// Returns `false` when nothing with `id` existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

/// A site backed by a directory of JSON files, one array per collection.
pub struct JsonSiteStore {
    domain: String,
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSiteStore {
    pub fn new(domain: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidParams(format!(
                "Invalid collection name: {}",
                collection
            )));
        }
        Ok(self.root.join(format!("{}.json", collection)))
    }

    async fn read_collection(&self, path: &Path) -> Result<Vec<Record>> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let records: Vec<Record> = serde_json::from_str(&raw).map_err(|e| {
            Error::Storage(format!("Corrupt collection {}: {}", path.display(), e))
        })?;
        Ok(records)
    }

    async fn write_collection(&self, path: &Path, records: &[Record]) -> Result<()> {
        let body = serde_json::to_string_pretty(records)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[async_trait]
impl SiteStore for JsonSiteStore {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn manifest(&self) -> Result<Value> {
        let path = self.root.join(MANIFEST_FILE);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("Corrupt manifest {}: {}", path.display(), e)))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Record>> {
        let path = self.collection_path(collection)?;
        self.read_collection(&path).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let records = self.list(collection).await?;
        Ok(records.into_iter().find(|r| record_id(r) == Some(id)))
    }

    async fn put(&self, collection: &str, record: Record) -> Result<Record> {
        let id = record_id(&record)
            .ok_or_else(|| Error::InvalidParams("Record is missing a string 'id'".to_string()))?
            .to_string();
        let path = self.collection_path(collection)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_collection(&path).await?;
        match records.iter_mut().find(|r| record_id(r) == Some(id.as_str())) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_collection(&path, &records).await?;

        debug!("Stored {}/{} on {}", collection, id, self.domain);
        Ok(record)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let path = self.collection_path(collection)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_collection(&path).await?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.write_collection(&path, &records).await?;

        debug!("Deleted {}/{} on {}", collection, id, self.domain);
        Ok(true)
    }
}

/// Summary of one discoverable site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub domain: String,
    pub name: String,
}

/// Locates site backing stores under a root directory.
///
/// A site `example.org` exists when `<root>/example.org/site.json` exists.
#[derive(Debug, Clone)]
pub struct SiteDirectory {
    root: PathBuf,
}

impl SiteDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rejects anything that could escape the sites root.
    pub fn is_valid_domain(domain: &str) -> bool {
        !domain.is_empty()
            && domain != "."
            && domain != ".."
            && !domain.contains(['/', '\\'])
            && !domain.contains("..")
    }

    pub async fn exists(&self, domain: &str) -> bool {
        if !Self::is_valid_domain(domain) {
            return false;
        }
        tokio::fs::try_exists(self.root.join(domain).join(MANIFEST_FILE))
            .await
            .unwrap_or(false)
    }

    /// Opens the backing store for `domain`, failing closed when none exists.
    pub async fn open(&self, domain: &str) -> Result<Arc<dyn SiteStore>> {
        if !self.exists(domain).await {
            return Err(Error::SiteNotFound(domain.to_string()));
        }
        Ok(Arc::new(JsonSiteStore::new(domain, self.root.join(domain))))
    }

    /// Lists every site under the root, sorted by domain.
    pub async fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Sites root {} does not exist", self.root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut sites = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let domain = entry.file_name().to_string_lossy().to_string();
            if !self.exists(&domain).await {
                continue;
            }

            let store = JsonSiteStore::new(domain.as_str(), entry.path());
            let name = match store.manifest().await {
                Ok(manifest) => manifest
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(&domain)
                    .to_string(),
                Err(e) => {
                    warn!("Skipping unreadable manifest for {}: {}", domain, e);
                    domain.clone()
                }
            };
            sites.push(SiteSummary { domain, name });
        }

        sites.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(sites)
    }
}
