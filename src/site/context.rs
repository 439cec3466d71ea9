use super::store::{SiteDirectory, SiteStore};
use crate::Result;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// The currently selected backing store.
#[derive(Clone)]
pub struct SiteContext {
    pub domain: String,
    pub store: Arc<dyn SiteStore>,
    pub last_switched_at: SystemTime,
}

impl std::fmt::Debug for SiteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteContext")
            .field("domain", &self.domain)
            .field("last_switched_at", &self.last_switched_at)
            .finish()
    }
}

/// Owns the single active site of the server.
///
/// There is at most one active store per server. Callers that need to run a
/// capability against a site go through [`SiteContextManager::enter`], which
/// keeps the lock for as long as the returned [`ActiveSite`] lives, so a
/// switch and the execution that follows it form one critical section.
pub struct SiteContextManager {
    directory: SiteDirectory,
    default_site: String,
    active: Mutex<Option<SiteContext>>,
}

/// Exclusive access to the active site.
pub struct ActiveSite<'a> {
    guard: MutexGuard<'a, Option<SiteContext>>,
}

impl ActiveSite<'_> {
    pub fn context(&self) -> Option<&SiteContext> {
        self.guard.as_ref()
    }
}

impl SiteContextManager {
    pub fn new(directory: SiteDirectory, default_site: impl Into<String>) -> Self {
        Self {
            directory,
            default_site: default_site.into(),
            active: Mutex::new(None),
        }
    }

    pub fn directory(&self) -> &SiteDirectory {
        &self.directory
    }

    pub fn default_site(&self) -> &str {
        &self.default_site
    }

    pub async fn active_domain(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|ctx| ctx.domain.clone())
    }

    pub async fn active_context(&self) -> Option<SiteContext> {
        self.active.lock().await.clone()
    }

    /// Makes `domain` the active site.
    ///
    /// No-op when `domain` is already active. On failure the previous site
    /// stays active.
    pub async fn switch_site(&self, domain: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        self.switch_locked(&mut active, domain).await
    }

    /// Locks the site context, optionally switching to `domain` first.
    ///
    /// The lock is held until the returned guard is dropped.
    pub async fn enter(&self, domain: Option<&str>) -> Result<ActiveSite<'_>> {
        let mut guard = self.active.lock().await;
        if let Some(domain) = domain {
            self.switch_locked(&mut guard, domain).await?;
        }
        Ok(ActiveSite { guard })
    }

    async fn switch_locked(&self, slot: &mut Option<SiteContext>, domain: &str) -> Result<()> {
        if let Some(current) = slot.as_ref() {
            if current.domain == domain {
                debug!("Site {} already active", domain);
                return Ok(());
            }
        }

        let store = self.directory.open(domain).await?;
        let previous = slot.as_ref().map(|ctx| ctx.domain.clone());
        *slot = Some(SiteContext {
            domain: domain.to_string(),
            store,
            last_switched_at: SystemTime::now(),
        });

        info!("Switched site {:?} -> {}", previous, domain);
        Ok(())
    }
}
