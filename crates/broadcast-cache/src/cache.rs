use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use broadcast_types::{GatewayError, Partner, PartnerRepository};

use crate::store::CacheStore;

/// Default capacity and TTL: 100 entries, 30 minutes from write.
pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// An O(1) snapshot of the active partner set, isolating the orchestrator
/// from the backing repository. Write operations go through the
/// repository first and only mutate the local store on success.
pub struct PartnerCache {
    repository: Arc<dyn PartnerRepository>,
    store: RwLock<CacheStore<Partner>>,
}

impl PartnerCache {
    pub fn new(repository: Arc<dyn PartnerRepository>) -> Self {
        Self::with_capacity(repository, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    pub fn with_capacity(
        repository: Arc<dyn PartnerRepository>,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            store: RwLock::new(CacheStore::new(capacity, ttl)),
        }
    }

    /// Populates the cache from the repository's active-partners query.
    /// On repository failure, the error is logged and the cache is left
    /// as-is (empty, at first boot).
    pub async fn preload(&self) {
        match self.repository.find_active().await {
            Ok(partners) => {
                let mut store = self.store.write().await;
                store.clear();
                for partner in partners {
                    store.insert(partner.id.clone(), partner);
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "partner cache preload failed; serving prior state");
            }
        }
    }

    /// `refresh()`: invalidate all, repopulate from the repository.
    pub async fn refresh(&self) {
        self.preload().await;
    }

    /// A point-in-time copy; readers never observe an in-progress mutation.
    pub async fn active_partners(&self) -> Vec<Partner> {
        let store = self.store.read().await;
        store.values()
    }

    /// Cache-through lookup. Repository errors surface as `None`, never
    /// as an error through the broadcast path.
    pub async fn get(&self, id: &str) -> Option<Partner> {
        {
            let mut store = self.store.write().await;
            if let Some(partner) = store.get(id) {
                return Some(partner);
            }
        }

        match self.repository.find_by_id_and_enabled(id).await {
            Ok(Some(partner)) => {
                let mut store = self.store.write().await;
                store.insert(id.to_string(), partner.clone());
                Some(partner)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(partner_id = id, error = %err, "repository lookup failed; treating as not found");
                None
            }
        }
    }

    /// Write-through create: saves to the repository, then does a full
    /// refresh so the new partner is reflected in `active_partners()`.
    pub async fn create(&self, partner: Partner) -> Result<Partner, GatewayError> {
        let saved = self.repository.save(partner).await?;
        self.refresh().await;
        Ok(saved)
    }

    /// Write-through update: saves to the repository, then invalidates
    /// just this entry so the next read goes through the repository.
    pub async fn update(&self, partner: Partner) -> Result<Partner, GatewayError> {
        let saved = self.repository.save(partner).await?;
        let mut store = self.store.write().await;
        store.remove(&saved.id);
        Ok(saved)
    }

    /// Write-through disable: disables in the repository, then
    /// invalidates this entry.
    pub async fn disable(&self, id: &str) -> Result<(), GatewayError> {
        self.repository.set_enabled(id, false).await?;
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_types::{AuthenticationType, InMemoryPartnerRepository, RequestFormat};
    use std::collections::HashMap;

    fn partner(id: &str) -> Partner {
        Partner {
            id: id.to_string(),
            name: id.to_string(),
            base_url: "https://example.test".into(),
            start_charging_endpoint: "/start".into(),
            authentication_type: AuthenticationType::None,
            api_key: None,
            request_format: RequestFormat::Json,
            uid_field_name: "uid".into(),
            success_status_pattern: "success".into(),
            response_status_path: "status".into(),
            response_message_path: "message".into(),
            timeout_ms: 5000,
            custom_headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn preload_populates_active_partners() {
        let repo = Arc::new(InMemoryPartnerRepository::seeded([partner("a"), partner("b")]));
        let cache = PartnerCache::new(repo);
        cache.preload().await;
        assert_eq!(cache.active_partners().await.len(), 2);
    }

    #[tokio::test]
    async fn get_is_cache_through_on_miss() {
        let repo = Arc::new(InMemoryPartnerRepository::seeded([partner("a")]));
        let cache = PartnerCache::new(repo);
        // No preload: first get() must still resolve via the repository.
        let found = cache.get("a").await;
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn disable_removes_from_snapshot_after_refresh() {
        let repo = Arc::new(InMemoryPartnerRepository::seeded([partner("a"), partner("b")]));
        let cache = PartnerCache::new(repo);
        cache.preload().await;

        cache.disable("a").await.unwrap();
        cache.refresh().await;

        let active = cache.active_partners().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");
    }

    #[tokio::test]
    async fn two_consecutive_refreshes_are_idempotent() {
        let repo = Arc::new(InMemoryPartnerRepository::seeded([partner("a"), partner("b")]));
        let cache = PartnerCache::new(repo);

        cache.refresh().await;
        let first: Vec<_> = cache.active_partners().await.into_iter().map(|p| p.id).collect();
        cache.refresh().await;
        let mut second: Vec<_> = cache.active_partners().await.into_iter().map(|p| p.id).collect();
        let mut first_sorted = first;
        first_sorted.sort();
        second.sort();
        assert_eq!(first_sorted, second);
    }
}
