use super::{CacheStats, Store};
use crate::core::cache::{CachedRate, OfflineCache, RateLookup};
use crate::core::currency::{CurrencyRecord, RateEntry, query_key};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Typed, best-effort access to the local store.
///
/// Without a store every write is a no-op and every read comes back empty,
/// so the application keeps working network-only.
#[derive(Clone, Default)]
pub struct CacheGateway {
    store: Option<Arc<Store>>,
}

impl CacheGateway {
    pub fn new(store: Store) -> Self {
        Self {
            store: Some(Arc::new(store)),
        }
    }

    pub fn unavailable() -> Self {
        Self { store: None }
    }

    /// Opens the store under `data_path`, degrading to an unavailable gateway on failure.
    pub fn open(data_path: &Path) -> Self {
        match Store::open(data_path) {
            Ok(store) => Self::new(store),
            Err(e) => {
                warn!(error = %e, "Local cache unavailable, continuing network-only");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn stats(&self) -> Option<CacheStats> {
        let store = self.store.as_ref()?;
        match store.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Failed to read cache statistics");
                None
            }
        }
    }

    pub fn flush(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.persist() {
                warn!(error = %e, "Failed to sync cache to disk");
            }
        }
    }
}

#[async_trait]
impl OfflineCache for CacheGateway {
    async fn put_currencies(&self, currencies: &[CurrencyRecord]) {
        let Some(store) = &self.store else {
            return;
        };
        match store.currencies().upsert(currencies.to_vec()).await {
            Ok(evicted) => debug!(
                count = currencies.len(),
                evicted, "Currencies cache updated successfully"
            ),
            Err(e) => warn!(error = %e, "Failed to cache currencies"),
        }
    }

    async fn put_rate(&self, rate: f64, from: &str, to: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let entry = RateEntry::new(rate, from, to);
        match store.rates().upsert(vec![entry]).await {
            Ok(_) => debug!(from, to, rate, "Currency rate added to cache"),
            Err(e) => warn!(error = %e, from, to, "Failed to cache currency rate"),
        }
    }

    async fn get_rate(&self, from: &str, to: &str) -> RateLookup {
        let Some(store) = &self.store else {
            return RateLookup::NotFound;
        };
        let query = query_key(from, to);
        match store.rates().get(&query) {
            Ok(Some(entry)) => {
                debug!("Cache HIT for rate: {}", query);
                RateLookup::Found(CachedRate {
                    rate: entry.value.rate,
                    stored_at: entry.stored_at,
                })
            }
            Ok(None) => {
                debug!("Cache MISS for rate: {}", query);
                RateLookup::NotFound
            }
            Err(e) => {
                warn!(error = %e, query = %query, "Failed to read cached rate");
                RateLookup::NotFound
            }
        }
    }

    async fn get_all_currencies(&self) -> Vec<CurrencyRecord> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.currencies().all() {
            Ok(entries) => entries.into_iter().map(|e| e.value).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to read cached currencies");
                Vec::new()
            }
        }
    }
}
