//! Offline cache abstraction used by the resolver and the list synchronizer

use crate::core::currency::CurrencyRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedRate {
    pub rate: f64,
    pub stored_at: DateTime<Utc>,
}

impl CachedRate {
    /// Human readable age of the cached rate, e.g. `5m ago`.
    pub fn age_display(&self) -> String {
        let minutes = (Utc::now() - self.stored_at).num_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{minutes}m ago")
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Outcome of a cached rate lookup. A miss is distinct from any stored rate, zero included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    Found(CachedRate),
    NotFound,
}

impl RateLookup {
    pub fn rate(&self) -> Option<f64> {
        match self {
            RateLookup::Found(cached) => Some(cached.rate),
            RateLookup::NotFound => None,
        }
    }
}

/// Best-effort local cache. Writes never fail from the caller's point of view.
#[async_trait]
pub trait OfflineCache: Send + Sync {
    async fn put_currencies(&self, currencies: &[CurrencyRecord]);
    async fn put_rate(&self, rate: f64, from: &str, to: &str);
    async fn get_rate(&self, from: &str, to: &str) -> RateLookup;
    async fn get_all_currencies(&self) -> Vec<CurrencyRecord>;
}
