use crate::core::cache::OfflineCache;
use crate::core::currency::{CurrencyRateProvider, CurrencyRecord};
use crate::core::presenter::{OFFLINE_MESSAGE, Presenter};
use crate::core::status::{CacheLookup, FetchStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Network,
    Cache,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyList {
    pub currencies: Vec<CurrencyRecord>,
    pub source: ListSource,
    pub status: FetchStatus,
}

/// Keeps the cached currency list in step with the remote API.
pub struct CurrencyListSynchronizer {
    provider: Arc<dyn CurrencyRateProvider>,
    cache: Arc<dyn OfflineCache>,
    fetch_timeout: Duration,
}

impl CurrencyListSynchronizer {
    pub fn new(
        provider: Arc<dyn CurrencyRateProvider>,
        cache: Arc<dyn OfflineCache>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            fetch_timeout,
        }
    }

    /// Races the cached list against a timed network fetch.
    ///
    /// A cached list is pushed to the presenter as soon as it is read, unless
    /// the network list is already there. A network list is authoritative and
    /// written back; on failure the cached list stands.
    #[instrument(name = "SyncCurrencies", skip_all)]
    pub async fn synchronize(&self, presenter: &dyn Presenter) -> CurrencyList {
        let mut status = FetchStatus::default();
        let mut cached: Vec<CurrencyRecord> = Vec::new();
        let mut cached_shown = false;

        let cache_read = self.cache.get_all_currencies();
        let network_fetch = timeout(self.fetch_timeout, self.provider.list_currencies());
        tokio::pin!(cache_read, network_fetch);

        loop {
            tokio::select! {
                // When both are ready the network list wins
                biased;

                fetched = &mut network_fetch => {
                    match fetched {
                        Ok(Ok(currencies)) => {
                            status.currencies_from_network = true;
                            presenter.currencies(&currencies, true);
                            self.cache.put_currencies(&currencies).await;
                            info!(count = currencies.len(), "Currencies fetched from network");
                            return CurrencyList {
                                currencies,
                                source: ListSource::Network,
                                status,
                            };
                        }
                        Ok(Err(e)) => {
                            warn!(error = %e, "Currency list fetch failed, you may be offline");
                        }
                        Err(_) => {
                            warn!(timeout = ?self.fetch_timeout, "Currency list fetch timed out");
                        }
                    }
                    if !status.cache_resolved() {
                        cached = (&mut cache_read).await;
                        status.cache_lookup = lookup_outcome(&cached);
                    }
                    break;
                }
                list = &mut cache_read, if !status.cache_resolved() => {
                    status.cache_lookup = lookup_outcome(&list);
                    if !list.is_empty() {
                        debug!(count = list.len(), "Showing cached currencies");
                        presenter.currencies(&list, false);
                        cached_shown = true;
                    }
                    cached = list;
                }
            }
        }

        if cached.is_empty() {
            presenter.offline_failure(OFFLINE_MESSAGE);
            return CurrencyList {
                currencies: cached,
                source: ListSource::Unavailable,
                status,
            };
        }

        info!(count = cached.len(), "Currencies fetched from cache");
        if !cached_shown {
            presenter.currencies(&cached, false);
        }
        presenter.status_message(OFFLINE_MESSAGE);
        CurrencyList {
            currencies: cached,
            source: ListSource::Cache,
            status,
        }
    }
}

fn lookup_outcome(list: &[CurrencyRecord]) -> CacheLookup {
    if list.is_empty() {
        CacheLookup::Miss
    } else {
        CacheLookup::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::RateLookup;
    use crate::core::presenter::{Event, EventLog};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockProvider {
        currencies: Option<Vec<CurrencyRecord>>,
        hang: bool,
    }

    impl MockProvider {
        fn listing(currencies: Vec<CurrencyRecord>) -> Self {
            Self {
                currencies: Some(currencies),
                hang: false,
            }
        }

        fn failing() -> Self {
            Self {
                currencies: None,
                hang: false,
            }
        }

        fn hanging() -> Self {
            Self {
                currencies: None,
                hang: true,
            }
        }
    }

    #[async_trait]
    impl CurrencyRateProvider for MockProvider {
        async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.currencies
                .clone()
                .ok_or_else(|| anyhow!("connection refused"))
        }

        async fn get_rate(&self, _from: &str, _to: &str) -> Result<f64> {
            Err(anyhow!("not used"))
        }
    }

    #[derive(Default)]
    struct MockCache {
        currencies: Mutex<Vec<CurrencyRecord>>,
    }

    #[async_trait]
    impl OfflineCache for MockCache {
        async fn put_currencies(&self, currencies: &[CurrencyRecord]) {
            *self.currencies.lock().unwrap() = currencies.to_vec();
        }

        async fn put_rate(&self, _rate: f64, _from: &str, _to: &str) {}

        async fn get_rate(&self, _from: &str, _to: &str) -> RateLookup {
            RateLookup::NotFound
        }

        async fn get_all_currencies(&self) -> Vec<CurrencyRecord> {
            self.currencies.lock().unwrap().clone()
        }
    }

    fn euro() -> CurrencyRecord {
        CurrencyRecord::new("EUR", "Euro", Some("€"))
    }

    fn dollar() -> CurrencyRecord {
        CurrencyRecord::new("USD", "United States Dollar", Some("$"))
    }

    fn synchronizer(provider: MockProvider, cache: Arc<MockCache>) -> CurrencyListSynchronizer {
        CurrencyListSynchronizer::new(Arc::new(provider), cache, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_network_list_is_authoritative_and_cached() {
        let cache = Arc::new(MockCache::default());
        cache.put_currencies(&[euro()]).await;
        let provider = MockProvider::listing(vec![euro(), dollar()]);
        let log = EventLog::new();

        let list = synchronizer(provider, cache.clone())
            .synchronize(&log)
            .await;

        assert_eq!(list.source, ListSource::Network);
        assert_eq!(list.currencies, vec![euro(), dollar()]);
        assert!(list.status.currencies_from_network);
        assert_eq!(cache.get_all_currencies().await, vec![euro(), dollar()]);
        // Ready together: the network list is the only one shown
        assert_eq!(
            log.events(),
            vec![Event::Currencies {
                ids: vec!["EUR".to_string(), "USD".to_string()],
                from_network: true,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_list_shown_while_network_hangs() {
        let cache = Arc::new(MockCache::default());
        cache.put_currencies(&[euro()]).await;
        let log = EventLog::new();
        let sync = CurrencyListSynchronizer::new(
            Arc::new(MockProvider::hanging()),
            cache,
            Duration::from_secs(10),
        );

        let early = timeout(Duration::from_secs(1), sync.synchronize(&log)).await;
        assert!(early.is_err(), "network should still be pending");
        assert_eq!(
            log.events(),
            vec![Event::Currencies {
                ids: vec!["EUR".to_string()],
                from_network: false,
            }]
        );

        let log = EventLog::new();
        let start = tokio::time::Instant::now();
        let list = sync.synchronize(&log).await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(list.source, ListSource::Cache);
        assert_eq!(list.status.cache_lookup, CacheLookup::Hit);
        assert_eq!(
            log.events(),
            vec![
                Event::Currencies {
                    ids: vec!["EUR".to_string()],
                    from_network: false,
                },
                Event::Status(OFFLINE_MESSAGE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_network_failure_uses_cached_list() {
        let cache = Arc::new(MockCache::default());
        cache.put_currencies(&[dollar()]).await;
        let log = EventLog::new();

        let list = synchronizer(MockProvider::failing(), cache)
            .synchronize(&log)
            .await;

        assert_eq!(list.source, ListSource::Cache);
        assert_eq!(list.currencies, vec![dollar()]);
        assert!(!list.status.currencies_from_network);
        assert!(!log.has_offline_failure());
        assert_eq!(
            log.events(),
            vec![
                Event::Currencies {
                    ids: vec!["USD".to_string()],
                    from_network: false,
                },
                Event::Status(OFFLINE_MESSAGE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_both_unavailable_yields_empty_list() {
        let cache = Arc::new(MockCache::default());
        let log = EventLog::new();

        let list = synchronizer(MockProvider::failing(), cache)
            .synchronize(&log)
            .await;

        assert_eq!(list.source, ListSource::Unavailable);
        assert!(list.currencies.is_empty());
        assert_eq!(list.status.cache_lookup, CacheLookup::Miss);
        assert_eq!(
            log.events(),
            vec![Event::OfflineFailure(OFFLINE_MESSAGE.to_string())]
        );
    }
}
