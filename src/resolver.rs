//! Resolves a single conversion by racing the network against the local cache.
//!
//! Both paths start together. Whichever completes first is handled first, but
//! the outcome does not depend on the order:
//!
//! - a cache hit is shown as a provisional result only while no network
//!   result has been shown;
//! - a network result always replaces whatever is on display and is written
//!   back to the cache;
//! - a network failure falls back to the cache hit, if any, and otherwise
//!   signals an offline failure with a zero result.

use crate::core::cache::{CachedRate, OfflineCache, RateLookup};
use crate::core::conversion::ConversionRequest;
use crate::core::currency::CurrencyRateProvider;
use crate::core::presenter::{OFFLINE_MESSAGE, Presenter};
use crate::core::status::{CacheLookup, FetchStatus};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Network,
    Cache,
    Offline,
}

/// The authoritative outcome of one conversion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub source: RateSource,
    pub rate: Option<f64>,
    /// Converted amount rounded to two decimals, zero when offline.
    pub result: f64,
    pub status: FetchStatus,
}

/// State of one in-flight request. Owned by that request alone.
struct RequestContext<'a> {
    request: &'a ConversionRequest,
    presenter: &'a dyn Presenter,
    status: FetchStatus,
    displayed: Option<(RateSource, f64)>,
}

impl<'a> RequestContext<'a> {
    fn new(request: &'a ConversionRequest, presenter: &'a dyn Presenter) -> Self {
        Self {
            request,
            presenter,
            status: FetchStatus::default(),
            displayed: None,
        }
    }

    fn on_cache(&mut self, lookup: RateLookup) {
        let cached = match lookup {
            RateLookup::Found(cached) => {
                self.status.cache_lookup = CacheLookup::Hit;
                cached
            }
            RateLookup::NotFound => {
                self.status.cache_lookup = CacheLookup::Miss;
                return;
            }
        };

        if self.status.rate_from_network {
            debug!("Network rate already shown, ignoring cached rate");
            return;
        }
        self.show_cached(cached);
    }

    fn show_cached(&mut self, cached: CachedRate) {
        let result = self.request.convert(cached.rate);
        self.presenter.status_message(&format!(
            "Exchange rate : {} (cached {})",
            cached.rate,
            cached.age_display()
        ));
        self.presenter.result(&self.request.to, result);
        self.displayed = Some((RateSource::Cache, cached.rate));
    }

    fn on_network(&mut self, rate: f64) {
        self.status.rate_from_network = true;
        let result = self.request.convert(rate);
        self.presenter
            .status_message(&format!("Exchange rate : {rate}"));
        self.presenter.result(&self.request.to, result);
        self.displayed = Some((RateSource::Network, rate));
    }

    fn finish(self) -> Resolution {
        match self.displayed {
            Some((source, rate)) => Resolution {
                source,
                rate: Some(rate),
                result: self.request.convert(rate),
                status: self.status,
            },
            None => {
                self.presenter.offline_failure(OFFLINE_MESSAGE);
                self.presenter.result(&self.request.to, 0.0);
                Resolution {
                    source: RateSource::Offline,
                    rate: None,
                    result: 0.0,
                    status: self.status,
                }
            }
        }
    }
}

pub struct RateResolver {
    provider: Arc<dyn CurrencyRateProvider>,
    cache: Arc<dyn OfflineCache>,
    fetch_timeout: Duration,
}

impl RateResolver {
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

    #[instrument(
        name = "ResolveRate",
        skip(self, request, presenter),
        fields(from = %request.from, to = %request.to)
    )]
    pub async fn resolve(
        &self,
        request: &ConversionRequest,
        presenter: &dyn Presenter,
    ) -> Resolution {
        let mut ctx = RequestContext::new(request, presenter);

        let cache_lookup = self.cache.get_rate(&request.from, &request.to);
        let network_fetch = timeout(
            self.fetch_timeout,
            self.provider.get_rate(&request.from, &request.to),
        );
        tokio::pin!(cache_lookup, network_fetch);

        loop {
            tokio::select! {
                // When both are ready the network result wins
                biased;

                fetched = &mut network_fetch => {
                    let fetched = match fetched {
                        Ok(Ok(rate)) if rate.is_finite() => Ok(rate),
                        Ok(Ok(rate)) => Err(anyhow!("Received non-finite rate {rate}")),
                        Ok(Err(e)) => Err(e),
                        Err(_) => Err(anyhow!("Timed out after {:?}", self.fetch_timeout)),
                    };

                    match fetched {
                        Ok(rate) => {
                            ctx.on_network(rate);
                            self.cache.put_rate(rate, &request.from, &request.to).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "Network rate fetch failed, falling back to cache");
                            if !ctx.status.cache_resolved() {
                                let lookup = (&mut cache_lookup).await;
                                ctx.on_cache(lookup);
                            }
                        }
                    }
                    break;
                }
                lookup = &mut cache_lookup, if !ctx.status.cache_resolved() => {
                    ctx.on_cache(lookup);
                }
            }
        }

        ctx.finish()
    }
}
