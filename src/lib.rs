pub mod cli;
pub mod core;
pub mod providers;
pub mod resolver;
pub mod store;
pub mod sync;

use crate::core::config::AppConfig;
use crate::core::{CurrencyRateProvider, OfflineCache};
use crate::providers::CurrencyConverterApi;
use crate::resolver::RateResolver;
use crate::store::CacheGateway;
use crate::sync::CurrencyListSynchronizer;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Currencies,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Cache,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let cache = match config.default_data_path() {
        Ok(path) => CacheGateway::open(&path),
        Err(e) => {
            warn!(error = %e, "No data directory, continuing network-only");
            CacheGateway::unavailable()
        }
    };

    let api = config.api_config();
    let provider: Arc<dyn CurrencyRateProvider> = Arc::new(CurrencyConverterApi::new(
        &api.base_url,
        api.api_key.as_deref(),
        config.retries(),
    )?);
    let offline_cache: Arc<dyn OfflineCache> = Arc::new(cache.clone());

    let result = match command {
        AppCommand::Currencies => {
            let synchronizer =
                CurrencyListSynchronizer::new(provider, offline_cache, config.fetch_timeout());
            cli::currencies::run(&synchronizer).await
        }
        AppCommand::Convert { amount, from, to } => {
            let resolver = RateResolver::new(provider, offline_cache, config.fetch_timeout());
            cli::convert::run(&resolver, &amount, &from, &to).await
        }
        AppCommand::Cache => cli::cache::run(&cache),
    };

    cache.flush();
    result
}
