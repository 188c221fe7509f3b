pub mod bounded;
pub mod gateway;

use crate::core::currency::{CurrencyRecord, RateEntry};
use bounded::{BoundedCollection, Keyed};
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use gateway::CacheGateway;

/// Directory name of the local store under the data path.
pub const STORE_NAME: &str = "currencyConverter";
pub const SCHEMA_VERSION: u32 = 4;

pub const CURRENCY_CAPACITY: usize = 160;
pub const RATE_CAPACITY: usize = 50;

const META: &str = "meta";
const CURRENCIES: &str = "currencies";
const CURRENCIES_BY_ID: &str = "currencies_by_id";
const CURRENCY_RATES: &str = "currency_rates";
const CURRENCY_RATES_BY_QUERY: &str = "currency_rates_by_query";

const SCHEMA_VERSION_KEY: &str = "schema_version";
const CREATED_AT_KEY: &str = "created_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] fjall::Error),
    #[error("failed to encode or decode cache entry: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt sequence key in collection {0}")]
    CorruptKey(String),
    #[error("collection {0} is missing, schema version {1} does not define it")]
    MissingCollection(&'static str, u32),
}

impl Keyed for CurrencyRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for RateEntry {
    fn key(&self) -> &str {
        &self.query
    }
}

/// One additive schema step. Steps never drop or rewrite existing data.
struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(&Keyspace, &PartitionHandle) -> Result<(), StoreError>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create currencies collection",
        apply: create_currencies,
    },
    Migration {
        version: 2,
        description: "index currencies by id",
        apply: create_currency_index,
    },
    Migration {
        version: 3,
        description: "create currency rates collection and query index",
        apply: create_rates,
    },
    Migration {
        version: 4,
        description: "record store creation time",
        apply: record_created_at,
    },
];

fn create_partition(keyspace: &Keyspace, name: &str) -> Result<(), StoreError> {
    keyspace.open_partition(name, PartitionCreateOptions::default())?;
    Ok(())
}

fn create_currencies(keyspace: &Keyspace, _meta: &PartitionHandle) -> Result<(), StoreError> {
    create_partition(keyspace, CURRENCIES)
}

fn create_currency_index(keyspace: &Keyspace, _meta: &PartitionHandle) -> Result<(), StoreError> {
    create_partition(keyspace, CURRENCIES_BY_ID)
}

fn create_rates(keyspace: &Keyspace, _meta: &PartitionHandle) -> Result<(), StoreError> {
    create_partition(keyspace, CURRENCY_RATES)?;
    create_partition(keyspace, CURRENCY_RATES_BY_QUERY)
}

fn record_created_at(_keyspace: &Keyspace, meta: &PartitionHandle) -> Result<(), StoreError> {
    if meta.get(CREATED_AT_KEY)?.is_none() {
        meta.insert(CREATED_AT_KEY, Utc::now().to_rfc3339().into_bytes())?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub schema_version: u32,
    pub currencies: usize,
    pub currency_capacity: usize,
    pub rates: usize,
    pub rate_capacity: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Versioned local store holding the currency and rate collections.
pub struct Store {
    keyspace: Keyspace,
    meta: PartitionHandle,
    schema_version: u32,
    currencies: BoundedCollection<CurrencyRecord>,
    rates: BoundedCollection<RateEntry>,
}

impl Store {
    /// Opens the store under `data_path`, creating or upgrading the schema.
    pub fn open(data_path: &Path) -> Result<Self, StoreError> {
        let path = data_path.join(STORE_NAME);
        std::fs::create_dir_all(&path)?;

        let keyspace = fjall::Config::new(&path).open()?;
        let meta = keyspace.open_partition(META, PartitionCreateOptions::default())?;
        let schema_version = migrate(&keyspace, &meta)?;

        let currencies = BoundedCollection::new(
            CURRENCIES,
            keyspace.clone(),
            existing_partition(&keyspace, CURRENCIES, schema_version)?,
            existing_partition(&keyspace, CURRENCIES_BY_ID, schema_version)?,
            CURRENCY_CAPACITY,
        );
        let rates = BoundedCollection::new(
            CURRENCY_RATES,
            keyspace.clone(),
            existing_partition(&keyspace, CURRENCY_RATES, schema_version)?,
            existing_partition(&keyspace, CURRENCY_RATES_BY_QUERY, schema_version)?,
            RATE_CAPACITY,
        );

        info!(path = %path.display(), schema_version, "Opened local store");
        Ok(Self {
            keyspace,
            meta,
            schema_version,
            currencies,
            rates,
        })
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn currencies(&self) -> &BoundedCollection<CurrencyRecord> {
        &self.currencies
    }

    pub fn rates(&self) -> &BoundedCollection<RateEntry> {
        &self.rates
    }

    pub fn created_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .meta
            .get(CREATED_AT_KEY)?
            .and_then(|raw| std::str::from_utf8(&raw).ok().map(str::to_string))
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn stats(&self) -> Result<CacheStats, StoreError> {
        let currencies = self.currencies.all()?;
        let rates = self.rates.all()?;
        let last_updated = currencies
            .iter()
            .map(|e| e.stored_at)
            .chain(rates.iter().map(|e| e.stored_at))
            .max();

        Ok(CacheStats {
            schema_version: self.schema_version,
            currencies: currencies.len(),
            currency_capacity: self.currencies.capacity(),
            rates: rates.len(),
            rate_capacity: self.rates.capacity(),
            created_at: self.created_at()?,
            last_updated,
        })
    }

    /// Syncs buffered writes to disk.
    pub fn persist(&self) -> Result<(), StoreError> {
        Ok(self.keyspace.persist(PersistMode::SyncAll)?)
    }

    #[cfg(test)]
    pub(crate) fn force_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.meta
            .insert(SCHEMA_VERSION_KEY, version.to_be_bytes().to_vec())?;
        self.persist()
    }
}

fn read_schema_version(meta: &PartitionHandle) -> Result<u32, StoreError> {
    match meta.get(SCHEMA_VERSION_KEY)? {
        Some(raw) => {
            let bytes = <[u8; 4]>::try_from(&*raw)
                .map_err(|_| StoreError::CorruptKey(META.to_string()))?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

/// Applies every migration newer than the stored version, in order.
fn migrate(keyspace: &Keyspace, meta: &PartitionHandle) -> Result<u32, StoreError> {
    let stored = read_schema_version(meta)?;
    if stored > SCHEMA_VERSION {
        warn!(
            stored,
            supported = SCHEMA_VERSION,
            "Store was written by a newer version, leaving schema untouched"
        );
        return Ok(stored);
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > stored) {
        debug!(
            version = migration.version,
            "Applying store migration: {}", migration.description
        );
        (migration.apply)(keyspace, meta)?;
        meta.insert(SCHEMA_VERSION_KEY, migration.version.to_be_bytes().to_vec())?;
    }
    keyspace.persist(PersistMode::SyncAll)?;

    Ok(SCHEMA_VERSION)
}

fn existing_partition(
    keyspace: &Keyspace,
    name: &'static str,
    schema_version: u32,
) -> Result<PartitionHandle, StoreError> {
    if !keyspace.partition_exists(name) {
        return Err(StoreError::MissingCollection(name, schema_version));
    }
    Ok(keyspace.open_partition(name, PartitionCreateOptions::default())?)
}
