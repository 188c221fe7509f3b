//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod log;
pub mod presenter;
pub mod status;

// Re-export main types for cleaner imports
pub use cache::{CachedRate, OfflineCache, RateLookup};
pub use conversion::{ConversionRequest, ValidationError};
pub use currency::{CurrencyRateProvider, CurrencyRecord, RateEntry, query_key};
pub use presenter::{EventLog, OFFLINE_MESSAGE, Presenter};
pub use status::{CacheLookup, FetchStatus};
