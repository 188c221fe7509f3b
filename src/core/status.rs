//! Per-request record of where data came from

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheLookup {
    #[default]
    Pending,
    Hit,
    Miss,
}

/// Created fresh for every request and returned with its result; never shared
/// between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatus {
    pub currencies_from_network: bool,
    pub rate_from_network: bool,
    pub cache_lookup: CacheLookup,
}

impl FetchStatus {
    pub fn cache_resolved(&self) -> bool {
        self.cache_lookup != CacheLookup::Pending
    }
}
