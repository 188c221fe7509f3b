use super::StoreError;
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use tokio::sync::Mutex;
use tracing::debug;

/// Values stored in a [`BoundedCollection`] are unique by this key.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
}

/// A FIFO collection capped at `capacity` entries.
///
/// Entries live in `entries` under a big-endian sequence number, so iteration
/// follows insertion order. `index` maps each unique key to its sequence
/// number. Overwriting a key keeps its original position.
pub struct BoundedCollection<V> {
    name: &'static str,
    keyspace: Keyspace,
    entries: PartitionHandle,
    index: PartitionHandle,
    capacity: usize,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> BoundedCollection<V>
where
    V: Keyed + Serialize + DeserializeOwned,
{
    pub(crate) fn new(
        name: &'static str,
        keyspace: Keyspace,
        entries: PartitionHandle,
        index: PartitionHandle,
        capacity: usize,
    ) -> Self {
        Self {
            name,
            keyspace,
            entries,
            index,
            capacity,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredEntry<V>>, StoreError> {
        let Some(seq) = self.index.get(key)? else {
            return Ok(None);
        };
        match self.entries.get(&seq)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All entries, oldest-inserted first.
    pub fn all(&self) -> Result<Vec<StoredEntry<V>>, StoreError> {
        self.entries
            .iter()
            .map(|kv| -> Result<StoredEntry<V>, StoreError> {
                let (_, value) = kv?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// Inserts or replaces `items` by key, then evicts the oldest entries
    /// beyond capacity. Both happen in one atomic batch while holding the
    /// collection's write lock. Returns the number of evicted entries.
    pub async fn upsert(&self, items: Vec<V>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let stored_at = Utc::now();

        let mut order = self
            .entries
            .iter()
            .map(|kv| -> Result<u64, StoreError> {
                let (seq, _) = kv?;
                decode_seq(self.name, &seq)
            })
            .collect::<Result<VecDeque<u64>, StoreError>>()?;
        let mut next_seq = order.back().map_or(0, |seq| seq + 1);

        let mut pending: HashMap<u64, (String, V)> = HashMap::new();
        let mut pending_seq: HashMap<String, u64> = HashMap::new();
        for item in items {
            let key = item.key().to_string();
            let seq = match pending_seq.get(&key) {
                Some(seq) => *seq,
                None => match self.index.get(&key)? {
                    Some(seq) => decode_seq(self.name, &seq)?,
                    None => {
                        let seq = next_seq;
                        next_seq += 1;
                        order.push_back(seq);
                        seq
                    }
                },
            };
            pending_seq.insert(key.clone(), seq);
            pending.insert(seq, (key, item));
        }

        let mut batch = self.keyspace.batch();
        let mut evicted = 0;
        while order.len() > self.capacity {
            let Some(seq) = order.pop_front() else {
                break;
            };
            let key = match pending.remove(&seq) {
                Some((key, _)) => Some(key),
                None => self.stored_key(seq)?,
            };
            batch.remove(&self.entries, seq.to_be_bytes().to_vec());
            if let Some(key) = key {
                batch.remove(&self.index, key.into_bytes());
            }
            evicted += 1;
        }

        let written = pending.len();
        for (seq, (key, value)) in pending {
            let entry = StoredEntry { value, stored_at };
            batch.insert(
                &self.entries,
                seq.to_be_bytes().to_vec(),
                serde_json::to_vec(&entry)?,
            );
            batch.insert(&self.index, key.into_bytes(), seq.to_be_bytes().to_vec());
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::Buffer)?;

        debug!(
            collection = self.name,
            written, evicted, "Upserted entries into bounded collection"
        );
        Ok(evicted)
    }

    fn stored_key(&self, seq: u64) -> Result<Option<String>, StoreError> {
        match self.entries.get(seq.to_be_bytes())? {
            Some(bytes) => {
                let entry: StoredEntry<V> = serde_json::from_slice(&bytes)?;
                Ok(Some(entry.value.key().to_string()))
            }
            None => Ok(None),
        }
    }
}

fn decode_seq(collection: &str, bytes: &[u8]) -> Result<u64, StoreError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::CorruptKey(collection.to_string()))?;
    Ok(u64::from_be_bytes(raw))
}
