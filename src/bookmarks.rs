use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::domain::{Record, RecordId};
use crate::error::PokedexError;
use crate::store::KeyValueStorage;

pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Bookmarked records, unique by id, in insertion order.
///
/// Loaded once from storage; every mutation rewrites the whole serialized
/// sequence under [`BOOKMARKS_KEY`].
pub struct BookmarkStore<S> {
    storage: S,
    records: Vec<Record>,
}

impl<S: KeyValueStorage> BookmarkStore<S> {
    /// Missing or unreadable data starts an empty set.
    pub fn load(storage: S) -> Self {
        let records = match storage.get(BOOKMARKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Record>>(&raw) {
                Ok(records) => dedup_by_id(records),
                Err(err) => {
                    warn!(error = %err, "bookmark data corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "bookmark storage unreadable; starting empty");
                Vec::new()
            }
        };
        debug!(count = records.len(), "bookmarks.load");
        Self { storage, records }
    }

    pub fn toggle(&mut self, record: &Record) -> Result<bool, PokedexError> {
        if self.contains(record.id) {
            self.remove(record.id)?;
            Ok(false)
        } else {
            self.add(record.clone())?;
            Ok(true)
        }
    }

    pub fn add(&mut self, record: Record) -> Result<(), PokedexError> {
        if self.contains(record.id) {
            return Ok(());
        }
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<(), PokedexError> {
        if !self.contains(id) {
            return Ok(());
        }
        let next = self
            .records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        self.commit(next)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.iter().any(|record| record.id == id)
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> BTreeSet<RecordId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Memory only changes once storage has accepted the new set.
    fn commit(&mut self, next: Vec<Record>) -> Result<(), PokedexError> {
        let raw =
            serde_json::to_string(&next).map_err(|err| PokedexError::Storage(err.to_string()))?;
        self.storage.set(BOOKMARKS_KEY, &raw)?;
        debug!(count = next.len(), "bookmarks.persist");
        self.records = next;
        Ok(())
    }
}

fn dedup_by_id(records: Vec<Record>) -> Vec<Record> {
    let mut seen = BTreeSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect()
}
