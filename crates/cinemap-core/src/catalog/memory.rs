//! In-memory catalog backend
//!
//! A BTreeMap-based implementation for tests, the CLI and small deployments.
//! Not suitable for large catalogs: every listing clones its rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::traits::CatalogStore;
use crate::types::{EmbeddedItem, FeedbackRow, Item, ItemId, UserId};

/// One stored feedback signal as it appears in a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub liked: bool,
}

/// Serializable catalog contents: items plus every user's feedback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
}

#[derive(Debug, Clone, Copy)]
struct Signal {
    liked: bool,
    /// Insertion sequence; kept when a rating is overwritten.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<ItemId, Item>,
    feedback: HashMap<UserId, HashMap<ItemId, Signal>>,
    next_seq: u64,
}

impl Inner {
    fn dimension(&self) -> Option<usize> {
        self.items
            .values()
            .find_map(|item| item.embedding.as_ref().map(Vec::len))
    }

    fn rows_for(&self, user_id: UserId) -> Vec<(u64, FeedbackRow)> {
        let Some(signals) = self.feedback.get(&user_id) else {
            return Vec::new();
        };
        signals
            .iter()
            .filter_map(|(item_id, signal)| {
                let item = self.items.get(item_id)?;
                Some((
                    signal.seq,
                    FeedbackRow {
                        item_id: *item_id,
                        title: item.title.clone(),
                        liked: signal.liked,
                        embedding: item.embedding.clone(),
                    },
                ))
            })
            .collect()
    }
}

/// In-memory catalog store.
///
/// Items iterate in id order. Feedback is kept per user with last write
/// wins, so each (user, item) pair has at most one current signal.
/// Interior locking lets one instance be shared by concurrent requests.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: RwLock<Inner>,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with initial items.
    pub fn with_items(items: Vec<Item>) -> CatalogResult<Self> {
        let catalog = Self::new();
        for item in items {
            catalog.insert_item(item)?;
        }
        Ok(catalog)
    }

    /// Load items and feedback from a snapshot.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> CatalogResult<Self> {
        let catalog = Self::with_items(snapshot.items)?;
        for record in snapshot.feedback {
            catalog.record_feedback(record.user_id, record.item_id, record.liked)?;
        }
        Ok(catalog)
    }

    /// Export the current contents, feedback in recording order.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let inner = self.inner.read();
        let mut feedback: Vec<(u64, FeedbackRecord)> = inner
            .feedback
            .iter()
            .flat_map(|(user_id, signals)| {
                signals.iter().map(move |(item_id, signal)| {
                    (
                        signal.seq,
                        FeedbackRecord {
                            user_id: *user_id,
                            item_id: *item_id,
                            liked: signal.liked,
                        },
                    )
                })
            })
            .collect();
        feedback.sort_by_key(|(seq, _)| *seq);

        CatalogSnapshot {
            items: inner.items.values().cloned().collect(),
            feedback: feedback.into_iter().map(|(_, record)| record).collect(),
        }
    }

    /// Insert or replace an item.
    ///
    /// Rejects embeddings whose length differs from the embeddings already
    /// in the catalog.
    pub fn insert_item(&self, item: Item) -> CatalogResult<()> {
        let mut inner = self.inner.write();
        if let Some(embedding) = &item.embedding {
            if embedding.is_empty() {
                return Err(CatalogError::InvalidData(format!(
                    "item {} has an empty embedding",
                    item.id
                )));
            }
            let existing = inner
                .items
                .iter()
                .filter(|(id, _)| **id != item.id)
                .find_map(|(_, other)| other.embedding.as_ref().map(Vec::len));
            if let Some(expected) = existing {
                if expected != embedding.len() {
                    return Err(CatalogError::DimensionMismatch {
                        expected,
                        got: embedding.len(),
                    });
                }
            }
        }
        inner.items.insert(item.id, item);
        Ok(())
    }

    /// Remove an item and every feedback row pointing at it.
    ///
    /// Returns `true` if the item existed.
    pub fn remove_item(&self, item_id: ItemId) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.items.remove(&item_id).is_some();
        if removed {
            for signals in inner.feedback.values_mut() {
                signals.remove(&item_id);
            }
        }
        removed
    }

    /// Record a thumbs up/down. Overwrites any earlier signal for the pair.
    pub fn record_feedback(
        &self,
        user_id: UserId,
        item_id: ItemId,
        liked: bool,
    ) -> CatalogResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if !inner.items.contains_key(&item_id) {
            return Err(CatalogError::InvalidData(format!(
                "cannot rate unknown item {}",
                item_id
            )));
        }
        let signals = inner.feedback.entry(user_id).or_default();
        if let Some(signal) = signals.get_mut(&item_id) {
            signal.liked = liked;
        } else {
            signals.insert(
                item_id,
                Signal {
                    liked,
                    seq: inner.next_seq,
                },
            );
            inner.next_seq += 1;
        }
        Ok(())
    }

    /// Forget every signal the user has given. Returns how many were removed.
    pub fn reset_feedback(&self, user_id: UserId) -> usize {
        self.inner
            .write()
            .feedback
            .remove(&user_id)
            .map_or(0, |signals| signals.len())
    }

    /// The user's feedback, most recently recorded first.
    pub fn history(&self, user_id: UserId) -> Vec<FeedbackRow> {
        let mut rows = self.inner.read().rows_for(user_id);
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Embedding dimension of the catalog, if any item is embedded.
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().dimension()
    }

    /// Total number of items, embedded or not.
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogStore for MemoryCatalog {
    fn list_items_with_embeddings(&self) -> CatalogResult<Vec<EmbeddedItem>> {
        Ok(self
            .inner
            .read()
            .items
            .values()
            .filter_map(|item| item.clone().into_embedded())
            .collect())
    }

    fn list_unseen_item_ids(&self, user_id: UserId) -> CatalogResult<HashSet<ItemId>> {
        let inner = self.inner.read();
        let seen = inner.feedback.get(&user_id);
        Ok(inner
            .items
            .keys()
            .filter(|id| seen.map_or(true, |signals| !signals.contains_key(*id)))
            .copied()
            .collect())
    }

    fn list_user_feedback(&self, user_id: UserId) -> CatalogResult<Vec<FeedbackRow>> {
        let mut rows = self.inner.read().rows_for(user_id);
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn get_item(&self, item_id: ItemId) -> CatalogResult<Option<Item>> {
        Ok(self.inner.read().items.get(&item_id).cloned())
    }

    fn count_items_with_embeddings(&self) -> CatalogResult<usize> {
        Ok(self
            .inner
            .read()
            .items
            .values()
            .filter(|item| item.embedding.is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::with_items(vec![
            Item::new(1, "Alien", Some(vec![1.0, 0.0])),
            Item::new(2, "Brazil", Some(vec![0.0, 1.0])),
            Item::new(3, "Casablanca", None),
        ])
        .unwrap()
    }

    #[test]
    fn test_lists_only_embedded_items() {
        let store = catalog();
        let ids: Vec<ItemId> = store
            .list_items_with_embeddings()
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.count_items_with_embeddings().unwrap(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unseen_is_complement_of_feedback() {
        let store = catalog();
        store.record_feedback(7, 1, true).unwrap();

        let unseen = store.list_unseen_item_ids(7).unwrap();
        assert_eq!(unseen, HashSet::from([2, 3]));

        let embedded_unseen: Vec<ItemId> = store
            .list_unseen_items_with_embeddings(7)
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(embedded_unseen, vec![2]);
    }

    #[test]
    fn test_feedback_last_write_wins() {
        let store = catalog();
        store.record_feedback(7, 1, true).unwrap();
        store.record_feedback(7, 2, false).unwrap();
        store.record_feedback(7, 1, false).unwrap();

        let rows = store.list_user_feedback(7).unwrap();
        assert_eq!(rows.len(), 2);
        // Overwriting keeps the original position.
        assert_eq!(rows[0].item_id, 1);
        assert!(!rows[0].liked);
        assert_eq!(rows[1].item_id, 2);
    }

    #[test]
    fn test_history_most_recent_first() {
        let store = catalog();
        store.record_feedback(7, 1, true).unwrap();
        store.record_feedback(7, 3, true).unwrap();
        let titles: Vec<String> = store.history(7).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Casablanca".to_string(), "Alien".to_string()]);
    }

    #[test]
    fn test_reset_feedback() {
        let store = catalog();
        store.record_feedback(7, 1, true).unwrap();
        store.record_feedback(7, 2, true).unwrap();
        assert_eq!(store.reset_feedback(7), 2);
        assert_eq!(store.reset_feedback(7), 0);
        assert_eq!(store.list_unseen_item_ids(7).unwrap().len(), 3);
    }

    #[test]
    fn test_rating_unknown_item_fails() {
        let store = catalog();
        assert!(matches!(
            store.record_feedback(7, 99, true),
            Err(CatalogError::InvalidData(_))
        ));
    }

    #[test]
    fn test_dimension_enforced() {
        let store = catalog();
        let err = store
            .insert_item(Item::new(4, "Dune", Some(vec![1.0, 2.0, 3.0])))
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        ));
        // Replacing an item with a same-dimension embedding is fine.
        store
            .insert_item(Item::new(1, "Alien", Some(vec![0.5, 0.5])))
            .unwrap();
        assert_eq!(store.dimension(), Some(2));
    }

    #[test]
    fn test_remove_item_cascades_feedback() {
        let store = catalog();
        store.record_feedback(7, 2, true).unwrap();
        assert!(store.remove_item(2));
        assert!(!store.remove_item(2));
        assert!(store.list_user_feedback(7).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_order() {
        let store = catalog();
        store.record_feedback(7, 2, false).unwrap();
        store.record_feedback(8, 1, true).unwrap();

        let snapshot = store.snapshot();
        let restored = MemoryCatalog::from_snapshot(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(snapshot.feedback[0].user_id, 7);
    }
}
