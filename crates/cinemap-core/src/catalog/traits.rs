//! Catalog trait definitions

use std::collections::HashSet;

use crate::catalog::error::CatalogResult;
use crate::types::{EmbeddedItem, FeedbackRow, Item, ItemId, UserId};

/// Read-only view of the catalog and of users' feedback.
///
/// This is the only collaborator the engine talks to. It is designed to be
/// backed by anything that can answer these queries:
/// - Native: PostgreSQL with pgvector, SQLite
/// - Testing: In-memory
///
/// Implementations guarantee at most one current feedback row per
/// (user, item) pair; the engine does not deduplicate.
pub trait CatalogStore: Send + Sync {
    /// All items that carry an embedding, in a stable order.
    fn list_items_with_embeddings(&self) -> CatalogResult<Vec<EmbeddedItem>>;

    /// Ids of every item the user has not rated (embedded or not).
    fn list_unseen_item_ids(&self, user_id: UserId) -> CatalogResult<HashSet<ItemId>>;

    /// The user's current feedback, each row joined to its item.
    fn list_user_feedback(&self, user_id: UserId) -> CatalogResult<Vec<FeedbackRow>>;

    /// Retrieve an item by id.
    ///
    /// Returns `None` if not found.
    fn get_item(&self, item_id: ItemId) -> CatalogResult<Option<Item>>;

    /// Number of items carrying an embedding.
    ///
    /// Used as the projection cache's validity key; backends should
    /// override this with a cheap count query.
    fn count_items_with_embeddings(&self) -> CatalogResult<usize> {
        Ok(self.list_items_with_embeddings()?.len())
    }

    /// Embedded items the user has not rated, in catalog order.
    fn list_unseen_items_with_embeddings(
        &self,
        user_id: UserId,
    ) -> CatalogResult<Vec<EmbeddedItem>> {
        let unseen = self.list_unseen_item_ids(user_id)?;
        Ok(self
            .list_items_with_embeddings()?
            .into_iter()
            .filter(|item| unseen.contains(&item.id))
            .collect())
    }
}

impl<S: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<S> {
    fn list_items_with_embeddings(&self) -> CatalogResult<Vec<EmbeddedItem>> {
        (**self).list_items_with_embeddings()
    }

    fn list_unseen_item_ids(&self, user_id: UserId) -> CatalogResult<HashSet<ItemId>> {
        (**self).list_unseen_item_ids(user_id)
    }

    fn list_user_feedback(&self, user_id: UserId) -> CatalogResult<Vec<FeedbackRow>> {
        (**self).list_user_feedback(user_id)
    }

    fn get_item(&self, item_id: ItemId) -> CatalogResult<Option<Item>> {
        (**self).get_item(item_id)
    }

    fn count_items_with_embeddings(&self) -> CatalogResult<usize> {
        (**self).count_items_with_embeddings()
    }

    fn list_unseen_items_with_embeddings(
        &self,
        user_id: UserId,
    ) -> CatalogResult<Vec<EmbeddedItem>> {
        (**self).list_unseen_items_with_embeddings(user_id)
    }
}
