//! Process-wide projection cache.
//!
//! One fitted projector over the whole catalog is shared by every request.
//! The entry is keyed only by the number of embedded items: while that count
//! is unchanged the entry is reused, any drift forces a full retrain.
//!
//! Readers clone an `Arc` to the current entry under a read lock and work
//! from that snapshot. Rebuilds are serialized by a mutex, run entirely
//! outside the slot lock, and are published with a single write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::profile::build_profile;
use crate::projection::{
    DimensionReducer, FittedProjection, Point2, ProjectionConfig, UmapReducer,
};
use crate::types::{EmbeddedItem, ItemId, Rating, UserId};

/// A published cache generation: the fitted projector plus the item order
/// it was trained on.
#[derive(Debug)]
pub struct ProjectionEntry<M> {
    generation: u64,
    item_ids: Vec<ItemId>,
    titles: Vec<String>,
    index: HashMap<ItemId, usize>,
    model: M,
}

impl<M: FittedProjection> ProjectionEntry<M> {
    /// Monotonic build counter, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Catalog size this entry is valid for.
    pub fn item_count(&self) -> usize {
        self.item_ids.len()
    }

    /// Item ids in training order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// 2-D coordinates in training order.
    pub fn coordinates(&self) -> &[Point2] {
        self.model.coordinates()
    }

    /// The cached coordinate of one item.
    pub fn coordinate_of(&self, item_id: ItemId) -> Option<&Point2> {
        self.index
            .get(&item_id)
            .and_then(|&i| self.model.coordinates().get(i))
    }
}

/// One catalog item placed in the 2-D map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub item_id: ItemId,
    pub title: String,
    pub x: f64,
    pub y: f64,
    /// The requesting user's rating, `None` when unrated.
    pub rating: Option<Rating>,
}

/// The map returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSpace {
    pub points: Vec<ProjectedPoint>,
    /// The user's profile projected into the map, `None` without a profile.
    pub user_point: Option<Point2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Valid,
}

/// Cache introspection for status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub state: CacheState,
    pub item_count: usize,
    pub generation: u64,
}

type Slot<M> = RwLock<Option<Arc<ProjectionEntry<M>>>>;

/// Shared projector cache.
///
/// States: EMPTY, VALID(n). The first request builds; later requests reuse
/// while the embedded item count stays `n`; a different count rebuilds.
pub struct ProjectionCache<R: DimensionReducer = UmapReducer> {
    reducer: R,
    slot: Slot<R::Model>,
    /// Serializes rebuilds.
    rebuild: Mutex<()>,
    /// Last generation handed out.
    generation: AtomicU64,
}

impl ProjectionCache<UmapReducer> {
    /// Cache backed by native UMAP.
    pub fn new(config: ProjectionConfig) -> Result<Self> {
        Ok(Self::with_reducer(UmapReducer::new(config)?))
    }
}

impl<R: DimensionReducer> ProjectionCache<R> {
    /// Empty cache that trains with `reducer`.
    pub fn with_reducer(reducer: R) -> Self {
        Self {
            reducer,
            slot: RwLock::new(None),
            rebuild: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// The backend used for every rebuild.
    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    /// Point-in-time reference to the published entry, if any.
    pub fn snapshot(&self) -> Option<Arc<ProjectionEntry<R::Model>>> {
        self.slot.read().clone()
    }

    pub fn status(&self) -> CacheStatus {
        match self.snapshot() {
            Some(entry) => CacheStatus {
                state: CacheState::Valid,
                item_count: entry.item_count(),
                generation: entry.generation(),
            },
            None => CacheStatus {
                state: CacheState::Empty,
                item_count: 0,
                generation: self.generation.load(Ordering::Acquire),
            },
        }
    }

    /// Drop the published entry. In-flight readers keep their snapshot.
    pub fn clear(&self) {
        let _guard = self.rebuild.lock();
        *self.slot.write() = None;
    }

    fn valid_entry(&self, item_count: usize) -> Option<Arc<ProjectionEntry<R::Model>>> {
        self.snapshot()
            .filter(|entry| entry.item_count() == item_count)
    }

    /// Returns an entry valid for the store's current catalog, training a
    /// new one if needed. `None` when the catalog has no embedded items, in
    /// which case any published entry is dropped and the cache reads EMPTY.
    ///
    /// Concurrent callers that find the entry stale queue on the rebuild
    /// lock; the first one retrains and the rest pick up its result.
    pub fn ensure<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<Arc<ProjectionEntry<R::Model>>>> {
        let count = store.count_items_with_embeddings()?;
        if count == 0 && self.slot.read().is_none() {
            return Ok(None);
        }
        if let Some(entry) = self.valid_entry(count) {
            debug!(
                "projection cache hit: {} items (generation {})",
                count,
                entry.generation()
            );
            return Ok(Some(entry));
        }

        let _rebuild = self.rebuild.lock();

        let count = store.count_items_with_embeddings()?;
        if count == 0 {
            if self.slot.write().take().is_some() {
                debug!("catalog has no embedded items, projection dropped");
            }
            return Ok(None);
        }
        if let Some(entry) = self.valid_entry(count) {
            debug!(
                "projection rebuilt by another request: generation {}",
                entry.generation()
            );
            return Ok(Some(entry));
        }

        let items = store.list_items_with_embeddings()?;
        if items.is_empty() {
            *self.slot.write() = None;
            return Ok(None);
        }

        let start = Instant::now();
        let generation = self.generation.load(Ordering::Acquire) + 1;
        let entry = Arc::new(self.build(items, generation)?);
        self.generation.store(generation, Ordering::Release);
        *self.slot.write() = Some(Arc::clone(&entry));

        info!(
            "projection rebuilt: {} items in {}ms (generation {})",
            entry.item_count(),
            start.elapsed().as_millis(),
            entry.generation()
        );
        Ok(Some(entry))
    }

    fn build(
        &self,
        items: Vec<EmbeddedItem>,
        generation: u64,
    ) -> Result<ProjectionEntry<R::Model>> {
        let mut item_ids = Vec::with_capacity(items.len());
        let mut titles = Vec::with_capacity(items.len());
        let mut embeddings = Vec::with_capacity(items.len());
        for item in items {
            item_ids.push(item.id);
            titles.push(item.title);
            embeddings.push(item.embedding);
        }

        let model = self.reducer.fit(&embeddings)?;
        let index = item_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        Ok(ProjectionEntry {
            generation,
            item_ids,
            titles,
            index,
            model,
        })
    }

    /// Every catalog item in 2-D plus the user's projected profile.
    ///
    /// An empty catalog yields an empty map and no user point.
    pub fn project<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
        user_id: UserId,
    ) -> Result<ProjectedSpace> {
        let Some(entry) = self.ensure(store)? else {
            return Ok(ProjectedSpace::default());
        };

        let feedback = store.list_user_feedback(user_id)?;
        let user_point = match build_profile(&feedback) {
            Some(profile) => Some(entry.model().transform(&profile)?),
            None => None,
        };

        let ratings: HashMap<ItemId, Rating> = feedback
            .iter()
            .map(|row| (row.item_id, row.rating()))
            .collect();

        let points = entry
            .item_ids
            .iter()
            .zip(&entry.titles)
            .zip(entry.coordinates())
            .map(|((&item_id, title), &[x, y])| ProjectedPoint {
                item_id,
                title: title.clone(),
                x,
                y,
                rating: ratings.get(&item_id).copied(),
            })
            .collect();

        debug!(
            "projected space for user {}: generation {}, user point {}",
            user_id,
            entry.generation(),
            if user_point.is_some() { "set" } else { "null" }
        );

        Ok(ProjectedSpace { points, user_point })
    }
}
