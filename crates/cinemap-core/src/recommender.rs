//! Request-level operations: next pick, explanation, map.
//!
//! `Recommender` owns the catalog handle and the shared projection cache.
//! Every method takes `&self`, so one instance serves concurrent requests.

use rand::Rng;
use tracing::debug;

use crate::cache::{CacheStatus, ProjectedSpace, ProjectionCache};
use crate::catalog::CatalogStore;
use crate::config::RecommenderConfig;
use crate::error::{Error, Result};
use crate::influence::{self, Influence};
use crate::profile::build_profile;
use crate::projection::{DimensionReducer, UmapReducer};
use crate::selector::{pick_ranked, pick_uniform};
use crate::types::{Item, ItemId, SelectionMode, UserId};

/// Recommendation entry point over a catalog store and a shared projection cache.
pub struct Recommender<S, R: DimensionReducer = UmapReducer> {
    store: S,
    cache: ProjectionCache<R>,
    influence_limit: usize,
}

impl<S: CatalogStore> Recommender<S> {
    /// Recommender with a native UMAP projection cache.
    pub fn new(store: S, config: RecommenderConfig) -> Result<Self> {
        Ok(Self {
            store,
            cache: ProjectionCache::new(config.projection)?,
            influence_limit: config.influence_limit,
        })
    }
}

impl<S: CatalogStore, R: DimensionReducer> Recommender<S, R> {
    /// Recommender with a caller-supplied reducer.
    pub fn with_reducer(store: S, reducer: R, influence_limit: usize) -> Self {
        Self {
            store,
            cache: ProjectionCache::with_reducer(reducer),
            influence_limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ProjectionCache<R> {
        &self.cache
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Next item to show the user.
    ///
    /// `Ranked` uses the user's profile and falls back to `Uniform` when the
    /// user has no profile yet. Fails with `NoUnseenItems` when nothing is
    /// left to recommend.
    pub fn pick_next(&self, user_id: UserId, mode: SelectionMode) -> Result<Item> {
        self.pick_next_with_rng(user_id, mode, &mut rand::thread_rng())
    }

    /// [`Self::pick_next`] with an explicit random source.
    pub fn pick_next_with_rng<G: Rng + ?Sized>(
        &self,
        user_id: UserId,
        mode: SelectionMode,
        rng: &mut G,
    ) -> Result<Item> {
        match mode {
            SelectionMode::Uniform => self.pick_uniform(user_id, rng),
            SelectionMode::Ranked => {
                let feedback = self.store.list_user_feedback(user_id)?;
                match build_profile(&feedback) {
                    Some(profile) => self.pick_ranked(user_id, &profile),
                    None => {
                        debug!("user {} has no profile, picking uniformly", user_id);
                        self.pick_uniform(user_id, rng)
                    }
                }
            }
        }
    }

    fn pick_uniform<G: Rng + ?Sized>(&self, user_id: UserId, rng: &mut G) -> Result<Item> {
        let unseen = self.store.list_unseen_item_ids(user_id)?;
        let item_id = pick_uniform(&unseen, rng).ok_or(Error::NoUnseenItems { user_id })?;
        self.store
            .get_item(item_id)?
            .ok_or(Error::ItemNotFound(item_id))
    }

    fn pick_ranked(&self, user_id: UserId, profile: &[f64]) -> Result<Item> {
        let candidates = self.store.list_unseen_items_with_embeddings(user_id)?;
        let nearest = pick_ranked(profile, &candidates).ok_or(Error::NoUnseenItems { user_id })?;
        debug!(
            "user {}: nearest unseen item {} at cosine distance {:.4}",
            user_id, nearest.item.id, nearest.distance
        );
        Ok(Item::new(
            nearest.item.id,
            nearest.item.title.clone(),
            Some(nearest.item.embedding.clone()),
        ))
    }

    /// Liked items that pull the user toward `target_item_id`, strongest
    /// first.
    ///
    /// Fails with `ItemNotFound` for an unknown target. A target without an
    /// embedding has nothing to explain and yields an empty list.
    pub fn rank_influence(
        &self,
        user_id: UserId,
        target_item_id: ItemId,
    ) -> Result<Vec<Influence>> {
        let target = self
            .store
            .get_item(target_item_id)?
            .ok_or(Error::ItemNotFound(target_item_id))?;
        let Some(embedding) = target.embedding else {
            return Ok(Vec::new());
        };
        let feedback = self.store.list_user_feedback(user_id)?;
        Ok(influence::rank_influence(
            &embedding,
            &feedback,
            self.influence_limit,
        ))
    }

    /// Every catalog item in 2-D plus the user's own position.
    pub fn project_space(&self, user_id: UserId) -> Result<ProjectedSpace> {
        self.cache.project(&self.store, user_id)
    }
}
