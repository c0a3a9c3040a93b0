//! Unseen-item selection.
//!
//! Two entry points share the contract "pick one unseen item". Neither
//! decides between them: falling back from ranked to uniform when a user
//! has no profile is the orchestrating caller's job.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{EmbeddedItem, ItemId};
use crate::vector::cosine_distance;

/// A ranked pick together with its cosine distance to the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a> {
    pub item: &'a EmbeddedItem,
    pub distance: f64,
}

/// Picks one id uniformly at random from the unseen set.
///
/// Ids are sorted before the draw so a seeded `rng` always yields the same
/// pick for the same set. Returns `None` when the set is empty.
pub fn pick_uniform<R: Rng + ?Sized>(unseen: &HashSet<ItemId>, rng: &mut R) -> Option<ItemId> {
    let mut ids: Vec<ItemId> = unseen.iter().copied().collect();
    ids.sort_unstable();
    ids.choose(rng).copied()
}

/// Picks the candidate with the smallest cosine distance to `profile`.
///
/// Deterministic: equal distances resolve to the earliest candidate.
/// Candidates whose embedding length differs from the profile are ignored.
/// Returns `None` when no candidate qualifies; never substitutes a random
/// pick.
pub fn pick_ranked<'a>(profile: &[f64], candidates: &'a [EmbeddedItem]) -> Option<Nearest<'a>> {
    let mut best: Option<Nearest<'a>> = None;
    for item in candidates {
        if item.embedding.len() != profile.len() {
            continue;
        }
        let distance = cosine_distance(profile, &item.embedding);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Nearest { item, distance });
        }
    }
    best
}
