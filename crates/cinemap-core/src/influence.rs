//! "Why was this recommended?": ranks a user's liked items by how much
//! each pulls toward a target embedding.

use serde::{Deserialize, Serialize};

use crate::types::{FeedbackRow, ItemId};
use crate::vector::cosine_similarity;

/// Default number of explanations returned.
pub const DEFAULT_INFLUENCE_LIMIT: usize = 5;

/// One past item and its contribution toward the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub item_id: ItemId,
    pub title: String,
    pub liked: bool,
    pub influence: f64,
}

/// Ranks liked feedback rows by `w * cos(e, target)`, highest first.
///
/// Rows without an embedding, or with one whose length differs from the
/// target, are skipped. Equal influences keep their input order. At most
/// `limit` rows are returned.
pub fn rank_influence(target: &[f64], feedback: &[FeedbackRow], limit: usize) -> Vec<Influence> {
    let mut ranked: Vec<Influence> = feedback
        .iter()
        .filter(|row| row.liked)
        .filter_map(|row| {
            let embedding = row.embedding.as_deref()?;
            if embedding.len() != target.len() {
                return None;
            }
            Some(Influence {
                item_id: row.item_id,
                title: row.title.clone(),
                liked: row.liked,
                influence: row.weight() * cosine_similarity(embedding, target),
            })
        })
        .collect();

    // Stable sort: ties stay in feedback order.
    ranked.sort_by(|a, b| b.influence.total_cmp(&a.influence));
    ranked.truncate(limit);
    ranked
}
