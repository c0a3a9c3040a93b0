//! Domain types shared across the engine.

use serde::{Deserialize, Serialize};

/// Catalog item identifier.
pub type ItemId = i64;

/// User identifier.
pub type UserId = i64;

/// Fixed-dimension item embedding. All embeddings in one catalog snapshot
/// share the same length.
pub type Embedding = Vec<f64>;

/// A catalog item as returned by a point lookup.
///
/// `embedding` is `None` for items that were never embedded; such items are
/// excluded from every vector operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, embedding: Option<Embedding>) -> Self {
        Self {
            id,
            title: title.into(),
            embedding,
        }
    }

    /// Converts into an [`EmbeddedItem`] if this item carries an embedding.
    pub fn into_embedded(self) -> Option<EmbeddedItem> {
        let embedding = self.embedding?;
        Some(EmbeddedItem {
            id: self.id,
            title: self.title,
            embedding,
        })
    }
}

/// A catalog item guaranteed to carry an embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedItem {
    pub id: ItemId,
    pub title: String,
    pub embedding: Embedding,
}

/// Binary feedback a user gave an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Liked,
    Disliked,
}

impl Rating {
    pub fn from_liked(liked: bool) -> Self {
        if liked {
            Rating::Liked
        } else {
            Rating::Disliked
        }
    }

    pub fn is_liked(self) -> bool {
        matches!(self, Rating::Liked)
    }

    /// Liked maps to +1.0, disliked to -1.0.
    pub fn weight(self) -> f64 {
        match self {
            Rating::Liked => 1.0,
            Rating::Disliked => -1.0,
        }
    }
}

/// One current feedback signal joined to its item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub item_id: ItemId,
    pub title: String,
    pub liked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

impl FeedbackRow {
    pub fn rating(&self) -> Rating {
        Rating::from_liked(self.liked)
    }

    pub fn weight(&self) -> f64 {
        self.rating().weight()
    }
}

/// Selection policy for [`crate::Recommender::pick_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Uniformly random unseen item.
    #[default]
    Uniform,
    /// Unseen item closest to the user's profile vector; falls back to
    /// uniform when the user has no profile yet.
    Ranked,
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" | "random" => Ok(SelectionMode::Uniform),
            "ranked" | "nearest" => Ok(SelectionMode::Ranked),
            other => Err(format!(
                "unknown selection mode '{}', expected one of: uniform, ranked",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_weights() {
        assert_eq!(Rating::from_liked(true).weight(), 1.0);
        assert_eq!(Rating::from_liked(false).weight(), -1.0);
        assert!(Rating::Liked.is_liked());
    }

    #[test]
    fn parse_selection_mode() {
        assert_eq!("Ranked".parse::<SelectionMode>(), Ok(SelectionMode::Ranked));
        assert_eq!("random".parse::<SelectionMode>(), Ok(SelectionMode::Uniform));
        assert!("best".parse::<SelectionMode>().is_err());
    }

    #[test]
    fn item_without_embedding_is_not_embedded() {
        assert!(Item::new(1, "Heat", None).into_embedded().is_none());
        let embedded = Item::new(2, "Ronin", Some(vec![0.5])).into_embedded();
        assert_eq!(embedded.map(|e| e.embedding), Some(vec![0.5]));
    }
}
