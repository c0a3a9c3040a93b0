//! Engine error types

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::projection::ProjectionError;
use crate::types::{ItemId, UserId};

/// Errors surfaced by the recommendation operations.
///
/// A missing preference profile is not an error: it is an `Option::None`
/// that callers resolve by falling back to uniform selection or a null
/// user point.
#[derive(Debug, Error)]
pub enum Error {
    /// The user has rated every candidate item
    #[error("no unseen items left for user {user_id}")]
    NoUnseenItems { user_id: UserId },

    /// Item id not present in the catalog
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Catalog collaborator failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Projector training or transform failure
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl Error {
    /// Whether this is a "nothing to return" condition the caller should
    /// present to the user rather than treat as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoUnseenItems { .. } | Error::ItemNotFound(_))
    }
}

/// Result type alias using the engine error.
pub type Result<T> = std::result::Result<T, Error>;
