//! Inductive 2-D projection of the item embedding space.
//!
//! A reducer is trained once over every catalog embedding; the fitted model
//! then places new vectors (a user's profile) into the existing layout
//! without retraining. Purely transductive methods such as t-SNE cannot
//! satisfy that contract and are not offered.
//!
//! - [`UmapReducer`] - native UMAP (neighborhood graph + SGD layout)

mod config;
mod umap;

pub use config::{Metric, ProjectionConfig};
pub use umap::{UmapModel, UmapReducer};

use thiserror::Error;

/// A 2-D coordinate.
pub type Point2 = [f64; 2];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid projection config: {0}")]
    InvalidConfig(String),

    #[error("input dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("projector not fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Contract for dimensionality reduction backends.
pub trait DimensionReducer: Send + Sync {
    type Model: FittedProjection;

    /// Fit on `data` (one row per point, all rows the same length).
    fn fit(&self, data: &[Vec<f64>]) -> Result<Self::Model>;
}

/// A trained projector.
pub trait FittedProjection: Send + Sync {
    /// 2-D coordinates of the training points, in training order.
    fn coordinates(&self) -> &[Point2];

    /// Project an unseen vector into the fitted layout.
    fn transform(&self, point: &[f64]) -> Result<Point2>;

    /// Number of training points.
    fn n_points(&self) -> usize {
        self.coordinates().len()
    }
}
