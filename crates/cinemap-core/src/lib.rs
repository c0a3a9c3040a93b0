//! Cinemap Core Engine
//!
//! Recommends unseen catalog items from binary feedback and maps the whole
//! item embedding space into two dimensions for visualization.
//!
//! The engine reads items and ratings through the [`CatalogStore`] trait and
//! never writes to it. Everything is synchronous; one [`Recommender`] can be
//! shared across request threads.
//!
//! # Features
//!
//! - `parallel` - Parallel neighbor search via rayon when training the projector
//!
//! # Example
//!
//! ```rust
//! use cinemap_core::{Item, MemoryCatalog, Recommender, RecommenderConfig, SelectionMode};
//!
//! let store = MemoryCatalog::with_items(vec![
//!     Item::new(1, "Alien", Some(vec![1.0, 0.0])),
//!     Item::new(2, "Brazil", Some(vec![0.0, 1.0])),
//!     Item::new(3, "Casablanca", Some(vec![-1.0, 0.0])),
//! ])
//! .unwrap();
//! store.record_feedback(42, 1, true).unwrap();
//! store.record_feedback(42, 3, false).unwrap();
//!
//! let recommender = Recommender::new(store, RecommenderConfig::default()).unwrap();
//! let next = recommender.pick_next(42, SelectionMode::Ranked).unwrap();
//! assert_eq!(next.id, 2);
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod influence;
pub mod profile;
pub mod projection;
pub mod recommender;
pub mod selector;
pub mod types;
pub mod vector;

// Re-export main types at crate root
pub use cache::{CacheState, CacheStatus, ProjectedPoint, ProjectedSpace, ProjectionCache};
pub use catalog::{CatalogError, CatalogSnapshot, CatalogStore, FeedbackRecord, MemoryCatalog};
pub use config::RecommenderConfig;
pub use error::{Error, Result};
pub use influence::Influence;
pub use profile::build_profile;
pub use projection::{
    DimensionReducer, FittedProjection, Metric, Point2, ProjectionConfig, ProjectionError,
    UmapModel, UmapReducer,
};
pub use recommender::Recommender;
pub use types::{EmbeddedItem, FeedbackRow, Item, ItemId, Rating, SelectionMode, UserId};
