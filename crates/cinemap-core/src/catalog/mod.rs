//! Catalog/feedback collaborator
//!
//! The engine never owns item or rating data. It reads them through the
//! `CatalogStore` trait, which any relational or vector store can implement:
//!
//! - **Memory**: `MemoryCatalog`, used by tests and the `cinemap` CLI
//! - **SQL**: any backend exposing embeddings and per-user ratings
//!
//! # Example
//!
//! ```rust
//! use cinemap_core::catalog::{CatalogStore, MemoryCatalog};
//! use cinemap_core::Item;
//!
//! let store = MemoryCatalog::with_items(vec![
//!     Item::new(1, "Alien", Some(vec![1.0, 0.0])),
//!     Item::new(2, "Brazil", Some(vec![0.0, 1.0])),
//! ])
//! .unwrap();
//!
//! store.record_feedback(42, 1, true).unwrap();
//! assert_eq!(store.list_unseen_item_ids(42).unwrap().len(), 1);
//! ```

mod error;
mod memory;
mod traits;

pub use error::{CatalogError, CatalogResult};
pub use memory::{CatalogSnapshot, FeedbackRecord, MemoryCatalog};
pub use traits::CatalogStore;
