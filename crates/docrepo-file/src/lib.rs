//! docrepo-file - Filesystem-backed document store.
//!
//! [`FileStore`] implements [`DocumentStore`](docrepo_core::DocumentStore)
//! on a local directory and evaluates queries with the core evaluator.

mod store;

pub use store::FileStore;
