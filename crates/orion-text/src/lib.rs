//! orion-text
//!
//! Tantivy-backed sparse retrieval: an append-only chunk index that serves BM25
//! top-k searches and reports which chunk ids it already holds.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyChunkIndex;
