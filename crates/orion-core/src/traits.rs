//! Capability seams between the pipeline and its collaborators.
//!
//! Stores, retrievers and models are constructed once by the caller and handed to
//! the pipeline as shared handles.
use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::types::{ChunkId, DocumentChunk, RawDocument, RetrievalBranch, ScoredChunk};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Top-k search over one index. Must return an empty list, not an error, for an
/// empty index.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn branch(&self) -> RetrievalBranch;
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}

/// Persisted chunks keyed by `DocumentChunk::id`. Chunks are immutable once stored.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    fn name(&self) -> &str;
    async fn existing_ids(&self) -> Result<HashSet<ChunkId>>;
    /// Stores `chunks`; callers pass only ids absent from `existing_ids`.
    async fn add(&self, chunks: &[DocumentChunk]) -> Result<usize>;
    async fn count(&self) -> Result<usize>;
    async fn purge(&self) -> Result<()>;
}

/// Binary relevance decision for one chunk.
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    async fn judge(&self, chunk: &DocumentChunk, query: &str) -> Result<bool>;
}

/// Pairwise (query, passage) scoring. One score per passage, same order.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, query: &str, documents: &[DocumentChunk]) -> Result<String>;
}

/// Proposes documentation mutation statements from newly ingested documents.
#[async_trait]
pub trait CurationModel: Send + Sync {
    async fn suggest(&self, docs_structure: &str, new_documents: &[RawDocument]) -> Result<Vec<String>>;
}

/// Executes one mutation statement against the external documentation store.
#[async_trait]
pub trait DocumentationSink: Send + Sync {
    async fn structure(&self) -> Result<String>;
    async fn execute(&self, statement: &str) -> Result<()>;
}
