use thiserror::Error;

use crate::types::RetrievalBranch;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Chunk has no source: {0}")]
    MissingSource(String),

    #[error("{branch} retrieval unavailable: {reason}")]
    RetrievalUnavailable { branch: RetrievalBranch, reason: String },

    #[error("Relevance judgment failed: {0}")]
    GradingJudgmentFailure(String),

    #[error("Reranker unavailable: {0}")]
    RerankUnavailable(String),

    #[error("Model call failed: {0}")]
    Model(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn dense_unavailable(reason: impl ToString) -> Self {
        Self::RetrievalUnavailable { branch: RetrievalBranch::Dense, reason: reason.to_string() }
    }

    pub fn sparse_unavailable(reason: impl ToString) -> Self {
        Self::RetrievalUnavailable { branch: RetrievalBranch::Sparse, reason: reason.to_string() }
    }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    pub fn model(e: impl std::fmt::Display) -> Self { Self::Model(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
