//! Cross-encoder reordering of the fused candidates.
use serde::Serialize;
use std::sync::Arc;

use orion_core::error::{Error, Result};
use orion_core::traits::CrossEncoder;
use orion_core::types::{DocumentChunk, RetrievalBranch, ScoredChunk};

/// One entry of the final sequence.
///
/// `relevance` is the cross-encoder score, absent when the fused order was kept
/// because the model could not be invoked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedChunk {
    pub chunk: DocumentChunk,
    pub branch: RetrievalBranch,
    pub retrieval_score: f32,
    pub relevance: Option<f32>,
}

impl RankedChunk {
    fn unscored(c: ScoredChunk) -> Self { Self { chunk: c.chunk, branch: c.branch, retrieval_score: c.score, relevance: None } }
}

pub struct Reranker { encoder: Arc<dyn CrossEncoder> }

impl Reranker {
    pub fn new(encoder: Arc<dyn CrossEncoder>) -> Self { Self { encoder } }

    /// Permutes `candidates` by descending cross-encoder score. Equal scores keep
    /// their incoming order. An empty input never reaches the model.
    pub async fn rerank(&self, candidates: Vec<ScoredChunk>, query: &str) -> Result<Vec<RankedChunk>> {
        if candidates.is_empty() { return Ok(Vec::new()); }
        let passages: Vec<&str> = candidates.iter().map(|c| c.chunk.content.as_str()).collect();
        let scores = self.encoder.score(query, &passages).await.map_err(|e| match e {
            Error::RerankUnavailable(_) => e,
            other => Error::RerankUnavailable(other.to_string()),
        })?;
        if scores.len() != candidates.len() {
            return Err(Error::RerankUnavailable(format!("expected {} scores, got {}", candidates.len(), scores.len())));
        }
        let mut ranked: Vec<RankedChunk> = candidates
            .into_iter()
            .zip(scores)
            .map(|(c, s)| RankedChunk { relevance: Some(s), ..RankedChunk::unscored(c) })
            .collect();
        ranked.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
        Ok(ranked)
    }
}

/// NaN sorts below every real score so the comparison stays a total order.
fn sort_key(c: &RankedChunk) -> f32 {
    match c.relevance {
        Some(s) if !s.is_nan() => s,
        _ => f32::NEG_INFINITY,
    }
}

/// Fused order as-is, without relevance scores.
pub fn keep_fused_order(candidates: Vec<ScoredChunk>) -> Vec<RankedChunk> {
    candidates.into_iter().map(RankedChunk::unscored).collect()
}
