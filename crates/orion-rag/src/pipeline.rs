//! Query lifecycle: retrieve both branches, grade each, fuse, rerank, format.
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use orion_core::error::Result;
use orion_core::traits::{CrossEncoder, RelevanceJudge, Retriever};
use orion_core::types::{DocumentChunk, ScoredChunk};

use crate::fusion::fuse;
use crate::grader::RelevanceGrader;
use crate::rerank::{keep_fused_order, RankedChunk, Reranker};

pub const NO_RESULTS_MESSAGE: &str = "Unable to find matching results.";
pub const DEFAULT_TOP_K: usize = 5;

/// Wall time of each stage. Branch stages run concurrently, so they overlap.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StageTimings {
    pub dense_retrieval: Duration,
    pub sparse_retrieval: Duration,
    pub dense_grading: Duration,
    pub sparse_grading: Duration,
    pub fusion: Duration,
    pub rerank: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Nothing retrieved, or nothing judged relevant. Not an error.
    NoResults { timings: StageTimings },
    Ranked(RankedResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub documents: Vec<RankedChunk>,
    /// One `source`/`time` entry per document, in rank order.
    pub citations: String,
    /// False when the cross-encoder failed and fused order was kept.
    pub reranked: bool,
    pub timings: StageTimings,
}

impl PipelineOutcome {
    pub fn documents(&self) -> &[RankedChunk] {
        match self {
            Self::NoResults { .. } => &[],
            Self::Ranked(r) => &r.documents,
        }
    }

    /// Citation text, or the sentinel message when nothing matched.
    pub fn citations(&self) -> &str {
        match self {
            Self::NoResults { .. } => NO_RESULTS_MESSAGE,
            Self::Ranked(r) => &r.citations,
        }
    }

    pub fn timings(&self) -> &StageTimings {
        match self {
            Self::NoResults { timings } => timings,
            Self::Ranked(r) => &r.timings,
        }
    }

    pub fn is_empty(&self) -> bool { matches!(self, Self::NoResults { .. }) }
}

/// Long-lived query pipeline. Handles are built once by the caller and shared
/// across queries; a query holds no state beyond its own candidate lists.
pub struct RagPipeline {
    dense: Arc<dyn Retriever>,
    sparse: Arc<dyn Retriever>,
    grader: RelevanceGrader,
    reranker: Reranker,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        dense: Arc<dyn Retriever>,
        sparse: Arc<dyn Retriever>,
        judge: Arc<dyn RelevanceJudge>,
        cross_encoder: Arc<dyn CrossEncoder>,
    ) -> Self {
        Self { dense, sparse, grader: RelevanceGrader::new(judge), reranker: Reranker::new(cross_encoder), top_k: DEFAULT_TOP_K }
    }

    /// Results requested from each branch. Zero is raised to one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Runs one query. Fails only when both retrieval branches fail.
    pub async fn run(&self, query: &str) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let mut timings = StageTimings::default();

        let ((dense, dense_time), (sparse, sparse_time)) =
            tokio::join!(timed(self.dense.search(query, self.top_k)), timed(self.sparse.search(query, self.top_k)));
        timings.dense_retrieval = dense_time;
        timings.sparse_retrieval = sparse_time;

        let (dense, sparse) = match (dense, sparse) {
            (Ok(d), Ok(s)) => (d, s),
            (Ok(d), Err(e)) => { warn!(branch = %self.sparse.branch(), error = %e, "branch unavailable, treating as empty"); (d, Vec::new()) }
            (Err(e), Ok(s)) => { warn!(branch = %self.dense.branch(), error = %e, "branch unavailable, treating as empty"); (Vec::new(), s) }
            (Err(dense_err), Err(sparse_err)) => {
                warn!(dense = %dense_err, sparse = %sparse_err, "both retrieval branches unavailable");
                return Err(dense_err);
            }
        };
        debug!(dense = dense.len(), sparse = sparse.len(), "retrieved");

        if dense.is_empty() && sparse.is_empty() {
            return Ok(self.no_results(query, "nothing retrieved", timings, started));
        }

        let ((graded_dense, dense_time), (graded_sparse, sparse_time)) =
            tokio::join!(timed(self.grader.grade(dense, query)), timed(self.grader.grade(sparse, query)));
        timings.dense_grading = dense_time;
        timings.sparse_grading = sparse_time;
        debug!(
            dense_relevant = graded_dense.relevant.len(),
            dense_irrelevant = graded_dense.irrelevant.len(),
            sparse_relevant = graded_sparse.relevant.len(),
            sparse_irrelevant = graded_sparse.irrelevant.len(),
            "graded"
        );

        if graded_dense.relevant.is_empty() && graded_sparse.relevant.is_empty() {
            return Ok(self.no_results(query, "nothing relevant", timings, started));
        }

        let fuse_start = Instant::now();
        let fused = fuse(graded_sparse.relevant, graded_dense.relevant);
        timings.fusion = fuse_start.elapsed();

        let (ranked, rerank_time) = timed(self.rerank_or_keep(fused, query)).await;
        timings.rerank = rerank_time;
        let (documents, reranked) = ranked;

        let citations = format_citations(documents.iter().map(|d| &d.chunk));
        timings.total = started.elapsed();
        log_timings(&timings);
        info!(query, documents = documents.len(), reranked, "query answered");
        Ok(PipelineOutcome::Ranked(RankedResult { documents, citations, reranked, timings }))
    }

    async fn rerank_or_keep(&self, fused: Vec<ScoredChunk>, query: &str) -> (Vec<RankedChunk>, bool) {
        // rerank consumes its input; the copy backs the fallback
        match self.reranker.rerank(fused.clone(), query).await {
            Ok(ranked) => (ranked, true),
            Err(e) => {
                warn!(error = %e, "rerank failed, keeping fused order");
                (keep_fused_order(fused), false)
            }
        }
    }

    fn no_results(&self, query: &str, reason: &str, mut timings: StageTimings, started: Instant) -> PipelineOutcome {
        timings.total = started.elapsed();
        log_timings(&timings);
        info!(query, reason, "no results");
        PipelineOutcome::NoResults { timings }
    }
}

/// `"\n{source} \nTime {time} \n"` per document, concatenated. A missing time
/// renders as `None`.
pub fn format_citations<'a>(documents: impl IntoIterator<Item = &'a DocumentChunk>) -> String {
    documents
        .into_iter()
        .map(|d| format!("\n{} \nTime {} \n", d.source, d.time().unwrap_or("None")))
        .collect()
}

async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}

fn log_timings(t: &StageTimings) {
    debug!(
        dense_retrieval_ms = t.dense_retrieval.as_millis() as u64,
        sparse_retrieval_ms = t.sparse_retrieval.as_millis() as u64,
        dense_grading_ms = t.dense_grading.as_millis() as u64,
        sparse_grading_ms = t.sparse_grading.as_millis() as u64,
        fusion_us = t.fusion.as_micros() as u64,
        rerank_ms = t.rerank.as_millis() as u64,
        total_ms = t.total.as_millis() as u64,
        "stage timings"
    );
}
