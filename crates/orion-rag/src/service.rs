//! Query boundary: ranked documents plus a synthesized answer.
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use orion_core::error::Result;
use orion_core::traits::AnswerSynthesizer;
use orion_core::types::DocumentChunk;

use crate::pipeline::{PipelineOutcome, RagPipeline, NO_RESULTS_MESSAGE};

/// A citation-ready document as returned to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CitedDocument {
    pub source: String,
    pub time: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl From<&DocumentChunk> for CitedDocument {
    fn from(c: &DocumentChunk) -> Self {
        Self {
            source: c.source.clone(),
            time: c.time().map(str::to_string),
            content: c.content.clone(),
            kind: c.kind().map(|k| k.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResponse {
    pub documents: Vec<CitedDocument>,
    pub response: String,
}

impl QueryResponse {
    pub fn no_results() -> Self { Self { documents: Vec::new(), response: NO_RESULTS_MESSAGE.to_string() } }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}

pub struct RagService {
    pipeline: RagPipeline,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl RagService {
    pub fn new(pipeline: RagPipeline, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self { Self { pipeline, synthesizer } }

    /// Ranked documents without calling the synthesizer.
    pub async fn docs(&self, query: &str) -> Result<PipelineOutcome> { self.pipeline.run(query).await }

    /// Runs the pipeline and, when something matched, asks the synthesizer for an
    /// answer grounded on the ranked documents.
    pub async fn answer(&self, query: &str) -> Result<QueryResponse> {
        let outcome = self.pipeline.run(query).await?;
        if outcome.is_empty() { return Ok(QueryResponse::no_results()); }
        let chunks: Vec<DocumentChunk> = outcome.documents().iter().map(|d| d.chunk.clone()).collect();
        let response = self.synthesizer.synthesize(query, &chunks).await?;
        info!(documents = chunks.len(), chars = response.len(), "answer synthesized");
        Ok(QueryResponse { documents: chunks.iter().map(CitedDocument::from).collect(), response })
    }
}
