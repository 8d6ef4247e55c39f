//! Hybrid retrieval pipeline over a dense and a sparse chunk store: per-branch
//! relevance grading, sparse-first fusion, cross-encoder rerank, and the services
//! around it (ingestion, answer synthesis, curation).
pub mod chat;
pub mod curate;
pub mod fusion;
pub mod grader;
pub mod ingest;
pub mod judge;
pub mod pipeline;
pub mod rerank;
pub mod service;

pub use chat::{ChatClient, LlmAnswerSynthesizer, LlmCurator, LlmJudge};
pub use curate::{CurationReport, Curator};
pub use fusion::fuse;
pub use grader::{Graded, RelevanceGrader};
pub use ingest::{IngestReport, Ingestor};
pub use judge::KeywordJudge;
pub use pipeline::{format_citations, PipelineOutcome, RagPipeline, RankedResult, StageTimings, NO_RESULTS_MESSAGE};
pub use rerank::{RankedChunk, Reranker};
pub use service::{CitedDocument, QueryResponse, RagService};
