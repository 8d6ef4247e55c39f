#![allow(dead_code)]
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orion_core::error::{Error, Result};
use orion_core::traits::{AnswerSynthesizer, CrossEncoder, RelevanceJudge, Retriever};
use orion_core::types::{DocumentChunk, Meta, RetrievalBranch, ScoredChunk};

pub fn chunk(id: &str, content: &str) -> DocumentChunk {
    let mut metadata = Meta::new();
    metadata.insert("time".into(), format!("2024-05-0{} 10:00:00", id.len() % 9 + 1));
    metadata.insert("type".into(), "slack".into());
    DocumentChunk { id: id.into(), content: content.into(), source: format!("src-{id}"), metadata }
}

pub struct StaticRetriever { branch: RetrievalBranch, hits: Vec<DocumentChunk>, pub calls: AtomicUsize }

impl StaticRetriever {
    pub fn new(branch: RetrievalBranch, hits: Vec<DocumentChunk>) -> Arc<Self> { Arc::new(Self { branch, hits, calls: AtomicUsize::new(0) }) }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn branch(&self) -> RetrievalBranch { self.branch }

    async fn search(&self, _query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = self.hits.len() as f32;
        Ok(self.hits.iter().take(k).enumerate().map(|(i, c)| ScoredChunk { chunk: c.clone(), score: n - i as f32, branch: self.branch }).collect())
    }
}

/// Answers like `StaticRetriever` after a fixed delay.
pub struct SlowRetriever { inner: Arc<StaticRetriever>, delay: Duration }

impl SlowRetriever {
    pub fn new(branch: RetrievalBranch, hits: Vec<DocumentChunk>, delay: Duration) -> Arc<Self> {
        Arc::new(Self { inner: StaticRetriever::new(branch, hits), delay })
    }
}

#[async_trait]
impl Retriever for SlowRetriever {
    fn branch(&self) -> RetrievalBranch { self.inner.branch() }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search(query, k).await
    }
}

pub struct DownRetriever(pub RetrievalBranch);

#[async_trait]
impl Retriever for DownRetriever {
    fn branch(&self) -> RetrievalBranch { self.0 }

    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>> {
        Err(Error::RetrievalUnavailable { branch: self.0, reason: "store offline".into() })
    }
}

/// Relevant exactly for the listed ids.
pub struct ScriptedJudge { relevant: HashSet<String>, pub calls: AtomicUsize }

impl ScriptedJudge {
    pub fn new(relevant: &[&str]) -> Arc<Self> {
        Arc::new(Self { relevant: relevant.iter().map(|s| s.to_string()).collect(), calls: AtomicUsize::new(0) })
    }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl RelevanceJudge for ScriptedJudge {
    async fn judge(&self, chunk: &DocumentChunk, _query: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.relevant.contains(&chunk.id))
    }
}

/// Score is looked up by passage content; unknown passages score 0.
pub struct ScriptedCrossEncoder { scores: Vec<(String, f32)>, pub calls: AtomicUsize, fail: bool }

impl ScriptedCrossEncoder {
    pub fn new(scores: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self { scores: scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(), calls: AtomicUsize::new(0), fail: false })
    }
    pub fn failing() -> Arc<Self> { Arc::new(Self { scores: Vec::new(), calls: AtomicUsize::new(0), fail: true }) }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl CrossEncoder for ScriptedCrossEncoder {
    async fn score(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail { return Err(Error::RerankUnavailable("model not loaded".into())); }
        Ok(passages.iter().map(|p| self.scores.iter().find(|(c, _)| c == p).map(|(_, s)| *s).unwrap_or(0.0)).collect())
    }
}

pub struct RecordingSynthesizer { pub seen: Mutex<Vec<Vec<String>>> }

impl RecordingSynthesizer {
    pub fn new() -> Arc<Self> { Arc::new(Self { seen: Mutex::new(Vec::new()) }) }
}

#[async_trait]
impl AnswerSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, query: &str, documents: &[DocumentChunk]) -> Result<String> {
        self.seen.lock().map_err(|e| Error::Operation(e.to_string()))?.push(documents.iter().map(|d| d.id.clone()).collect());
        Ok(format!("answer to {query} from {} documents", documents.len()))
    }
}
