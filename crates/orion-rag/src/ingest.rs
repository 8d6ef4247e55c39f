//! Batch ingestion into every chunk store: split, identify, timestamp, dedup, add.
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use orion_core::error::Result;
use orion_core::identity::compute_ids;
use orion_core::splitter::TextSplitter;
use orion_core::traits::ChunkStore;
use orion_core::types::{DocumentChunk, RawDocument, TIME_KEY};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct IngestReport {
    pub documents: usize,
    /// Chunks that received an id.
    pub chunks: usize,
    /// Pieces dropped for lacking a `source`.
    pub rejected: usize,
    /// Chunks dropped because an earlier chunk of the batch has the same id.
    pub duplicates: usize,
    /// Newly stored chunks per store name.
    pub added: BTreeMap<String, usize>,
}

pub struct Ingestor {
    splitter: TextSplitter,
    stores: Vec<Arc<dyn ChunkStore>>,
}

impl Ingestor {
    pub fn new(splitter: TextSplitter, stores: Vec<Arc<dyn ChunkStore>>) -> Self { Self { splitter, stores } }

    /// Splits and identifies `documents`, then adds to each store only the ids it
    /// does not already hold. A missing `time` becomes the current local time.
    pub async fn ingest(&self, documents: &[RawDocument]) -> Result<IngestReport> {
        let pieces = self.splitter.split_documents(documents);
        let (chunks, rejected) = compute_ids(pieces);
        for e in &rejected { warn!(error = %e, "chunk rejected"); }

        let now = chrono::Local::now().format(TIME_FORMAT).to_string();
        let (chunks, duplicates) = drop_repeated_ids(fill_time(chunks, &now));
        for d in &duplicates { warn!(id = %d.id, "repeated id in batch, chunk dropped"); }
        let mut report = IngestReport {
            documents: documents.len(),
            chunks: chunks.len(),
            rejected: rejected.len(),
            duplicates: duplicates.len(),
            ..Default::default()
        };

        for store in &self.stores {
            let existing = store.existing_ids().await?;
            let fresh = new_chunks(&chunks, &existing);
            let added = if fresh.is_empty() {
                info!(store = store.name(), "no new chunks to add");
                0
            } else {
                info!(store = store.name(), new = fresh.len(), "adding chunks");
                store.add(&fresh).await?
            };
            report.added.insert(store.name().to_string(), added);
        }
        info!(documents = report.documents, chunks = report.chunks, rejected = report.rejected, duplicates = report.duplicates, "ingestion finished");
        Ok(report)
    }

    /// Removes every persisted chunk from every store.
    pub async fn purge(&self) -> Result<()> {
        for store in &self.stores {
            store.purge().await?;
            info!(store = store.name(), "purged");
        }
        Ok(())
    }

    /// Persisted chunk count per store.
    pub async fn status(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for store in &self.stores { counts.insert(store.name().to_string(), store.count().await?); }
        Ok(counts)
    }
}

fn fill_time(chunks: Vec<DocumentChunk>, now: &str) -> Vec<DocumentChunk> {
    chunks
        .into_iter()
        .map(|mut c| {
            c.metadata.entry(TIME_KEY.to_string()).or_insert_with(|| now.to_string());
            c
        })
        .collect()
}

/// Splits off chunks whose id already occurred earlier in the batch. This happens
/// when a `(source, locator)` pair is revisited non-consecutively.
fn drop_repeated_ids(chunks: Vec<DocumentChunk>) -> (Vec<DocumentChunk>, Vec<DocumentChunk>) {
    let mut seen = HashSet::new();
    chunks.into_iter().partition(|c| seen.insert(c.id.clone()))
}

fn new_chunks(chunks: &[DocumentChunk], existing: &HashSet<String>) -> Vec<DocumentChunk> {
    chunks.iter().filter(|c| !existing.contains(&c.id)).cloned().collect()
}
