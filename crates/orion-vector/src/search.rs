use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use orion_core::error::Error;
use orion_core::traits::Retriever;
use orion_core::types::{RetrievalBranch, ScoredChunk};

use crate::table::{batch_to_chunks, distances, open_if_exists};
use crate::LanceChunkStore;

impl LanceChunkStore {
	/// Nearest chunks to `query_text` by vector distance, closest first.
	pub async fn search_dense(&self, query_text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
		if k == 0 { return Ok(vec![]); }
		let Some(table) = open_if_exists(&self.db, &self.table_name).await? else { return Ok(vec![]) };
		if table.count_rows(None).await? == 0 { return Ok(vec![]); }
		let embedder = self.embedder.clone();
		let text = query_text.to_string();
		let query_embedding = tokio::task::spawn_blocking(move || embedder.embed_batch(&[text]))
			.await??
			.into_iter()
			.next()
			.ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))?;
		let mut stream = table.vector_search(query_embedding)?.limit(k).execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let chunks = batch_to_chunks(&batch)?;
			// distance is monotone in similarity; keep lancedb's order
			for (chunk, distance) in chunks.into_iter().zip(distances(&batch)) {
				hits.push(ScoredChunk { chunk, score: 1.0 - distance, branch: RetrievalBranch::Dense });
			}
		}
		hits.truncate(k);
		Ok(hits)
	}
}

#[async_trait]
impl Retriever for LanceChunkStore {
	fn branch(&self) -> RetrievalBranch { RetrievalBranch::Dense }

	async fn search(&self, query: &str, k: usize) -> orion_core::error::Result<Vec<ScoredChunk>> {
		self.search_dense(query, k).await.map_err(Error::dense_unavailable)
	}
}
