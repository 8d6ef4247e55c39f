use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::TantivyDocument;

use orion_core::error::{Error, Result};
use orion_core::traits::Retriever;
use orion_core::types::{RetrievalBranch, ScoredChunk};

use crate::index::TantivyChunkIndex;

impl TantivyChunkIndex {
	/// BM25 top-k over chunk text, best first.
	///
	/// Query syntax errors are tolerated: the parser keeps whatever terms it can.
	pub fn search_bm25(&self, query_text: &str, k: usize) -> anyhow::Result<Vec<ScoredChunk>> {
		if k == 0 || query_text.trim().is_empty() { return Ok(vec![]); }
		let searcher = self.index.reader()?.searcher();
		let query_parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
		let (query, errors) = query_parser.parse_query_lenient(query_text);
		if !errors.is_empty() { tracing::debug!(?errors, "tantivy: lenient query parse"); }
		let top_docs = searcher.search(&query, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			hits.push(ScoredChunk { chunk: self.to_chunk(&doc), score, branch: RetrievalBranch::Sparse });
		}
		Ok(hits)
	}
}

#[async_trait]
impl Retriever for TantivyChunkIndex {
	fn branch(&self) -> RetrievalBranch { RetrievalBranch::Sparse }

	async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
		let index = self.clone();
		let query = query.to_string();
		tokio::task::spawn_blocking(move || index.search_bm25(&query, k))
			.await
			.map_err(Error::sparse_unavailable)?
			.map_err(Error::sparse_unavailable)
	}
}
