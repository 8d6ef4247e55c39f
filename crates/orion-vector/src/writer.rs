use anyhow::{ensure, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use orion_core::types::{DocumentChunk, TYPE_KEY};

use crate::schema::build_chunk_schema;
use crate::LanceChunkStore;

const EMBED_BATCH: usize = 64;

impl LanceChunkStore {
	/// Embed `chunks` and append them, creating the table on first write.
	pub(crate) async fn insert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
		if chunks.is_empty() { return Ok(0); }
		tracing::info!(chunks = chunks.len(), table = %self.table_name, "lancedb: indexing chunks");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
		let mut written = 0usize;
		for batch in chunks.chunks(EMBED_BATCH) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let embeddings = self.embedder.embed_batch(&texts)?;
			ensure!(embeddings.len() == batch.len(), "embedder returned {} vectors for {} chunks", embeddings.len(), batch.len());
			for e in &embeddings { ensure!(e.len() == self.dim(), "embedding has dim {} but table expects {}", e.len(), self.dim()); }
			self.append(self.to_record_batch(batch, &embeddings)?).await?;
			written += batch.len();
			pb.set_position(written as u64);
		}
		pb.finish_and_clear();
		tracing::info!(chunks = written, table = %self.table_name, "lancedb: indexing completed");
		Ok(written)
	}

	async fn append(&self, record_batch: RecordBatch) -> Result<()> {
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if crate::table::table_exists(&self.db, &self.table_name).await? {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let mut ids = Vec::new(); let mut sources = Vec::new(); let mut locators = Vec::new(); let mut times = Vec::new();
		let mut kinds = Vec::new(); let mut metas = Vec::new(); let mut contents = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
		for (c, e) in chunks.iter().zip(embeddings) {
			ids.push(c.id.clone()); sources.push(c.source.clone());
			locators.push(c.locator().map(str::to_string)); times.push(c.time().map(str::to_string)); kinds.push(c.metadata.get(TYPE_KEY).cloned());
			metas.push(serde_json::to_string(&c.extra_metadata())?); contents.push(c.content.clone());
			vectors.push(Some(e.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(build_chunk_schema(self.dim() as i32), vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(StringArray::from(locators)),
			Arc::new(StringArray::from(times)),
			Arc::new(StringArray::from(kinds)),
			Arc::new(StringArray::from(metas)),
			Arc::new(StringArray::from(contents)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim() as i32)),
		])?;
		Ok(record_batch)
	}
}
