use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tantivy::collector::DocSetCollector;
use tantivy::directory::MmapDirectory;
use tantivy::query::AllQuery;
use tantivy::schema::Value;
use tantivy::{Index, IndexWriter, TantivyDocument};

use orion_core::error::{Error, Result};
use orion_core::traits::ChunkStore;
use orion_core::types::{ChunkId, DocumentChunk, Meta, LOCATOR_KEY, TIME_KEY, TYPE_KEY};

use crate::tantivy_utils::{build_schema, register_tokenizer, ChunkFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Lexical chunk index on disk. Adds are append-only; ids already present are the
/// caller's job to filter out via [`ChunkStore::existing_ids`]. Clones share the
/// same on-disk index.
#[derive(Clone)]
pub struct TantivyChunkIndex {
	pub(crate) index: Index,
	pub(crate) fields: ChunkFields,
	dir: PathBuf,
}

impl TantivyChunkIndex {
	/// Open the index at `index_dir`, creating the directory and an empty index if needed.
	pub fn open_or_create(index_dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(index_dir).map_err(Error::storage)?;
		let directory = MmapDirectory::open(index_dir).map_err(Error::storage)?;
		let index = Index::open_or_create(directory, build_schema()).map_err(Error::storage)?;
		register_tokenizer(&index);
		let fields = ChunkFields::resolve(&index.schema()).map_err(Error::storage)?;
		Ok(Self { index, fields, dir: index_dir.to_path_buf() })
	}

	/// Open an existing index without creating anything.
	pub fn open(index_dir: &Path) -> Result<Self> {
		if !index_dir.join("meta.json").exists() {
			return Err(Error::sparse_unavailable(format!("no index at {}", index_dir.display())));
		}
		let index = Index::open_in_dir(index_dir).map_err(Error::sparse_unavailable)?;
		register_tokenizer(&index);
		let fields = ChunkFields::resolve(&index.schema()).map_err(Error::sparse_unavailable)?;
		Ok(Self { index, fields, dir: index_dir.to_path_buf() })
	}

	fn to_document(&self, c: &DocumentChunk) -> Result<TantivyDocument> {
		let mut doc = TantivyDocument::default();
		doc.add_text(self.fields.id, &c.id);
		doc.add_text(self.fields.source, &c.source);
		if let Some(locator) = c.locator() { doc.add_text(self.fields.locator, locator); }
		if let Some(time) = c.time() { doc.add_text(self.fields.time, time); }
		if let Some(kind) = c.metadata.get(TYPE_KEY) { doc.add_text(self.fields.kind, kind); }
		let extra = serde_json::to_string(&c.extra_metadata()).map_err(Error::storage)?;
		doc.add_text(self.fields.metadata, extra);
		doc.add_text(self.fields.text, &c.content);
		Ok(doc)
	}

	pub(crate) fn to_chunk(&self, doc: &TantivyDocument) -> DocumentChunk {
		let text = |f: tantivy::schema::Field| doc.get_first(f).and_then(|v| v.as_str()).map(str::to_string);
		let mut metadata: Meta = text(self.fields.metadata)
			.and_then(|m| serde_json::from_str(&m).ok())
			.unwrap_or_default();
		if let Some(locator) = text(self.fields.locator) { metadata.insert(LOCATOR_KEY.to_string(), locator); }
		if let Some(time) = text(self.fields.time) { metadata.insert(TIME_KEY.to_string(), time); }
		if let Some(kind) = text(self.fields.kind) { metadata.insert(TYPE_KEY.to_string(), kind); }
		DocumentChunk {
			id: text(self.fields.id).unwrap_or_default(),
			content: text(self.fields.text).unwrap_or_default(),
			source: text(self.fields.source).unwrap_or_default(),
			metadata,
		}
	}

	fn all_documents(&self) -> anyhow::Result<Vec<TantivyDocument>> {
		let searcher = self.index.reader()?.searcher();
		let addresses = searcher.search(&AllQuery, &DocSetCollector)?;
		let mut docs = Vec::with_capacity(addresses.len());
		for addr in addresses { docs.push(searcher.doc(addr)?); }
		Ok(docs)
	}
}

#[async_trait]
impl ChunkStore for TantivyChunkIndex {
	fn name(&self) -> &str { "tantivy" }

	async fn existing_ids(&self) -> Result<HashSet<ChunkId>> {
		let docs = self.all_documents().map_err(Error::storage)?;
		Ok(docs
			.iter()
			.filter_map(|d| d.get_first(self.fields.id).and_then(|v| v.as_str()).map(str::to_string))
			.collect())
	}

	async fn add(&self, chunks: &[DocumentChunk]) -> Result<usize> {
		if chunks.is_empty() { return Ok(0); }
		let mut index_writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES).map_err(Error::storage)?;
		for c in chunks {
			index_writer.add_document(self.to_document(c)?).map_err(Error::storage)?;
		}
		index_writer.commit().map_err(Error::storage)?;
		tracing::info!(chunks = chunks.len(), dir = %self.dir.display(), "tantivy: committed chunks");
		Ok(chunks.len())
	}

	async fn count(&self) -> Result<usize> {
		let searcher = self.index.reader().map_err(Error::storage)?.searcher();
		Ok(searcher.num_docs() as usize)
	}

	async fn purge(&self) -> Result<()> {
		let mut index_writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES).map_err(Error::storage)?;
		index_writer.delete_all_documents().map_err(Error::storage)?;
		index_writer.commit().map_err(Error::storage)?;
		tracing::info!(dir = %self.dir.display(), "tantivy: purged all chunks");
		Ok(())
	}
}
