//! Dense chunk store on LanceDB.
//!
//! Chunks are embedded on write with the injected embedder and searched by vector
//! distance. A missing table reads as an empty store.
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Connection;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use orion_core::error::Error;
use orion_core::traits::{ChunkStore, Embedder};
use orion_core::types::{ChunkId, DocumentChunk};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use table::{batch_to_chunks, open_if_exists};

pub struct LanceChunkStore {
    pub(crate) db: Connection,
    pub(crate) table_name: String,
    pub(crate) embedder: Arc<dyn Embedder>,
}

impl LanceChunkStore {
    pub async fn open(db_path: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        std::fs::create_dir_all(db_path)?;
        let db = table::open_db(db_path.to_string_lossy().as_ref()).await?;
        Ok(Self { db, table_name: table_name.to_string(), embedder })
    }

    pub fn dim(&self) -> usize { self.embedder.dim() }

    /// Every stored chunk, in table order.
    pub async fn all_chunks(&self) -> Result<Vec<DocumentChunk>> {
        let Some(t) = open_if_exists(&self.db, &self.table_name).await? else { return Ok(vec![]) };
        let mut stream = t.query().execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? { out.extend(batch_to_chunks(&batch)?); }
        Ok(out)
    }

    async fn ids(&self) -> Result<HashSet<ChunkId>> {
        let Some(t) = open_if_exists(&self.db, &self.table_name).await? else { return Ok(HashSet::new()) };
        let mut stream = t.query().select(Select::columns(&["id"])).execute().await?;
        let mut ids = HashSet::new();
        while let Some(batch) = stream.try_next().await? {
            let col = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<arrow_array::StringArray>())
                .ok_or_else(|| anyhow::anyhow!("id column missing"))?;
            ids.extend(col.iter().flatten().map(str::to_string));
        }
        Ok(ids)
    }

    async fn rows(&self) -> Result<usize> {
        match open_if_exists(&self.db, &self.table_name).await? {
            Some(t) => Ok(t.count_rows(None).await?),
            None => Ok(0),
        }
    }

    async fn delete_all(&self) -> Result<()> {
        if let Some(t) = open_if_exists(&self.db, &self.table_name).await? {
            t.delete("id IS NOT NULL").await?;
            tracing::info!(table = %self.table_name, "lancedb: purged all chunks");
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkStore for LanceChunkStore {
    fn name(&self) -> &str { "lancedb" }

    async fn existing_ids(&self) -> orion_core::error::Result<HashSet<ChunkId>> { self.ids().await.map_err(Error::storage) }

    async fn add(&self, chunks: &[DocumentChunk]) -> orion_core::error::Result<usize> { self.insert(chunks).await.map_err(Error::storage) }

    async fn count(&self) -> orion_core::error::Result<usize> { self.rows().await.map_err(Error::storage) }

    async fn purge(&self) -> orion_core::error::Result<()> { self.delete_all().await.map_err(Error::storage) }
}
