//! LanceDB connection and housekeeping helpers.
use anyhow::Result;
use arrow_array::{Array, RecordBatch, StringArray};
use lancedb::{connect, Connection, Table};

use orion_core::types::{DocumentChunk, Meta, LOCATOR_KEY, TIME_KEY, TYPE_KEY};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// The table if it exists; `None` stands for an empty store.
pub async fn open_if_exists(conn: &Connection, name: &str) -> Result<Option<Table>> {
    if !table_exists(conn, name).await? { return Ok(None); }
    Ok(Some(conn.open_table(name).execute().await?))
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("{} column missing", name))
}

fn optional(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) { None } else { Some(col.value(i).to_string()) }
}

/// Decode every row of a chunk-table batch.
pub fn batch_to_chunks(batch: &RecordBatch) -> Result<Vec<DocumentChunk>> {
    let ids = string_col(batch, "id")?;
    let sources = string_col(batch, "source")?;
    let locators = string_col(batch, "locator")?;
    let times = string_col(batch, "time")?;
    let kinds = string_col(batch, "kind")?;
    let metas = string_col(batch, "metadata")?;
    let contents = string_col(batch, "content")?;
    let mut chunks = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut metadata: Meta = serde_json::from_str(metas.value(i)).unwrap_or_default();
        if let Some(v) = optional(locators, i) { metadata.insert(LOCATOR_KEY.to_string(), v); }
        if let Some(v) = optional(times, i) { metadata.insert(TIME_KEY.to_string(), v); }
        if let Some(v) = optional(kinds, i) { metadata.insert(TYPE_KEY.to_string(), v); }
        chunks.push(DocumentChunk {
            id: ids.value(i).to_string(),
            content: contents.value(i).to_string(),
            source: sources.value(i).to_string(),
            metadata,
        });
    }
    Ok(chunks)
}

/// The `_distance` column lancedb appends to vector-search results.
pub fn distances(batch: &RecordBatch) -> Vec<f32> {
    batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<arrow_array::Float32Array>())
        .map(|d| d.values().to_vec())
        .unwrap_or_else(|| vec![0.0; batch.num_rows()])
}
