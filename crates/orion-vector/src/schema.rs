use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of the dense chunk table. `vector` width follows the embedder.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, false),
		Field::new("locator", DataType::Utf8, true),
		Field::new("time", DataType::Utf8, true),
		Field::new("kind", DataType::Utf8, true),
		Field::new("metadata", DataType::Utf8, false),
		Field::new("content", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
