//! Stable chunk identifiers.
//!
//! A chunk's id is `{source}:{locator}:{n}` where `n` counts consecutive chunks that
//! share the same `(source, locator)` pair and restarts at 0 whenever the pair changes.
//! Revisiting an earlier pair later in the sequence restarts the count too.

use crate::error::{Error, Result};
use crate::types::{DocumentChunk, RawDocument, SOURCE_KEY};

/// Run-length counter over `(source, locator)` keys.
#[derive(Debug, Default)]
pub struct ChunkIdentity {
    last_key: Option<String>,
    index: usize,
}

impl ChunkIdentity {
    pub fn new() -> Self { Self::default() }

    /// Turn one split piece into an identified chunk.
    ///
    /// A piece with no `source` is rejected and leaves the counter untouched.
    /// A missing locator renders as `None`.
    pub fn assign(&mut self, piece: RawDocument) -> Result<DocumentChunk> {
        let source = match piece.source() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => return Err(Error::MissingSource(preview(&piece.content))),
        };
        let key = format!("{}:{}", source, piece.locator().unwrap_or("None"));
        if self.last_key.as_deref() == Some(key.as_str()) {
            self.index += 1;
        } else {
            self.index = 0;
        }
        let id = format!("{}:{}", key, self.index);
        self.last_key = Some(key);

        let mut metadata = piece.metadata;
        metadata.remove(SOURCE_KEY);
        Ok(DocumentChunk { id, content: piece.content, source, metadata })
    }
}

/// Assign ids to a whole ingestion batch, in order.
///
/// Returns the identified chunks and the per-piece validation errors; a bad piece
/// never aborts the batch.
pub fn compute_ids(pieces: impl IntoIterator<Item = RawDocument>) -> (Vec<DocumentChunk>, Vec<Error>) {
    let mut identity = ChunkIdentity::new();
    let mut chunks = Vec::new();
    let mut rejected = Vec::new();
    for piece in pieces {
        match identity.assign(piece) {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => rejected.push(e),
        }
    }
    (chunks, rejected)
}

fn preview(content: &str) -> String {
    let head: String = content.chars().take(40).collect();
    if head.len() < content.len() { format!("{head}...") } else { head }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LOCATOR_ALIAS_KEY, LOCATOR_KEY};

    fn piece(source: &str, locator: &str) -> RawDocument {
        RawDocument::new("text").with_meta(SOURCE_KEY, source).with_meta(LOCATOR_KEY, locator)
    }

    fn ids(chunks: &[DocumentChunk]) -> Vec<&str> { chunks.iter().map(|c| c.id.as_str()).collect() }

    #[test]
    fn sequence_resets_on_key_change_and_revisit() {
        let (chunks, rejected) = compute_ids(vec![piece("A", "1"), piece("A", "1"), piece("B", "2"), piece("A", "1")]);
        assert!(rejected.is_empty());
        assert_eq!(ids(&chunks), vec!["A:1:0", "A:1:1", "B:2:0", "A:1:0"]);
    }

    #[test]
    fn same_input_same_ids() {
        let batch = || vec![piece("doc.pdf", "3"), piece("doc.pdf", "3"), piece("doc.pdf", "4"), piece("slack", "1712.1")];
        let (first, _) = compute_ids(batch());
        let (second, _) = compute_ids(batch());
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn missing_locator_uses_none() {
        let (chunks, _) = compute_ids(vec![RawDocument::new("x").with_meta(SOURCE_KEY, "logs/a.log")]);
        assert_eq!(chunks[0].id, "logs/a.log:None:0");
    }

    #[test]
    fn locator_key_is_read_when_page_is_absent() {
        let aliased = RawDocument::new("x").with_meta(SOURCE_KEY, "A").with_meta(LOCATOR_ALIAS_KEY, "7");
        let both = RawDocument::new("y").with_meta(SOURCE_KEY, "A").with_meta(LOCATOR_KEY, "2").with_meta(LOCATOR_ALIAS_KEY, "7");
        let (chunks, _) = compute_ids(vec![aliased.clone(), aliased, both]);
        assert_eq!(ids(&chunks), vec!["A:7:0", "A:7:1", "A:2:0"]);
        assert!(!chunks[0].extra_metadata().contains_key(LOCATOR_ALIAS_KEY));
    }

    #[test]
    fn missing_source_is_rejected_without_breaking_the_run() {
        let (chunks, rejected) = compute_ids(vec![
            piece("A", "1"),
            RawDocument::new("orphan").with_meta(LOCATOR_KEY, "1"),
            piece("A", "1"),
        ]);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(rejected[0], Error::MissingSource(_)));
        assert_eq!(ids(&chunks), vec!["A:1:0", "A:1:1"]);
    }

    #[test]
    fn source_moves_out_of_metadata() {
        let (chunks, _) = compute_ids(vec![piece("A", "1")]);
        assert_eq!(chunks[0].source, "A");
        assert_eq!(chunks[0].locator(), Some("1"));
        assert!(!chunks[0].metadata.contains_key(SOURCE_KEY));
    }
}
