//! Recursive character splitter.
//!
//! Text is cut on the first separator that occurs (`"\n\n"`, `"\n"`, `" "`, then per
//! character), pieces that are still too long are split again with the remaining
//! separators, and neighbouring small pieces are merged back up to `chunk_size`
//! characters with up to `chunk_overlap` characters repeated between chunks.

use std::collections::VecDeque;

use crate::types::RawDocument;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { chunk_size: 500, chunk_overlap: 80 } }
}

#[derive(Debug, Clone, Default)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        let chunk_overlap = config.chunk_overlap.min(config.chunk_size.saturating_sub(1));
        Self { config: ChunkingConfig { chunk_size: config.chunk_size.max(1), chunk_overlap } }
    }

    /// Split every document, copying its metadata onto each piece. Order is kept.
    pub fn split_documents(&self, documents: &[RawDocument]) -> Vec<RawDocument> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(|content| RawDocument { content, metadata: doc.metadata.clone() })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> { self.split_with(text, &SEPARATORS) }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map(|(i, s)| (i, *s))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let rest = &separators[(pos + 1).min(separators.len())..];

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).map(str::to_string).collect()
        };

        let mut out = Vec::new();
        let mut good: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.config.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                out.extend(self.merge(&good, separator));
                good.clear();
            }
            if rest.is_empty() {
                out.push(piece);
            } else {
                out.extend(self.split_with(&piece, rest));
            }
        }
        if !good.is_empty() {
            out.extend(self.merge(&good, separator));
        }
        out
    }

    fn merge(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;
        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.config.chunk_size && !current.is_empty() {
                push_joined(&mut docs, &current, separator);
                while total > self.config.chunk_overlap
                    || (total + len + if current.is_empty() { 0 } else { sep_len } > self.config.chunk_size && total > 0)
                {
                    let Some(first) = current.pop_front() else { break };
                    total -= char_len(first) + if current.is_empty() { 0 } else { sep_len };
                }
            }
            if !current.is_empty() {
                total += sep_len;
            }
            current.push_back(split);
            total += len;
        }
        push_joined(&mut docs, &current, separator);
        docs
    }
}

fn push_joined(docs: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }
