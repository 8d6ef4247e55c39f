//! Domain types shared by the stores, the retrievers and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type ChunkId = String;
pub type Meta = BTreeMap<String, String>;

pub const SOURCE_KEY: &str = "source";
pub const LOCATOR_KEY: &str = "page";
/// Read as the locator when `page` is absent.
pub const LOCATOR_ALIAS_KEY: &str = "locator";
pub const TIME_KEY: &str = "time";
pub const TYPE_KEY: &str = "type";

/// Origin kind of a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Slack,
    Github,
    Terminal,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Slack => "slack",
            Self::Github => "github",
            Self::Terminal => "terminal",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DocumentKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "slack" => Ok(Self::Slack),
            "github" => Ok(Self::Github),
            "terminal" => Ok(Self::Terminal),
            other => Err(crate::error::Error::Operation(format!("unknown document type '{other}'"))),
        }
    }
}

/// A loaded document (page, message, diff or log) before splitting and identity.
///
/// `metadata` carries `source`, `page`, `time` and `type` when the loader knows them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawDocument {
    pub content: String,
    pub metadata: Meta,
}

impl RawDocument {
    pub fn new(content: impl Into<String>) -> Self { Self { content: content.into(), metadata: Meta::new() } }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> { self.metadata.get(SOURCE_KEY).map(String::as_str) }
    pub fn locator(&self) -> Option<&str> { locator_of(&self.metadata) }
}

fn locator_of(metadata: &Meta) -> Option<&str> {
    metadata.get(LOCATOR_KEY).or_else(|| metadata.get(LOCATOR_ALIAS_KEY)).map(String::as_str)
}

/// A chunk of a source document that is independently indexed.
///
/// - `id`: `{source}:{locator}:{sequence}`, the dedup key in both stores
/// - `source`: origin identifier (file path, channel, `github`)
/// - `metadata`: open extension map holding `page`, `time`, `type` and anything else
///   the loader attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl DocumentChunk {
    pub fn locator(&self) -> Option<&str> { locator_of(&self.metadata) }
    pub fn time(&self) -> Option<&str> { self.metadata.get(TIME_KEY).map(String::as_str) }
    pub fn kind(&self) -> Option<DocumentKind> { self.metadata.get(TYPE_KEY).and_then(|t| t.parse().ok()) }

    /// Metadata minus the keys that have their own columns in the stores.
    pub fn extra_metadata(&self) -> Meta {
        self.metadata
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), SOURCE_KEY | LOCATOR_KEY | LOCATOR_ALIAS_KEY | TIME_KEY | TYPE_KEY))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Which retrieval branch produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RetrievalBranch {
    Dense,
    Sparse,
}

impl fmt::Display for RetrievalBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Sparse => f.write_str("sparse"),
        }
    }
}

/// A retrieved chunk with the score assigned by the branch that found it.
///
/// `score` is branch-specific; higher is always better. Order within a result set
/// is the branch's own ranking and is never resorted before fusion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
    pub branch: RetrievalBranch,
}

impl ScoredChunk {
    pub fn id(&self) -> &str { &self.chunk.id }
}
