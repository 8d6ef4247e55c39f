//! Wiring for the `orion` binary: stores, models and loaders built from `Settings`.
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use orion_core::config::{expand_path, Settings};
use orion_core::data_processor::DataProcessor;
use orion_core::error::Error;
use orion_core::splitter::TextSplitter;
use orion_core::traits::{ChunkStore, CrossEncoder, DocumentationSink, RelevanceJudge, Retriever};
use orion_core::types::{DocumentChunk, RawDocument};
use orion_embed::{fakes_requested, get_default_embedder, get_default_reranker};
use orion_rag::{ChatClient, Ingestor, KeywordJudge, LlmAnswerSynthesizer, LlmCurator, LlmJudge, RagPipeline, RagService};
use orion_text::TantivyChunkIndex;
use orion_vector::LanceChunkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoaderKind {
    /// Every file under a directory of terminal logs
    Terminal,
    /// `*refined_pr_info.json` pull request export
    Github,
    /// Slack message export (JSON file)
    Slack,
    /// Text extracted from PDFs (`*.txt`)
    Txt,
}

/// Both chunk stores plus the settings they were opened with.
pub struct Orion {
    settings: Settings,
    offline: bool,
    sparse: Arc<TantivyChunkIndex>,
    dense: Arc<LanceChunkStore>,
}

impl Orion {
    pub async fn open(settings: Settings) -> Result<Self> {
        let offline = fakes_requested(settings.models.use_fake);
        let sparse = Arc::new(TantivyChunkIndex::open_or_create(&expand_path(&settings.data.tantivy_index_dir))?);
        let embedder = get_default_embedder(model_dir(&settings.models.embed_model_dir).as_deref(), offline)?;
        let dense = Arc::new(LanceChunkStore::open(&expand_path(&settings.data.lancedb_dir), &settings.data.table, Arc::from(embedder)).await?);
        Ok(Self { settings, offline, sparse, dense })
    }

    /// `models.use_fake` or `APP_USE_FAKE_EMBEDDINGS`, resolved when the stores were opened.
    pub fn offline(&self) -> bool { self.offline }

    pub fn ingestor(&self) -> Ingestor {
        let stores: Vec<Arc<dyn ChunkStore>> = vec![self.dense.clone(), self.sparse.clone()];
        Ingestor::new(TextSplitter::new(self.settings.retrieval.chunking()), stores)
    }

    /// Offline runs grade with the keyword judge instead of the chat model.
    pub fn pipeline(&self) -> Result<RagPipeline> {
        let models = &self.settings.models;
        let reranker: Arc<dyn CrossEncoder> = Arc::from(get_default_reranker(model_dir(&models.reranker_model_dir).as_deref(), self.offline)?);
        let judge: Arc<dyn RelevanceJudge> =
            if self.offline { Arc::new(KeywordJudge) } else { Arc::new(LlmJudge::new(ChatClient::from_settings(models))) };
        let dense: Arc<dyn Retriever> = self.dense.clone();
        let sparse: Arc<dyn Retriever> = self.sparse.clone();
        Ok(RagPipeline::new(dense, sparse, judge, reranker).with_top_k(self.settings.retrieval.top_k))
    }

    pub fn service(&self) -> Result<RagService> {
        Ok(RagService::new(self.pipeline()?, Arc::new(LlmAnswerSynthesizer::new(ChatClient::from_settings(&self.settings.models)))))
    }

    pub fn curator_model(&self) -> LlmCurator { LlmCurator::new(ChatClient::from_settings(&self.settings.models)) }

    /// Every chunk held by the dense store.
    pub async fn documents(&self) -> Result<Vec<DocumentChunk>> { self.dense.all_chunks().await }

    /// Loads raw documents of `kind` from `path`, or from the configured location.
    pub fn load(&self, kind: LoaderKind, path: Option<&Path>) -> Result<Vec<RawDocument>> {
        let data = &self.settings.data;
        let path = match (path, kind) {
            (Some(p), _) => p.to_path_buf(),
            (None, LoaderKind::Terminal) => expand_path(&data.terminal_log_dir),
            (None, LoaderKind::Github) => expand_path(&data.github_pr_dir),
            (None, LoaderKind::Txt) => expand_path(&data.raw_txt_dir),
            (None, LoaderKind::Slack) => bail!("slack ingestion needs the path of the export file"),
        };
        let processor = DataProcessor::new();
        let docs = match kind {
            LoaderKind::Terminal => processor.load_terminal_logs(&path),
            LoaderKind::Github => processor.load_github_prs(&path),
            LoaderKind::Slack => processor.load_slack_messages(&path),
            LoaderKind::Txt => processor.load_text_files(&path),
        }
        .with_context(|| format!("loading {:?} documents from {}", kind, path.display()))?;
        Ok(docs)
    }
}

fn model_dir(configured: &Option<String>) -> Option<PathBuf> { configured.as_deref().map(expand_path) }

/// Sink that reads the documentation structure from a file and only records the
/// statements it is given.
pub struct DryRunSink {
    structure: String,
    statements: Mutex<Vec<String>>,
}

impl DryRunSink {
    pub fn from_file(path: &Path) -> Result<Self> {
        let structure = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self { structure, statements: Mutex::new(Vec::new()) })
    }

    pub fn statements(&self) -> Vec<String> { self.statements.lock().map(|s| s.clone()).unwrap_or_default() }
}

#[async_trait]
impl DocumentationSink for DryRunSink {
    async fn structure(&self) -> orion_core::error::Result<String> { Ok(self.structure.clone()) }

    async fn execute(&self, statement: &str) -> orion_core::error::Result<()> {
        self.statements.lock().map_err(|e| Error::Operation(e.to_string()))?.push(statement.to_string());
        Ok(())
    }
}
