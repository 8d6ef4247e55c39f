//! Cross-encoder scoring of (query, passage) pairs.
use anyhow::Result;
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use orion_core::error::Error;
use orion_core::traits::CrossEncoder;

use crate::{device, load_weights, resolve_model_dir, tokenize};

const RERANK_MAX_LEN: usize = 512;
const RERANK_BATCH: usize = 8;

struct RerankerModel { model: XLMRobertaForSequenceClassification, tokenizer: Tokenizer, device: Device }

/// bge-reranker (XLM-RoBERTa with a single-logit head). Scores are sigmoid(logit).
///
/// Scoring through [`CrossEncoder`] runs on the blocking thread pool.
pub struct BgeReranker { inner: Arc<RerankerModel> }

impl BgeReranker {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading reranker");
        let tokenizer = tokenize::load_tokenizer(&model_dir.join("tokenizer.json"), RERANK_MAX_LEN)?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let vb = load_weights(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        Ok(Self { inner: Arc::new(RerankerModel { model, tokenizer, device }) })
    }
}

impl RerankerModel {
    fn score_pairs(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(passages.len());
        for batch in passages.chunks(RERANK_BATCH) {
            let pairs: Vec<(&str, &str)> = batch.iter().map(|p| (query, *p)).collect();
            let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, pairs, RERANK_MAX_LEN, &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;
            let logits: Tensor = self.model.forward(&input_ids, &attention_mask, &token_type_ids)?;
            let probs = candle_nn::ops::sigmoid(&logits)?.flatten_all()?;
            scores.extend(probs.to_device(&Device::Cpu)?.to_vec1::<f32>()?);
        }
        Ok(scores)
    }
}

#[async_trait]
impl CrossEncoder for BgeReranker {
    async fn score(&self, query: &str, passages: &[&str]) -> orion_core::error::Result<Vec<f32>> {
        let inner = self.inner.clone();
        let query = query.to_string();
        let passages: Vec<String> = passages.iter().map(|p| p.to_string()).collect();
        tokio::task::spawn_blocking(move || {
            let passages: Vec<&str> = passages.iter().map(String::as_str).collect();
            inner.score_pairs(&query, &passages)
        })
        .await
        .map_err(|e| Error::RerankUnavailable(e.to_string()))?
        .map_err(|e| Error::RerankUnavailable(e.to_string()))
    }
}

/// Share of query words found in the passage. Deterministic stand-in for the model.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlapCrossEncoder;

impl OverlapCrossEncoder {
    pub fn score_one(query: &str, passage: &str) -> f32 {
        let query = query.to_lowercase();
        let passage = passage.to_lowercase();
        let query_words: HashSet<&str> = query.split_whitespace().collect();
        let passage_words: HashSet<&str> = passage.split_whitespace().collect();
        let overlap = query_words.iter().filter(|w| passage_words.contains(*w)).count();
        overlap as f32 / query_words.len().max(1) as f32
    }
}

#[async_trait]
impl CrossEncoder for OverlapCrossEncoder {
    async fn score(&self, query: &str, passages: &[&str]) -> orion_core::error::Result<Vec<f32>> {
        Ok(passages.iter().map(|p| Self::score_one(query, p)).collect())
    }
}

pub fn get_default_reranker(model_dir: Option<&Path>, use_fake: bool) -> Result<Box<dyn CrossEncoder>> {
    if crate::fakes_requested(use_fake) { tracing::info!("using OverlapCrossEncoder"); return Ok(Box::new(OverlapCrossEncoder)); }
    let dir = resolve_model_dir(model_dir, "bge-reranker-base")?;
    Ok(Box::new(BgeReranker::load(&dir)?))
}
