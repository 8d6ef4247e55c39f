//! Local models on candle: a BGE-M3 sentence embedder and a bge-reranker
//! cross-encoder, both XLM-RoBERTa, plus deterministic stand-ins for tests.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::Tokenizer;

use orion_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod reranker;
pub mod tokenize;

pub use pool::masked_mean_l2;
pub use reranker::{get_default_reranker, BgeReranker, OverlapCrossEncoder};

pub const BGE_M3_DIM: usize = 1024;
const EMBED_MAX_LEN: usize = 256;
const EMBED_BATCH: usize = 16;

pub struct BgeM3Embedder { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device }

impl BgeM3Embedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3");
        let tokenizer = tokenize::load_tokenizer(&model_dir.join("tokenizer.json"), EMBED_MAX_LEN)?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let vb = load_weights(model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        Ok(Self { model, tokenizer, device })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, inputs, EMBED_MAX_LEN, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize { BGE_M3_DIM }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) { out.extend(self.embed_chunk(batch)?); }
        tracing::debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

/// Hashes whitespace tokens into a fixed-size, L2-normalised vector. Texts sharing
/// words land close together, which is enough for tests and offline dev runs.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            v[(h as usize) % self.dim] += 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

/// True when `use_fake` is set or `APP_USE_FAKE_EMBEDDINGS` is `1`/`true`.
pub fn fakes_requested(use_fake: bool) -> bool {
    use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// BGE-M3 from `model_dir` (or the usual fallbacks), or the fake embedder when
/// `use_fake` or `APP_USE_FAKE_EMBEDDINGS=1`.
pub fn get_default_embedder(model_dir: Option<&Path>, use_fake: bool) -> Result<Box<dyn Embedder>> {
    if fakes_requested(use_fake) { tracing::info!("using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(BGE_M3_DIM))); }
    let dir = resolve_model_dir(model_dir, "bge-m3")?;
    Ok(Box::new(BgeM3Embedder::load(&dir)?))
}

/// `model.safetensors` when present, else the pickled `pytorch_model.bin`.
pub(crate) fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let weights: HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?
            .into_iter()
            .map(|(name, t)| Ok((name, t.to_device(device)?)))
            .collect::<Result<_>>()?
    };
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

pub(crate) fn resolve_model_dir(explicit: Option<&Path>, name: &str) -> Result<PathBuf> {
    if let Some(p) = explicit { if p.exists() { return Ok(p.to_path_buf()); } }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(dir).join(name); if p.exists() { return Ok(p); } }
    for root in ["models", "../models"] { let p = Path::new(root).join(name); if p.exists() { return Ok(p); } }
    Err(anyhow!("Could not locate {} model directory", name))
}
