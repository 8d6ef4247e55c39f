use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer, TruncationParams};

/// XLM-RoBERTa `<pad>` id.
pub const PAD_ID: u32 = 1;

/// Load `tokenizer.json` with truncation at `max_len` and padding left to us.
pub fn load_tokenizer(path: &std::path::Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

/// Encode a batch (single texts or (query, passage) pairs) into `[B, T]` id and mask
/// tensors, padded to the longest row and capped at `max_len`.
pub fn tokenize_batch<'s, I>(tokenizer: &Tokenizer, inputs: Vec<I>, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)>
where
    I: Into<EncodeInput<'s>> + Send,
{
    let encodings = tokenizer.encode_batch(inputs, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let width = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);
    let rows = encodings.len();
    let mut ids = Vec::with_capacity(rows * width);
    let mut mask = Vec::with_capacity(rows * width);
    for enc in &encodings {
        let n = enc.get_ids().len().min(width);
        ids.extend_from_slice(&enc.get_ids()[..n]);
        mask.extend_from_slice(&enc.get_attention_mask()[..n]);
        ids.extend(std::iter::repeat(PAD_ID).take(width - n));
        mask.extend(std::iter::repeat(0u32).take(width - n));
    }
    let input_ids = Tensor::from_vec(ids, (rows, width), device)?;
    let attention_mask = Tensor::from_vec(mask, (rows, width), device)?;
    Ok((input_ids, attention_mask))
}
