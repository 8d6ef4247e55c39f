use candle_core::{DType, Device, Tensor};
use orion_core::traits::{CrossEncoder, Embedder};
use orion_embed::{get_default_embedder, get_default_reranker, masked_mean_l2, OverlapCrossEncoder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = get_default_embedder(None, true).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    assert_eq!(embedder.dim(), 1024);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_places_shared_words_closer() {
    let embedder = get_default_embedder(None, true).expect("embedder");
    let embs = embedder
        .embed_batch(&["openssl linker error".to_string(), "linker error in openssl build".to_string(), "lunch menu friday".to_string()])
        .expect("embed");
    assert!(cosine(&embs[0], &embs[1]) > cosine(&embs[0], &embs[2]));
}

#[test]
fn masked_mean_l2_basic() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; second token is masked out.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,  // token 0
                                 5.0, 6.0, 7.0, 8.0],    // token 1
                               (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();
    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v[0].iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn masked_mean_l2_rejects_rank_two_input() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}

#[test]
fn overlap_scores_fraction_of_query_words() {
    assert_eq!(OverlapCrossEncoder::score_one("rust memory safety", "Rust ownership gives memory safety"), 1.0);
    assert!((OverlapCrossEncoder::score_one("rust memory safety", "python memory") - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(OverlapCrossEncoder::score_one("", "anything"), 0.0);
}

#[tokio::test]
async fn fake_reranker_scores_in_passage_order() {
    let reranker = get_default_reranker(None, true).expect("reranker");
    let scores = reranker.score("disk full", &["nothing here", "disk is full", "disk"]).await.expect("score");
    assert_eq!(scores.len(), 3);
    assert_eq!(scores[0], 0.0);
    assert_eq!(scores[1], 1.0);
    assert_eq!(scores[2], 0.5);
}
