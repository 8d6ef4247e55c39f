use orion_core::traits::{ChunkStore, Retriever};
use orion_core::types::{DocumentChunk, DocumentKind, Meta, RetrievalBranch};
use orion_text::TantivyChunkIndex;
use tempfile::TempDir;

fn chunk(id: &str, content: &str) -> DocumentChunk {
    let mut metadata = Meta::new();
    metadata.insert("page".into(), "1".into());
    metadata.insert("time".into(), "2024-05-01 10:00:00".into());
    metadata.insert("type".into(), "terminal".into());
    metadata.insert("channel".into(), "ops".into());
    DocumentChunk { id: id.into(), content: content.into(), source: "logs/build.log".into(), metadata }
}

fn corpus() -> Vec<DocumentChunk> {
    vec![
        chunk("a:1:0", "cargo build failed with linker error on openssl"),
        chunk("a:1:1", "kubernetes pod restarted after OOM kill"),
        chunk("a:1:2", "openssl upgrade fixed the linker error; openssl 3 now required"),
    ]
}

#[tokio::test]
async fn tantivy_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    let index = TantivyChunkIndex::open_or_create(tmp.path()).expect("index");
    assert_eq!(index.add(&corpus()).await.expect("add"), 3);
    assert_eq!(index.count().await.expect("count"), 3);

    let hits = index.search("openssl linker", 5).await.expect("search");
    assert_eq!(hits.len(), 2, "pod restart chunk does not match");
    assert!(hits[0].score >= hits[1].score);
    assert!(hits.iter().all(|h| h.branch == RetrievalBranch::Sparse));

    let top = &hits[0].chunk;
    assert_eq!(top.source, "logs/build.log");
    assert_eq!(top.time(), Some("2024-05-01 10:00:00"));
    assert_eq!(top.kind(), Some(DocumentKind::Terminal));
    assert_eq!(top.metadata.get("channel").map(String::as_str), Some("ops"));
}

#[tokio::test]
async fn existing_ids_survive_reopen() {
    let tmp = TempDir::new().expect("tmp");
    {
        let index = TantivyChunkIndex::open_or_create(tmp.path()).expect("index");
        index.add(&corpus()).await.expect("add");
    }
    let reopened = TantivyChunkIndex::open(tmp.path()).expect("reopen");
    let ids = reopened.existing_ids().await.expect("ids");
    assert_eq!(ids.len(), 3);
    assert!(ids.contains("a:1:2"));
}

#[tokio::test]
async fn empty_index_and_odd_queries_return_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let index = TantivyChunkIndex::open_or_create(tmp.path()).expect("index");
    assert!(index.search("anything", 5).await.expect("search").is_empty());
    index.add(&corpus()).await.expect("add");
    assert!(index.search("", 5).await.expect("blank").is_empty());
    assert!(index.search("openssl", 0).await.expect("k=0").is_empty());
    // unbalanced syntax must not fail the branch
    index.search("openssl AND (", 5).await.expect("lenient");
}

#[tokio::test]
async fn purge_removes_everything() {
    let tmp = TempDir::new().expect("tmp");
    let index = TantivyChunkIndex::open_or_create(tmp.path()).expect("index");
    index.add(&corpus()).await.expect("add");
    index.purge().await.expect("purge");
    assert_eq!(index.count().await.expect("count"), 0);
    assert!(index.existing_ids().await.expect("ids").is_empty());
}

#[test]
fn open_missing_index_is_unavailable() {
    let tmp = TempDir::new().expect("tmp");
    let err = TantivyChunkIndex::open(&tmp.path().join("nope")).err().expect("error");
    assert!(matches!(err, orion_core::error::Error::RetrievalUnavailable { branch: RetrievalBranch::Sparse, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn searches_run_concurrently_on_clones() {
    let tmp = TempDir::new().expect("tmp");
    let index = TantivyChunkIndex::open_or_create(tmp.path()).expect("index");
    index.add(&corpus()).await.expect("add");
    let other = index.clone();
    let (a, b) = tokio::join!(index.search("openssl", 5), other.search("kubernetes", 5));
    assert_eq!(a.expect("openssl").len(), 2);
    assert_eq!(b.expect("kubernetes")[0].chunk.id, "a:1:1");
}
