use std::fs;
use tempfile::TempDir;

use orion_core::config::Config;
use orion_core::data_processor::DataProcessor;
use orion_core::identity::compute_ids;
use orion_core::splitter::TextSplitter;
use orion_core::types::DocumentKind;

#[test]
fn terminal_logs_one_document_per_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.log"), "$ cargo build\nerror[E0425]").unwrap();
    fs::write(dir.join("b.log"), "   ").unwrap();

    let docs = DataProcessor::new().load_terminal_logs(dir).expect("load");

    assert_eq!(docs.len(), 1, "blank log is skipped");
    assert!(docs[0].source().unwrap().ends_with("a.log"));
    assert_eq!(docs[0].metadata.get("type").map(String::as_str), Some("terminal"));
}

#[test]
fn github_prs_use_number_and_created_at_as_locator() {
    let tmp = TempDir::new().unwrap();
    let json = r#"[
        {"pr_number": 42, "created_at": "2024-05-01T10:00:00Z", "pr_body": "Fix retry. ", "diff": "+retry()"},
        {"pr_number": 43, "created_at": "2024-05-02T10:00:00Z", "pr_body": null, "diff": null}
    ]"#;
    fs::write(tmp.path().join("2024_refined_pr_info.json"), json).unwrap();

    let docs = DataProcessor::new().load_github_prs(tmp.path()).expect("load");

    assert_eq!(docs.len(), 1, "empty PR bodies are dropped");
    assert_eq!(docs[0].content, "Fix retry. +retry()");
    assert_eq!(docs[0].source(), Some("github"));
    assert_eq!(docs[0].locator(), Some("422024-05-01T10:00:00Z"));
    assert_eq!(docs[0].metadata.get("time").map(String::as_str), Some("2024-05-01T10:00:00Z"));
}

#[test]
fn github_prs_missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    assert!(DataProcessor::new().load_github_prs(tmp.path()).is_err());
}

#[test]
fn slack_messages_become_documents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("slack.json");
    fs::write(&path, r#"[{"text": "deploy is red", "timestamp": "1712.0001", "datetime": "2024-04-01 09:00:00"}]"#).unwrap();

    let docs = DataProcessor::new().load_slack_messages(&path).expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].source(), Some("slack"));
    assert_eq!(docs[0].locator(), Some("1712.0001"));
}

#[test]
fn loaded_text_files_get_stable_ids() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("manual.txt"), "alpha bravo").unwrap();

    let processor = DataProcessor::new();
    let splitter = TextSplitter::default();
    let run = || {
        let docs = processor.load_text_files(tmp.path()).expect("load");
        compute_ids(splitter.split_documents(&docs)).0
    };
    let first = run();
    let second = run();

    assert_eq!(first.len(), 1);
    assert!(first[0].id.ends_with("manual.txt:0:0"), "id was {}", first[0].id);
    assert_eq!(first[0].kind(), Some(DocumentKind::Pdf));
    assert_eq!(first[0].id, second[0].id);
}

#[test]
fn config_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::load_from(tmp.path(), "test").expect("load").settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.retrieval.chunk_size, 500);
    assert_eq!(settings.models.llm_model, "llama3");
}

#[test]
fn config_env_file_overrides_base() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ntop_k = 7\n[data]\ntable = \"base\"\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[data]\ntable = \"test_chunks\"\n").unwrap();

    let config = Config::load_from(tmp.path(), "test").expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.retrieval.top_k, 7);
    assert_eq!(settings.data.table, "test_chunks");
    assert_eq!(config.get::<usize>("retrieval.top_k").expect("key"), 7);
}

#[test]
fn config_rejects_overlap_not_smaller_than_chunk() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\nchunk_size = 50\nchunk_overlap = 50\n").unwrap();
    assert!(Config::load_from(tmp.path(), "test").is_err());
}
