//! Filesystem loaders for the ingestion boundary.
//!
//! Each loader turns one kind of on-disk export into `RawDocument`s carrying
//! `source`, `page`, `time` and `type` metadata. Splitting and identity happen later.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DocumentKind, RawDocument, LOCATOR_KEY, SOURCE_KEY, TIME_KEY, TYPE_KEY};

const PR_FILE_SUFFIX: &str = "refined_pr_info.json";

#[derive(Debug, Deserialize)]
struct PullRequestRecord {
    pr_number: serde_json::Value,
    created_at: String,
    #[serde(default)]
    pr_body: Option<String>,
    #[serde(default)]
    diff: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackMessage {
    text: String,
    timestamp: String,
    datetime: String,
}

#[derive(Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    /// Every regular file under `dir` becomes one terminal-log document.
    pub fn load_terminal_logs(&self, dir: &Path) -> Result<Vec<RawDocument>> {
        let files = self.list_files(dir, |_| true);
        let mut docs = Vec::with_capacity(files.len());
        for path in files {
            let content = self.read_file_content(&path)?;
            if content.trim().is_empty() { continue; }
            docs.push(
                RawDocument::new(content)
                    .with_meta(SOURCE_KEY, path.to_string_lossy())
                    .with_meta(TYPE_KEY, DocumentKind::Terminal.as_str()),
            );
        }
        tracing::info!(dir = %dir.display(), documents = docs.len(), "loaded terminal logs");
        Ok(docs)
    }

    /// `.txt` exports of PDF pages; one document per file, locator `0`.
    pub fn load_text_files(&self, dir: &Path) -> Result<Vec<RawDocument>> {
        let files = self.list_files(dir, |p| p.extension().and_then(|s| s.to_str()) == Some("txt"));
        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut docs = Vec::with_capacity(files.len());
        for path in files {
            let content = self.read_file_content(&path)?;
            docs.push(
                RawDocument::new(content)
                    .with_meta(SOURCE_KEY, path.to_string_lossy())
                    .with_meta(LOCATOR_KEY, "0")
                    .with_meta(TYPE_KEY, DocumentKind::Pdf.as_str()),
            );
        }
        tracing::info!(dir = %dir.display(), documents = docs.len(), "loaded text files");
        Ok(docs)
    }

    /// Reads the first `*refined_pr_info.json` found in `dir`.
    pub fn load_github_prs(&self, dir: &Path) -> Result<Vec<RawDocument>> {
        let path = self
            .list_files(dir, |p| p.file_name().and_then(|s| s.to_str()).is_some_and(|n| n.ends_with(PR_FILE_SUFFIX)))
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No file ending with {} found in {}", PR_FILE_SUFFIX, dir.display()))?;
        let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let records: Vec<PullRequestRecord> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let docs: Vec<RawDocument> = records
            .into_iter()
            .map(|pr| {
                let number = match &pr.pr_number { serde_json::Value::String(s) => s.clone(), other => other.to_string() };
                let content = format!("{}{}", pr.pr_body.unwrap_or_default(), pr.diff.unwrap_or_default());
                RawDocument::new(content)
                    .with_meta(SOURCE_KEY, "github")
                    .with_meta(LOCATOR_KEY, format!("{}{}", number, pr.created_at))
                    .with_meta(TIME_KEY, pr.created_at)
                    .with_meta(TYPE_KEY, DocumentKind::Github.as_str())
            })
            .filter(|d| !d.content.trim().is_empty())
            .collect();
        tracing::info!(file = %path.display(), documents = docs.len(), "loaded pull requests");
        Ok(docs)
    }

    /// A JSON array of `{text, timestamp, datetime}` messages.
    pub fn load_slack_messages(&self, path: &Path) -> Result<Vec<RawDocument>> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let messages: Vec<SlackMessage> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(messages
            .into_iter()
            .filter(|m| !m.text.trim().is_empty())
            .map(|m| {
                RawDocument::new(m.text)
                    .with_meta(SOURCE_KEY, "slack")
                    .with_meta(LOCATOR_KEY, m.timestamp)
                    .with_meta(TIME_KEY, m.datetime)
                    .with_meta(TYPE_KEY, DocumentKind::Slack.as_str())
            })
            .collect())
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_files(&self, root: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && keep(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }
}
