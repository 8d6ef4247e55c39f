use async_trait::async_trait;

use orion_core::error::Result;
use orion_core::traits::RelevanceJudge;
use orion_core::types::DocumentChunk;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how", "i", "in", "is",
    "it", "of", "on", "or", "the", "this", "to", "was", "what", "when", "where", "which", "who", "why", "with",
];

/// Relevant when the chunk shares at least one non-stop-word term with the query.
/// Runs without a model, for offline runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordJudge;

impl KeywordJudge {
    fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !STOP_WORDS.contains(&t.as_str()))
    }

    pub fn is_relevant(content: &str, query: &str) -> bool {
        let content: std::collections::HashSet<String> = Self::terms(content).collect();
        Self::terms(query).any(|t| content.contains(&t))
    }
}

#[async_trait]
impl RelevanceJudge for KeywordJudge {
    async fn judge(&self, chunk: &DocumentChunk, query: &str) -> Result<bool> { Ok(Self::is_relevant(&chunk.content, query)) }
}

#[cfg(test)]
mod tests {
    use super::KeywordJudge;

    #[test]
    fn shared_terms_decide() {
        assert!(KeywordJudge::is_relevant("OpenSSL linker error during cargo build", "why does the linker fail?"));
        assert!(!KeywordJudge::is_relevant("lunch menu for friday", "linker error"));
        assert!(!KeywordJudge::is_relevant("the is a", "what is the"));
    }
}
