//! Stable relevance partition of one branch's candidates.
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

use orion_core::traits::RelevanceJudge;
use orion_core::types::ScoredChunk;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graded {
    pub relevant: Vec<ScoredChunk>,
    pub irrelevant: Vec<ScoredChunk>,
}

pub struct RelevanceGrader { judge: Arc<dyn RelevanceJudge> }

impl RelevanceGrader {
    pub fn new(judge: Arc<dyn RelevanceJudge>) -> Self { Self { judge } }

    /// Splits `candidates` by the judge's verdict, keeping input order on both sides.
    ///
    /// Judgments run concurrently. A judge error sends that chunk to `irrelevant`
    /// and is logged; it never fails the whole grading.
    pub async fn grade(&self, candidates: Vec<ScoredChunk>, query: &str) -> Graded {
        if candidates.is_empty() { return Graded::default(); }
        let verdicts = join_all(candidates.iter().map(|c| self.judge.judge(&c.chunk, query))).await;
        let mut graded = Graded::default();
        for (candidate, verdict) in candidates.into_iter().zip(verdicts) {
            match verdict {
                Ok(true) => graded.relevant.push(candidate),
                Ok(false) => graded.irrelevant.push(candidate),
                Err(e) => {
                    warn!(id = %candidate.chunk.id, branch = %candidate.branch, error = %e, "relevance judgment failed, treating as irrelevant");
                    graded.irrelevant.push(candidate);
                }
            }
        }
        graded
    }
}
