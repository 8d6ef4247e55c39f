//! Merge of the two relevant sets into one candidate list.
use std::collections::HashSet;

use orion_core::types::ScoredChunk;

/// Sparse results first, then dense results whose id is not already present.
///
/// Neither input is resorted. When both branches found the same chunk the sparse
/// copy (and its score) is kept.
pub fn fuse(relevant_sparse: Vec<ScoredChunk>, relevant_dense: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut seen: HashSet<String> = HashSet::with_capacity(relevant_sparse.len() + relevant_dense.len());
    let mut fused = Vec::with_capacity(relevant_sparse.len() + relevant_dense.len());
    for candidate in relevant_sparse.into_iter().chain(relevant_dense) {
        if seen.insert(candidate.chunk.id.clone()) { fused.push(candidate); }
    }
    fused
}
