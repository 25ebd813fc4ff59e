//! Ranking of candidate vectors against a query by cosine similarity.
//!
//! Two algorithms with identical output:
//! - `Naive`: one cosine per candidate pair.
//! - `Batched`: candidates packed into one row-major matrix and scored as a
//!   single similarity row (rows processed in parallel).
//!
//! Both use the same `dot`/`norm` kernels, so scores are bitwise equal and
//! the stable descending sort yields the same order, ties in input order.

use std::str::FromStr;

use rayon::prelude::*;

use crate::domain::value_objects::embedding_vector::{cosine_with_norms, norm};
use crate::domain::value_objects::{EmbeddingVector, SimilarityError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    Naive,
    #[default]
    Batched,
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "naive" => Ok(MatchStrategy::Naive),
            "batched" | "batch" => Ok(MatchStrategy::Batched),
            other => Err(format!("Invalid match strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedIndex {
    pub index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    strategy: MatchStrategy,
}

impl Matcher {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn rank(
        &self,
        query: &EmbeddingVector,
        candidates: &[&EmbeddingVector],
    ) -> Result<Vec<RankedIndex>, SimilarityError> {
        match self.strategy {
            MatchStrategy::Naive => rank_naive(query, candidates),
            MatchStrategy::Batched => rank_batched(query, candidates),
        }
    }

    pub fn top_k(
        &self,
        query: &EmbeddingVector,
        candidates: &[&EmbeddingVector],
        k: usize,
    ) -> Result<Vec<RankedIndex>, SimilarityError> {
        let mut ranked = self.rank(query, candidates)?;
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Ranks arbitrary items carrying a vector, returning the top `k` with scores.
    pub fn rank_items<'a, T>(
        &self,
        query: &EmbeddingVector,
        items: &'a [T],
        vector_of: impl Fn(&T) -> &EmbeddingVector,
        k: usize,
    ) -> Result<Vec<(&'a T, f32)>, SimilarityError> {
        let vectors: Vec<&EmbeddingVector> = items.iter().map(&vector_of).collect();
        let ranked = self.top_k(query, &vectors, k)?;
        Ok(ranked
            .into_iter()
            .map(|r| (&items[r.index], r.score))
            .collect())
    }
}

pub fn rank_naive(
    query: &EmbeddingVector,
    candidates: &[&EmbeddingVector],
) -> Result<Vec<RankedIndex>, SimilarityError> {
    let mut ranked = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let score = query.cosine_similarity(candidate)?;
        ranked.push(RankedIndex { index, score });
    }
    sort_descending(&mut ranked);
    Ok(ranked)
}

pub fn rank_batched(
    query: &EmbeddingVector,
    candidates: &[&EmbeddingVector],
) -> Result<Vec<RankedIndex>, SimilarityError> {
    for candidate in candidates {
        query.ensure_comparable(candidate)?;
    }

    let dimension = query.dimension();
    let scores = if dimension == 0 {
        // Zero-length rows cannot be chunked; every cosine is 0 as in `rank_naive`.
        vec![0.0; candidates.len()]
    } else {
        let mut matrix = Vec::with_capacity(candidates.len() * dimension);
        for candidate in candidates {
            matrix.extend_from_slice(candidate.values());
        }
        similarity_row(query.values(), &matrix, dimension)
    };
    let mut ranked: Vec<RankedIndex> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| RankedIndex { index, score })
        .collect();
    sort_descending(&mut ranked);
    Ok(ranked)
}

/// Cosine of `query` against every row of a row-major `matrix`.
pub fn similarity_row(query: &[f32], matrix: &[f32], dimension: usize) -> Vec<f32> {
    if dimension == 0 {
        return Vec::new();
    }
    let query_norm = norm(query);
    matrix
        .par_chunks(dimension)
        .map(|row| cosine_with_norms(query, query_norm, row, norm(row)))
        .collect()
}

/// Full pairwise cosine matrix: `rows.len()/dimension` × `cols.len()/dimension`,
/// returned row-major.
pub fn similarity_matrix(rows: &[f32], cols: &[f32], dimension: usize) -> Vec<f32> {
    if dimension == 0 {
        return Vec::new();
    }
    let col_norms: Vec<f32> = cols.chunks(dimension).map(norm).collect();
    rows.par_chunks(dimension)
        .flat_map_iter(|row| {
            let row_norm = norm(row);
            cols.chunks(dimension)
                .zip(col_norms.iter())
                .map(move |(col, col_norm)| cosine_with_norms(row, row_norm, col, *col_norm))
        })
        .collect()
}

fn sort_descending(ranked: &mut [RankedIndex]) {
    // Stable: equal scores keep their input order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
}
