//! MaxSim late-interaction scoring
//!
//! For each query token vector, take the highest cosine similarity against any
//! document token vector; the relevance score is the sum of those maxima.
//!
//! The score is asymmetric: `score(a, b)` and `score(b, a)` differ in general
//! because the query drives the outer loop and the document is the search set.

use serde::Serialize;

use crate::encoder::MultiVectorEncoder;
use crate::error::{ColbertError, Result};

/// Best document match for one query token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenMatch {
    /// Index of the best document token, `None` for an empty document
    pub doc_index: Option<usize>,
    pub similarity: f64,
}

/// Per-query-token detail of a score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenScore {
    pub query_token: String,
    /// Empty when the document has no tokens
    pub best_match_doc_token: String,
    pub similarity: f64,
}

/// MaxSim score with token-level details
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub total_score: f64,
    pub query_token_count: usize,
    pub document_token_count: usize,
    pub token_scores: Vec<TokenScore>,
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0 when either norm is zero. Accumulates in f64 and clamps to
/// `[-1, 1]` to absorb rounding. Length mismatch is an invariant violation.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(ColbertError::invariant(format!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot / denominator).clamp(-1.0, 1.0))
    }
}

/// Best match of a single query vector within `document`.
///
/// Scans in order with a strict `>` so the first index attaining the maximum
/// wins.
pub fn best_match(query: &[f32], document: &[Vec<f32>]) -> Result<TokenMatch> {
    let mut best: Option<(usize, f64)> = None;
    for (j, doc_vector) in document.iter().enumerate() {
        let sim = cosine_similarity(query, doc_vector)?;
        match best {
            Some((_, max)) if sim <= max => {}
            _ => best = Some((j, sim)),
        }
    }

    Ok(match best {
        Some((j, sim)) => TokenMatch {
            doc_index: Some(j),
            similarity: sim,
        },
        None => TokenMatch {
            doc_index: None,
            similarity: 0.0,
        },
    })
}

/// MaxSim over raw vectors: total score plus one match per query vector
pub fn max_sim(query: &[Vec<f32>], document: &[Vec<f32>]) -> Result<(f64, Vec<TokenMatch>)> {
    let mut total = 0.0;
    let mut matches = Vec::with_capacity(query.len());
    for q in query {
        let m = best_match(q, document)?;
        total += m.similarity;
        matches.push(m);
    }
    Ok((total, matches))
}

/// Scores query/document texts end to end
#[derive(Clone)]
pub struct MaxSimScorer {
    encoder: MultiVectorEncoder,
}

impl MaxSimScorer {
    pub fn new(encoder: MultiVectorEncoder) -> Self {
        Self { encoder }
    }

    /// Encode both texts and compute their MaxSim score
    pub async fn score(&self, query: &str, document: &str) -> Result<ScoreResult> {
        let (query, document) = tokio::try_join!(
            self.encoder.encode_labeled(query),
            self.encoder.encode_labeled(document)
        )?;

        let (total_score, matches) = max_sim(&query.vectors, &document.vectors)?;

        let token_scores = query
            .tokens
            .iter()
            .zip(matches)
            .map(|(token, m)| TokenScore {
                query_token: token.clone(),
                best_match_doc_token: m
                    .doc_index
                    .map(|j| document.tokens[j].clone())
                    .unwrap_or_default(),
                similarity: m.similarity,
            })
            .collect();

        log::debug!(
            "MaxSim score {:.4} ({} query tokens, {} document tokens)",
            total_score,
            query.token_count(),
            document.token_count()
        );

        Ok(ScoreResult {
            total_score,
            query_token_count: query.token_count(),
            document_token_count: document.token_count(),
            token_scores,
        })
    }
}
