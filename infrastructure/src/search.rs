/// Keeps zero vectors from dividing by zero.
pub const SIMILARITY_EPSILON: f32 = 1e-8;

pub struct SearchEngine;

impl SearchEngine {
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot_product / (norm_a * norm_b + SIMILARITY_EPSILON)
    }

    /// Every candidate index with its score, best first. Equal scores keep corpus order.
    pub fn rank(query: &[f32], vectors: &[Vec<f32>]) -> Vec<(usize, f32)> {
        let mut similarities: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(idx, v)| (idx, Self::cosine_similarity(query, v)))
            .collect();
        // sort_by is stable; NaN scores (overflowed vectors) rank last
        similarities.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
        similarities
    }

    pub fn top_k(query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<usize> {
        let ranked = Self::rank(query, vectors);
        tracing::debug!(
            candidates = ranked.len(),
            best = ranked.first().map(|(_, s)| *s),
            "ranked corpus"
        );
        ranked.into_iter().take(k).map(|(idx, _)| idx).collect()
    }
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
