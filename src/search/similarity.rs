//! Cosine similarity and stable top-k ranking over in-memory vectors.

use std::cmp::Ordering;

/// Two vectors of different dimension were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("vector length mismatch: {left} != {right}")]
pub struct LengthMismatch {
    pub left: usize,
    pub right: usize,
}

/// A candidate paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

/// `dot(a, b) / (|a| * |b|)`, accumulated in f64.
///
/// Returns exactly `0.0` when either vector has zero norm, including a zero
/// vector compared with itself.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, LengthMismatch> {
    if a.len() != b.len() {
        return Err(LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Score every candidate against `query` and keep the best `k`.
///
/// Sorting is stable: equal scores keep the order in which candidates were
/// supplied. NaN scores sort after every number.
pub fn rank<T, V>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (T, V)>,
    k: usize,
) -> Result<Vec<Ranked<T>>, LengthMismatch>
where
    V: AsRef<[f32]>,
{
    let mut scored = candidates
        .into_iter()
        .map(|(item, vector)| {
            cosine_similarity(query, vector.as_ref()).map(|score| Ranked { item, score })
        })
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|a, b| descending(a.score, b.score));
    scored.truncate(k);
    Ok(scored)
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
