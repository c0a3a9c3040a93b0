//! Vector math shared by every component.
//!
//! Embeddings are plain `f64` slices. Callers are expected to compare
//! vectors of equal dimension; the catalog enforces this per snapshot.

/// Dot product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimension mismatch");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Cosine similarity between two f64 slices.
///
/// Returns 0.0 if either vector has zero magnitude.
/// Panics if slices have different lengths.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "vector dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    dot / denom
}

/// Cosine distance: `1 - cosine_similarity`. Lower means more similar.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// `acc += weight * v`, component-wise.
pub fn add_scaled(acc: &mut [f64], v: &[f64], weight: f64) {
    debug_assert_eq!(acc.len(), v.len(), "vector dimension mismatch");
    for (a, x) in acc.iter_mut().zip(v) {
        *a += weight * x;
    }
}

/// Multiplies every component by `factor`.
pub fn scale(v: &mut [f64], factor: f64) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}
