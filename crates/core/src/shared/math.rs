//! Embedding arithmetic shared by the verification and matching adapters.

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum::<f64>()
        .sqrt()
}

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// Returns `None` when the vectors cannot be compared: different lengths,
/// empty, or either one has zero norm.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    Some(1.0 - similarity)
}
