//! Vector operations for embeddings.

use crate::{Error, Result};

pub type Vector = Vec<f32>;

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::validation(format!(
            "Vector dimensions must match: {} != {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity of two vectors.
///
/// `Ok(None)` when the similarity is undefined: either vector has zero norm or
/// the result is not finite. Mismatched dimensions are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<Option<f32>> {
    let dot = dot_product(a, b)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(None);
    }
    let similarity = dot / (mag_a * mag_b);
    Ok(similarity.is_finite().then_some(similarity))
}

/// The degenerate embedding stored when no real one could be obtained.
pub fn zero_vector(dimensions: usize) -> Vector {
    vec![0.0; dimensions]
}
