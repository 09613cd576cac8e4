use nalgebra::DMatrix;
use rand_distr::{Distribution, Normal};
use tangent_core::Memory;

use crate::config::VectorMathConfig;
use crate::math;

/// `Q_serendipity = V_user - λ · Σ proj_Vi(V_user)` over the top-k
/// dominant right-singular directions of the centered memory set.
///
/// Below `pca_min_memories`, falls back to the normalized centroid with
/// no subtractions — the user simply doesn't have enough history yet to
/// say what their "dominant genre" is.
pub fn principal_component_subtraction(
    embeddings: &[Vec<f32>],
    memories: &[Memory],
    config: &VectorMathConfig,
) -> anyhow::Result<(Vec<f32>, Vec<String>)> {
    if embeddings.len() < config.pca_min_memories {
        if embeddings.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let centroid = math::mean_vector(embeddings);
        return Ok((math::normalize(&centroid), Vec::new()));
    }

    let dim = embeddings[0].len();
    let v_user = math::mean_vector(embeddings);

    let centered: Vec<Vec<f32>> = embeddings.iter().map(|e| math::sub(e, &v_user)).collect();

    let right_singular_vectors = svd_right_singular_vectors(&centered, dim, config.pca_num_components)?;

    let mut q_serendipity = v_user.clone();
    let mut subtracted_tags = Vec::new();

    for v_dominant in &right_singular_vectors {
        let projection_scalar = math::dot(&v_user, v_dominant);
        let projection = math::scale(v_dominant, projection_scalar);
        q_serendipity = math::sub(&q_serendipity, &math::scale(&projection, config.pca_lambda_surprise));

        // "Name the ghost": the memory whose embedding projects furthest
        // along this axis is the one that most defines it.
        let mut best_idx = 0usize;
        let mut best_abs = f32::MIN;
        for (idx, centered_embedding) in centered.iter().enumerate() {
            let score = math::dot(centered_embedding, v_dominant).abs();
            if score > best_abs {
                best_abs = score;
                best_idx = idx;
            }
        }
        let snippet: String = memories[best_idx].content.chars().take(80).collect();
        subtracted_tags.push(snippet);
    }

    Ok((math::normalize(&q_serendipity), subtracted_tags))
}

/// Returns the top-`k` right-singular vectors (rows of `Vt`) of the
/// centered embedding matrix, retrying once with tiny Gaussian jitter if
/// the SVD fails to converge (mirrors `vector_math.py`'s jitter-retry).
fn svd_right_singular_vectors(centered: &[Vec<f32>], dim: usize, k: usize) -> anyhow::Result<Vec<Vec<f32>>> {
    let rows = centered.len();
    let build_matrix = |data: &[Vec<f32>]| -> DMatrix<f32> {
        DMatrix::from_fn(rows, dim, |r, c| data[r][c])
    };

    let matrix = build_matrix(centered);
    if let Some(vectors) = try_svd(&matrix, k) {
        return Ok(vectors);
    }

    let normal = Normal::new(0.0f32, 1e-9).expect("valid normal distribution");
    let mut rng = rand::thread_rng();
    let jittered: Vec<Vec<f32>> = centered
        .iter()
        .map(|row| row.iter().map(|x| x + normal.sample(&mut rng)).collect())
        .collect();
    let jittered_matrix = build_matrix(&jittered);

    try_svd(&jittered_matrix, k)
        .ok_or_else(|| anyhow::anyhow!("SVD failed to converge even after jitter retry"))
}

fn try_svd(matrix: &DMatrix<f32>, k: usize) -> Option<Vec<Vec<f32>>> {
    let svd = matrix.clone().svd(false, true);
    let v_t = svd.v_t?;
    let num_components = k.min(v_t.nrows());
    Some((0..num_components).map(|i| v_t.row(i).iter().copied().collect()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(content: &str) -> Memory {
        Memory {
            id: "m".to_string(),
            content: content.to_string(),
            similarity: None,
            created_at: None,
            last_accessed: None,
            relationships: Vec::new(),
        }
    }

    #[test]
    fn falls_back_to_centroid_below_min_memories() {
        let config = VectorMathConfig { pca_min_memories: 5, ..VectorMathConfig::default() };
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0]];
        let memories = vec![memory("a"), memory("b")];

        let (vector, tags) = principal_component_subtraction(&embeddings, &memories, &config).unwrap();

        assert!(tags.is_empty());
        assert!((math::norm(&vector) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn subtracts_dominant_axis_when_it_is_the_only_signal() {
        // Ten memories equal to e1 plus a small signed multiple of a fixed
        // direction nearly aligned with e1 — the centered matrix is then
        // exactly rank-1, so its single dominant right-singular vector is
        // that direction and gets fully subtracted out.
        let config = VectorMathConfig { pca_min_memories: 5, pca_num_components: 1, ..VectorMathConfig::default() };
        let direction = math::normalize(&[1.0, 0.005, 0.005]);

        let mut embeddings = Vec::new();
        let mut memories = Vec::new();
        for i in 0..10 {
            let c = (i as f32 - 4.5) * 1e-3;
            embeddings.push(vec![
                1.0 + c * direction[0],
                c * direction[1],
                c * direction[2],
            ]);
            memories.push(memory(&format!("memory about cyberpunk anime #{i}")));
        }

        let (vector, tags) = principal_component_subtraction(&embeddings, &memories, &config).unwrap();

        assert!(!tags.is_empty());
        // The dominant axis (e1) should be almost entirely subtracted out.
        assert!(vector[0].abs() <= 1e-2, "e1 component was {}", vector[0]);
    }

    proptest::proptest! {
        /// `Q_serendipity` is always unit-norm (or zero-length, below
        /// `pca_min_memories`) regardless of how many memories feed it —
        /// spec §8's "Round-trips" property for PCA output.
        #[test]
        fn output_is_always_unit_norm_or_empty(
            count in 0usize..12,
            seed in 0u32..1000,
        ) {
            let config = VectorMathConfig { pca_min_memories: 5, pca_num_components: 2, ..VectorMathConfig::default() };
            let mut embeddings = Vec::new();
            let mut memories = Vec::new();
            for i in 0..count {
                let s = (seed as f32 + i as f32) * 0.017;
                embeddings.push(vec![s.sin(), s.cos(), (s * 1.3).sin(), (s * 0.7).cos()]);
                memories.push(memory(&format!("memory {i}")));
            }

            let (vector, _) = principal_component_subtraction(&embeddings, &memories, &config).unwrap();
            if vector.is_empty() {
                proptest::prop_assert!(embeddings.is_empty());
            } else {
                proptest::prop_assert!((math::norm(&vector) - 1.0).abs() < 1e-3);
            }
        }
    }
}
