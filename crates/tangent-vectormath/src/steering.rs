use crate::math;

/// `Q = V_taste + α · (V_target_vibe − V_current_context)`.
///
/// Deliberately not pure negation (`−V_context`) — in high-dimensional
/// embedding spaces that produces noise rather than a meaningful
/// direction. Steering instead moves *towards* a target vibe, weighted by
/// long-term taste.
pub fn antonym_steering(memory_embeddings: &[Vec<f32>], v_context: &[f32], v_target: &[f32], alpha: f32) -> Vec<f32> {
    let v_taste = if memory_embeddings.is_empty() {
        vec![0.0; v_context.len()]
    } else {
        math::mean_vector(memory_embeddings)
    };

    let direction = math::sub(v_target, v_context);
    let q = math::add(&v_taste, &math::scale(&direction, alpha));
    math::normalize(&q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_memories_returns_normalized_alpha_scaled_direction() {
        let v_context = vec![1.0, 0.0];
        let v_target = vec![0.0, 1.0];
        let result = antonym_steering(&[], &v_context, &v_target, 0.5);

        // Expected: normalize(0.5 * (target - context)) = normalize([-0.5, 0.5])
        let expected = math::normalize(&[-0.5, 0.5]);
        for (a, b) in result.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
