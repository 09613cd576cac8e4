/// Epsilon floor used everywhere a norm could legitimately be zero
/// (a zero memory set, an all-zero embedding) — guards every division.
const EPS: f32 = 1e-10;

pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = norm(v) + EPS;
    v.iter().map(|x| x / n).collect()
}

pub fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn sub(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub fn scale(v: &[f32], s: f32) -> Vec<f32> {
    v.iter().map(|x| x * s).collect()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

pub fn mean_vector(vectors: &[Vec<f32>]) -> Vec<f32> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let dim = vectors[0].len();
    let mut sum = vec![0.0f32; dim];
    for v in vectors {
        for (s, x) in sum.iter_mut().zip(v.iter()) {
            *s += x;
        }
    }
    let n = vectors.len() as f32;
    sum.iter().map(|x| x / n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_vector() {
        let v = vec![3.0, 4.0];
        let n = normalize(&v);
        assert!((norm(&n) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_floored() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    proptest::proptest! {
        /// `normalize` always returns a unit vector, for any non-degenerate
        /// input (spec §8's "Invariants": every embedding-arithmetic output
        /// is a unit vector).
        #[test]
        fn normalize_is_always_unit_norm(
            v in proptest::collection::vec(-100.0f32..100.0f32, 2..16)
                .prop_filter("non-zero", |v| norm(v) > 1e-3)
        ) {
            let n = normalize(&v);
            proptest::prop_assert!((norm(&n) - 1.0).abs() < 1e-3);
        }

        #[test]
        fn cosine_similarity_is_bounded(
            a in proptest::collection::vec(-100.0f32..100.0f32, 2..16),
            b in proptest::collection::vec(-100.0f32..100.0f32, 2..16),
        ) {
            let dim = a.len().min(b.len());
            let sim = cosine_similarity(&a[..dim], &b[..dim]);
            proptest::prop_assert!(sim >= -1.0 - 1e-3 && sim <= 1.0 + 1e-3);
        }
    }
}
