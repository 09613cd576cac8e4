use std::collections::HashMap;

use crate::math;

/// Five short, semantically-aligned anchor phrases per domain. Crossing
/// domains along the same anchor index (warm/comfort, elegant/refined,
/// casual/relaxed, minimalist/clean, chaotic/energetic) is what makes the
/// resulting centroid difference a meaningful "bridge" rather than noise.
pub const DOMAIN_ANCHORS: &[(&str, [&str; 5])] = &[
    (
        "restaurant",
        [
            "cozy restaurant ambiance warmth",
            "fine dining experience elegance",
            "casual eatery atmosphere relaxed",
            "minimalist clean aesthetic dining",
            "chaotic bustling energy food",
        ],
    ),
    (
        "movie",
        [
            "comfort film warmth nostalgia",
            "drama cinema elegance artistic",
            "casual comedy relaxed entertainment",
            "minimalist art-house aesthetic cinema",
            "chaotic thriller energy suspense",
        ],
    ),
    (
        "music",
        [
            "warm acoustic ambient comfort",
            "classical orchestral elegance refined",
            "casual indie relaxed mellow",
            "minimalist electronic aesthetic clean",
            "chaotic noise experimental energy",
        ],
    ),
    (
        "book",
        [
            "cozy literary fiction warmth",
            "literary drama elegance prose",
            "casual reading relaxed light",
            "minimalist poetry aesthetic sparse",
            "chaotic experimental narrative energy",
        ],
    ),
    (
        "architecture",
        [
            "warm wooden interior comfort",
            "classical elegant design refined",
            "casual modern relaxed spaces",
            "minimalist brutalist aesthetic clean",
            "chaotic deconstructivist energy bold",
        ],
    ),
];

/// `B(target, source) = centroid(target) − centroid(source)` for every
/// ordered pair of distinct domains.
pub fn compute_bridge_vectors(centroids: &HashMap<String, Vec<f32>>) -> HashMap<(String, String), Vec<f32>> {
    let mut bridges = HashMap::new();
    for target in centroids.keys() {
        for source in centroids.keys() {
            if target == source {
                continue;
            }
            let bridge = math::sub(&centroids[target], &centroids[source]);
            bridges.insert((target.clone(), source.clone()), bridge);
        }
    }
    bridges
}
