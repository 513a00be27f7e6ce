//! Dominant color extraction with multi-attempt k-means.

use std::collections::HashMap;

use kmeans_colors::{Kmeans, get_kmeans};
use palette::Srgb;

/// `kmeans_colors` stores cluster assignments as `u8`.
pub const MAX_CENTROIDS: usize = 256;

/// Number of centroids used by [`dominant_color`].
const DOMINANT_CENTROIDS: usize = 5;

/// Tuning for the clustering runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterOptions {
    /// Independent k-means runs; the one with the lowest total intra-cluster
    /// variance wins.
    pub attempts: usize,
    /// Lloyd passes per run, at most.
    pub max_iter: usize,
    /// A run stops early once a pass moves the centroids by at most this, in
    /// 0..255 channel units. `kmeans_colors` measures the norm of the summed
    /// per-channel shift of all centroids, so opposite moves cancel out.
    pub epsilon: f32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            attempts: 10,
            max_iter: 10,
            epsilon: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorCluster {
    /// Mean color of the cluster, channels in `0.0..=1.0`.
    pub centroid: Srgb<f32>,
    /// Number of pixels assigned to this cluster.
    pub population: usize,
}

impl ColorCluster {
    /// Centroid channels on the 0..255 scale.
    pub fn channels(&self) -> [f32; 3] {
        [
            self.centroid.red * 255.0,
            self.centroid.green * 255.0,
            self.centroid.blue * 255.0,
        ]
    }

    /// Centroid rounded to 8-bit channels.
    pub fn rgb(&self) -> Srgb<u8> {
        self.centroid.into_format()
    }
}

/// Partition `pixels` into `2 * k` clusters and return up to `k` of them,
/// most populated first.
///
/// Equal populations keep centroid-index order. Empty clusters are dropped,
/// so fewer than `k` clusters come back when the image has too few distinct
/// colors. The result is a pure function of `(pixels, k, seed, options)`.
pub fn extract_clusters(
    pixels: &[Srgb<u8>],
    k: usize,
    seed: u64,
    options: &ClusterOptions,
) -> Vec<ColorCluster> {
    if k == 0 {
        return Vec::new();
    }
    let n_centroids = (2 * k).min(MAX_CENTROIDS);

    let mut clusters = cluster_pixels(pixels, n_centroids, seed, options);
    clusters.sort_by(|a, b| b.population.cmp(&a.population));
    clusters.truncate(k);
    clusters
}

/// The single most populated cluster out of five, or `None` for an empty image.
pub fn dominant_color(
    pixels: &[Srgb<u8>],
    seed: u64,
    options: &ClusterOptions,
) -> Option<ColorCluster> {
    cluster_pixels(pixels, DOMINANT_CENTROIDS, seed, options)
        .into_iter()
        .reduce(|best, c| if c.population > best.population { c } else { best })
}

/// Run clustering and return every non-empty cluster in centroid-index order.
fn cluster_pixels(
    pixels: &[Srgb<u8>],
    n_centroids: usize,
    seed: u64,
    options: &ClusterOptions,
) -> Vec<ColorCluster> {
    if pixels.is_empty() || n_centroids == 0 {
        return Vec::new();
    }

    // With no more distinct colors than centroids the exact partition is
    // already optimal (zero variance); k-means++ seeding would also stall on it.
    let distinct = distinct_colors(pixels);
    if distinct.len() <= n_centroids {
        log::debug!(
            "{} distinct colors for {n_centroids} centroids, using exact partition",
            distinct.len()
        );
        return distinct
            .into_iter()
            .map(|(color, population)| ColorCluster {
                centroid: color.into_format(),
                population,
            })
            .collect();
    }

    let buf: Vec<Srgb> = pixels.iter().map(|p| p.into_format()).collect();
    match best_attempt(&buf, n_centroids, seed, options) {
        Some(run) => clusters_from_run(&run.centroids, &run.indices),
        None => Vec::new(),
    }
}

/// One k-means run. Attempt `i` is seeded with `seed + i`.
fn run_attempt(
    buf: &[Srgb],
    n_centroids: usize,
    seed: u64,
    attempt: usize,
    options: &ClusterOptions,
) -> Kmeans<Srgb> {
    // `kmeans_colors` compares the squared shift in 0..1 units and always
    // makes one pass before checking its iteration cap.
    let converge = (options.epsilon / 255.0).powi(2);
    get_kmeans(
        n_centroids,
        options.max_iter.saturating_sub(1),
        converge,
        false,
        buf,
        seed.wrapping_add(attempt as u64),
    )
}

/// The run with the lowest [`variance`] out of `options.attempts`; the
/// earliest attempt wins on ties.
fn best_attempt(
    buf: &[Srgb],
    n_centroids: usize,
    seed: u64,
    options: &ClusterOptions,
) -> Option<Kmeans<Srgb>> {
    (0..options.attempts.max(1))
        .map(|i| {
            let run = run_attempt(buf, n_centroids, seed, i, options);
            let sse = variance(buf, &run);
            log::debug!("k-means attempt {i}: variance {sse}");
            (run, sse)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(run, _)| run)
}

/// Sum of squared distances from each pixel to its assigned centroid.
fn variance(buf: &[Srgb], run: &Kmeans<Srgb>) -> f64 {
    buf.iter()
        .zip(&run.indices)
        .map(|(p, &idx)| {
            let c = run.centroids[idx as usize];
            let dr = (p.red - c.red) as f64;
            let dg = (p.green - c.green) as f64;
            let db = (p.blue - c.blue) as f64;
            dr * dr + dg * dg + db * db
        })
        .sum()
}

/// Non-empty clusters of a finished run, in centroid-index order.
fn clusters_from_run(centroids: &[Srgb], indices: &[u8]) -> Vec<ColorCluster> {
    let mut populations = vec![0usize; centroids.len()];
    for &idx in indices {
        populations[idx as usize] += 1;
    }

    centroids
        .iter()
        .zip(populations)
        .filter(|(_, population)| *population > 0)
        .map(|(&centroid, population)| ColorCluster {
            centroid,
            population,
        })
        .collect()
}

/// Distinct colors with their counts, in order of first appearance.
fn distinct_colors(pixels: &[Srgb<u8>]) -> Vec<(Srgb<u8>, usize)> {
    let mut slots: HashMap<[u8; 3], usize> = HashMap::new();
    let mut out: Vec<(Srgb<u8>, usize)> = Vec::new();
    for p in pixels {
        let key = [p.red, p.green, p.blue];
        match slots.get(&key) {
            Some(&slot) => out[slot].1 += 1,
            None => {
                slots.insert(key, out.len());
                out.push((*p, 1));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gradient(w: u8, h: u8) -> Vec<Srgb<u8>> {
        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                out.push(Srgb::new(
                    x.wrapping_mul(16),
                    y.wrapping_mul(16),
                    (x ^ y).wrapping_mul(8),
                ));
            }
        }
        out
    }

    #[test]
    fn single_color_yields_one_cluster() {
        let pixels = vec![Srgb::new(255u8, 0, 0); 64];
        let clusters = extract_clusters(&pixels, 3, 0, &ClusterOptions::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].population, 64);
        assert_eq!(clusters[0].rgb(), Srgb::new(255, 0, 0));
    }

    #[test]
    fn equal_populations_keep_first_seen_order() {
        let mut pixels = Vec::new();
        for i in 0..50 {
            if i % 2 == 0 {
                pixels.push(Srgb::new(255u8, 0, 0));
            } else {
                pixels.push(Srgb::new(0u8, 0, 255));
            }
        }
        let clusters = extract_clusters(&pixels, 2, 7, &ClusterOptions::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].population, 25);
        assert_eq!(clusters[1].population, 25);
        assert_eq!(clusters[0].rgb(), Srgb::new(255, 0, 0));
        assert_eq!(clusters[1].rgb(), Srgb::new(0, 0, 255));
    }

    #[test]
    fn clusters_are_sorted_by_population() {
        let pixels = gradient(16, 16);
        let clusters = extract_clusters(&pixels, 3, 42, &ClusterOptions::default());
        assert!(!clusters.is_empty() && clusters.len() <= 3);
        for pair in clusters.windows(2) {
            assert!(pair[0].population >= pair[1].population);
        }
        let total: usize = clusters.iter().map(|c| c.population).sum();
        assert!(total <= pixels.len());
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let pixels = gradient(16, 16);
        let opts = ClusterOptions::default();
        let a = extract_clusters(&pixels, 4, 1234, &opts);
        let b = extract_clusters(&pixels, 4, 1234, &opts);
        assert_eq!(a, b);
    }

    #[test]
    fn centroids_stay_in_channel_range() {
        let pixels = gradient(12, 12);
        for c in extract_clusters(&pixels, 5, 3, &ClusterOptions::default()) {
            for v in c.channels() {
                assert!((0.0..=255.0 + 1e-3).contains(&v));
            }
        }
    }

    #[test]
    fn majority_color_dominates() {
        let mut pixels = vec![Srgb::new(0u8, 200, 0); 300];
        pixels.extend(gradient(8, 8));
        let clusters = extract_clusters(&pixels, 2, 9, &ClusterOptions::default());
        let top = clusters[0].channels();
        assert_abs_diff_eq!(top[0], 0.0, epsilon = 15.0);
        assert_abs_diff_eq!(top[1], 200.0, epsilon = 15.0);
        assert_abs_diff_eq!(top[2], 0.0, epsilon = 15.0);
    }

    #[test]
    fn dominant_color_picks_largest_cluster() {
        let mut pixels = vec![Srgb::new(10u8, 10, 10); 10];
        pixels.extend(vec![Srgb::new(240u8, 240, 240); 30]);
        let dominant = dominant_color(&pixels, 0, &ClusterOptions::default()).unwrap();
        assert_eq!(dominant.population, 30);
        assert_eq!(dominant.rgb(), Srgb::new(240, 240, 240));
    }

    fn blobs(bases: &[(u8, u8, u8)], per_shade: usize) -> Vec<Srgb<u8>> {
        let mut out = Vec::new();
        for &(r, g, b) in bases {
            for shade in 0..3u8 {
                for _ in 0..per_shade {
                    out.push(Srgb::new(r.saturating_add(shade), g.saturating_add(shade), b));
                }
            }
        }
        out
    }

    #[test]
    fn best_attempt_has_lowest_variance() {
        let buf: Vec<Srgb> = gradient(24, 24).iter().map(|p| p.into_format()).collect();
        let opts = ClusterOptions::default();
        for seed in 0..6u64 {
            let best = best_attempt(&buf, 6, seed, &opts).unwrap();
            let best_sse = variance(&buf, &best);
            let variances: Vec<f64> = (0..opts.attempts)
                .map(|i| variance(&buf, &run_attempt(&buf, 6, seed, i, &opts)))
                .collect();
            let lowest = variances.iter().copied().fold(f64::INFINITY, f64::min);
            assert_eq!(best_sse, lowest, "seed {seed}: {variances:?}");
        }
    }

    #[test]
    fn kmeans_ties_keep_centroid_order() {
        // four separated groups of three shades each, equal sizes
        let pixels = blobs(&[(250, 0, 0), (0, 250, 0), (0, 0, 250), (120, 120, 120)], 5);
        let opts = ClusterOptions::default();

        let all = cluster_pixels(&pixels, 4, 17, &opts);
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|c| c.population == 15));

        let top = extract_clusters(&pixels, 2, 17, &opts);
        assert_eq!(top, all[..2].to_vec());
    }

    #[test]
    fn empty_centroids_are_dropped() {
        let centroids = [
            Srgb::new(1.0, 0.0, 0.0),
            Srgb::new(0.0, 1.0, 0.0),
            Srgb::new(0.0, 0.0, 1.0),
        ];
        let clusters = clusters_from_run(&centroids, &[2, 0, 2, 2, 0]);
        assert_eq!(clusters.len(), 2);
        assert_eq!((clusters[0].centroid, clusters[0].population), (centroids[0], 2));
        assert_eq!((clusters[1].centroid, clusters[1].population), (centroids[2], 3));
    }

    #[test]
    fn kmeans_path_returns_at_most_k_nonempty_clusters() {
        let pixels = blobs(&[(200, 30, 30), (30, 30, 200)], 8);
        let clusters = extract_clusters(&pixels, 2, 5, &ClusterOptions::default());
        assert!(!clusters.is_empty() && clusters.len() <= 2);
        assert!(clusters.iter().all(|c| c.population > 0));
        for pair in clusters.windows(2) {
            assert!(pair[0].population >= pair[1].population);
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        let opts = ClusterOptions::default();
        assert!(extract_clusters(&[], 3, 0, &opts).is_empty());
        assert!(dominant_color(&[], 0, &opts).is_none());
    }
}
