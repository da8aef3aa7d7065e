use super::{
    silhouette_score, squared_distance, DEFAULT_MAX_ITERATIONS, DEFAULT_RANDOM_SEED,
    DEFAULT_RESTARTS, DEFAULT_TOLERANCE,
};
use crate::{
    error::ClusteringError,
    scale::{Feature, FeatureMatrix, NUM_FEATURES},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/**
 * Settings for a k-means clustering.
 *
 * Every run is seeded from `random_seed`, so the same features and settings always produce the
 * same clusters.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    k: usize,
    random_seed: u64,
    max_iterations: usize,
    restarts: usize,
    tolerance: f64,
}

/// The outcome of clustering a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    labels: Vec<usize>,
    centroids: Vec<Feature>,
    inertia: f64,
    iterations: usize,
    validity: Result<f64, ClusteringError>,
}

/// One seeded run of Lloyd's algorithm.
struct Run {
    labels: Vec<usize>,
    centroids: Vec<Feature>,
    inertia: f64,
    iterations: usize,
}

impl KMeans {
    /// Cluster into `k` groups with the default seed and limits.
    pub fn new(k: usize) -> Self {
        KMeans {
            k,
            random_seed: DEFAULT_RANDOM_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            restarts: DEFAULT_RESTARTS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_seed(self, random_seed: u64) -> Self {
        KMeans {
            random_seed,
            ..self
        }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        KMeans {
            max_iterations: max_iterations.max(1),
            ..self
        }
    }

    pub fn with_restarts(self, restarts: usize) -> Self {
        KMeans {
            restarts: restarts.max(1),
            ..self
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /**
     * Partition the rows of the feature matrix.
     *
     * Fails if `k` is zero or larger than the number of distinct rows. Cluster ids are numbered
     * in the order their first member appears in the matrix.
     */
    pub fn fit(&self, features: &FeatureMatrix) -> Result<Clustering, ClusteringError> {
        let distinct_points = features.distinct_rows();
        if self.k == 0 || self.k > distinct_points {
            return Err(ClusteringError::InvalidClusterCount {
                requested: self.k,
                distinct_points,
            });
        }

        let rows = features.rows();
        let tolerance = self.tolerance * mean_variance(rows);
        let mut rng = StdRng::seed_from_u64(self.random_seed);

        let mut best = self.single_run(rows, tolerance, &mut rng);
        for _ in 1..self.restarts {
            let run = self.single_run(rows, tolerance, &mut rng);
            if run.inertia < best.inertia {
                best = run;
            }
        }

        let Run {
            labels,
            centroids,
            inertia,
            iterations,
        } = best;
        let (labels, centroids) = canonical_order(labels, centroids);

        log::debug!(
            "k-means k={} converged in {} iterations, inertia {:.6}",
            self.k,
            iterations,
            inertia
        );

        let validity = silhouette_score(features, &labels);

        Ok(Clustering {
            labels,
            centroids,
            inertia,
            iterations,
            validity,
        })
    }

    fn single_run(&self, rows: &[Feature], tolerance: f64, rng: &mut StdRng) -> Run {
        let mut centroids = plus_plus_centroids(rows, self.k, rng);
        let k = centroids.len();
        let mut labels = vec![usize::MAX; rows.len()];
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            if !assign(rows, &centroids, &mut labels) {
                break;
            }

            let updated = update_centroids(rows, &centroids, &mut labels, k);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;

            if shift <= tolerance {
                assign(rows, &centroids, &mut labels);
                break;
            }
        }

        let inertia = rows
            .iter()
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, &centroids[label]))
            .sum();

        Run {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

impl Clustering {
    /// The cluster id of every row.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The cluster centers in feature space, indexed by cluster id.
    pub fn centroids(&self) -> &[Feature] {
        &self.centroids
    }

    /// Sum of squared distances from each row to its cluster center.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Lloyd iterations used by the winning run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The number of clusters that have at least one member.
    pub fn num_clusters(&self) -> usize {
        let mut seen = vec![false; self.centroids.len()];
        self.labels.iter().for_each(|&l| seen[l] = true);
        seen.into_iter().filter(|&s| s).count()
    }

    /// The silhouette score, or an error if it is undefined for this partition.
    pub fn validity_score(&self) -> Result<f64, ClusteringError> {
        self.validity
    }
}

/// Pick initial centers, each new one with probability proportional to its squared distance
/// from the nearest center already chosen.
fn plus_plus_centroids(rows: &[Feature], k: usize, rng: &mut StdRng) -> Vec<Feature> {
    let mut centroids = Vec::with_capacity(k);

    let first = rng.gen_range(0..rows.len());
    centroids.push(rows[first]);

    let mut min_dist2: Vec<f64> = rows
        .iter()
        .map(|row| squared_distance(row, &rows[first]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_dist2.iter().sum();
        if total <= 0.0 {
            break;
        }

        let target = rng.gen::<f64>() * total;
        let mut acc = 0.0;
        let mut chosen = None;
        for (i, &d2) in min_dist2.iter().enumerate() {
            if d2 <= 0.0 {
                continue;
            }

            acc += d2;
            chosen = Some(i);
            if acc > target {
                break;
            }
        }

        let next = match chosen {
            Some(i) => rows[i],
            None => break,
        };
        centroids.push(next);

        for (d2, row) in min_dist2.iter_mut().zip(rows) {
            *d2 = d2.min(squared_distance(row, &next));
        }
    }

    centroids
}

/// Assign each row to its nearest centroid, lowest index wins ties. Returns true if any label
/// changed.
fn assign(rows: &[Feature], centroids: &[Feature], labels: &mut [usize]) -> bool {
    let mut changed = false;

    for (row, label) in rows.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (j, centroid) in centroids.iter().enumerate() {
            let dist = squared_distance(row, centroid);
            if dist < best_dist {
                best_dist = dist;
                best = j;
            }
        }

        if *label != best {
            *label = best;
            changed = true;
        }
    }

    changed
}

/// Recalculate the centroids as the mean of their members.
///
/// A cluster that lost all its members takes over the row farthest from its current centroid,
/// as long as that row doesn't leave another cluster empty.
fn update_centroids(
    rows: &[Feature],
    centroids: &[Feature],
    labels: &mut [usize],
    k: usize,
) -> Vec<Feature> {
    let mut counts = vec![0usize; k];
    labels.iter().for_each(|&l| counts[l] += 1);

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let farthest = rows
            .iter()
            .zip(labels.iter())
            .enumerate()
            .filter(|(_, (_, l))| counts[**l] > 1)
            .map(|(i, (row, &l))| (i, squared_distance(row, &centroids[l])))
            .fold(None, |acc: Option<(usize, f64)>, (i, d2)| match acc {
                Some((_, best)) if best >= d2 => acc,
                _ => Some((i, d2)),
            });

        if let Some((i, _)) = farthest {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
        }
    }

    let mut sums = vec![[0.0; NUM_FEATURES]; k];
    for (row, &l) in rows.iter().zip(labels.iter()) {
        for col in 0..NUM_FEATURES {
            sums[l][col] += row[col];
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(centroids)
        .map(|((mut sum, count), old)| {
            if count == 0 {
                return *old;
            }

            sum.iter_mut().for_each(|v| *v /= count as f64);
            sum
        })
        .collect()
}

/// Renumber clusters in order of first appearance.
fn canonical_order(labels: Vec<usize>, centroids: Vec<Feature>) -> (Vec<usize>, Vec<Feature>) {
    let mut new_id = vec![usize::MAX; centroids.len()];
    let mut order = Vec::with_capacity(centroids.len());

    for &l in &labels {
        if new_id[l] == usize::MAX {
            new_id[l] = order.len();
            order.push(l);
        }
    }

    // Clusters without members keep their relative order at the end.
    for (old, id) in new_id.iter_mut().enumerate() {
        if *id == usize::MAX {
            *id = order.len();
            order.push(old);
        }
    }

    let labels = labels.into_iter().map(|l| new_id[l]).collect();
    let centroids = order.into_iter().map(|old| centroids[old]).collect();

    (labels, centroids)
}

fn mean_variance(rows: &[Feature]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }

    let n = rows.len() as f64;
    let mut total = 0.0;
    for col in 0..NUM_FEATURES {
        let mean = rows.iter().map(|r| r[col]).sum::<f64>() / n;
        total += rows.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
    }

    total / NUM_FEATURES as f64
}
