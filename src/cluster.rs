/*!
 * Types and functions for partitioning fire detections into clusters.
 *
 * Clusters are found with centroid based (k-means) clustering on the feature matrix built from
 * the record positions. The quality of a partition is scored with the silhouette coefficient.
 */

pub use kmeans::{Clustering, KMeans};
pub use silhouette::silhouette_score;

mod kmeans;
mod silhouette;

use crate::{record::RecordSet, scale::Feature};

/// Default number of clusters.
pub const DEFAULT_CLUSTER_COUNT: usize = 10;
/// Default seed for centroid initialization.
pub const DEFAULT_RANDOM_SEED: u64 = 9;
/// Default limit on Lloyd iterations for a single run.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
/// Default number of independently seeded runs, the lowest inertia run is kept.
pub const DEFAULT_RESTARTS: usize = 10;
/// Convergence threshold on centroid movement, relative to the mean feature variance.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-4;

static_assertions::const_assert!(DEFAULT_CLUSTER_COUNT >= 1);
static_assertions::const_assert!(DEFAULT_RESTARTS >= 1);

impl Clustering {
    /**
     * Write the cluster assignments into the records.
     *
     * The clustering must have been computed from features built from these records, so the
     * rows line up one to one.
     */
    pub fn apply_to(&self, records: &mut RecordSet) {
        debug_assert_eq!(records.len(), self.labels().len());

        for (rec, &label) in records.iter_mut().zip(self.labels()) {
            rec.cluster_id = Some(label);
        }
    }
}

fn squared_distance(left: &Feature, right: &Feature) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| (l - r) * (l - r))
        .sum()
}

fn distance(left: &Feature, right: &Feature) -> f64 {
    squared_distance(left, right).sqrt()
}
