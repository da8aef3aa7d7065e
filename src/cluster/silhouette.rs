use super::distance;
use crate::{error::ClusteringError, scale::FeatureMatrix};

/**
 * Mean silhouette coefficient of a partition.
 *
 * For each row, `a` is the mean distance to the other members of its cluster and `b` is the
 * smallest mean distance to the members of any other cluster. The row scores `(b - a) / max(a, b)`
 * and the result is the average over all rows, in the range [-1, 1]. A row that is alone in its
 * cluster scores 0.
 *
 * #Errors
 * The score is undefined with fewer than 2 clusters or with as many clusters as rows.
 */
pub fn silhouette_score(
    features: &FeatureMatrix,
    labels: &[usize],
) -> Result<f64, ClusteringError> {
    debug_assert_eq!(features.len(), labels.len());

    let points = labels.len();
    let num_slots = labels.iter().max().map(|&m| m + 1).unwrap_or(0);

    let mut counts = vec![0usize; num_slots];
    labels.iter().for_each(|&l| counts[l] += 1);
    let clusters = counts.iter().filter(|&&c| c > 0).count();

    if clusters < 2 || clusters >= points {
        return Err(ClusteringError::DegenerateValidityScore { clusters, points });
    }

    let rows = features.rows();
    let mut dist_sums = vec![0.0; num_slots];
    let mut total = 0.0;

    for (i, row) in rows.iter().enumerate() {
        dist_sums.iter_mut().for_each(|s| *s = 0.0);
        for (other, &other_label) in rows.iter().zip(labels) {
            dist_sums[other_label] += distance(row, other);
        }

        let own = labels[i];
        if counts[own] < 2 {
            continue;
        }

        let a = dist_sums[own] / (counts[own] - 1) as f64;
        let b = dist_sums
            .iter()
            .zip(&counts)
            .enumerate()
            .filter(|&(label, (_, &count))| label != own && count > 0)
            .map(|(_, (&sum, &count))| sum / count as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / points as f64)
}
