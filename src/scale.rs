/*!
 * Standardize coordinates so both axes contribute equally to distances.
 */

use crate::record::RecordSet;

/// Number of features used for clustering, latitude and longitude.
pub const NUM_FEATURES: usize = 2;

/// A single row of the feature matrix.
pub type Feature = [f64; NUM_FEATURES];

/**
 * The values clustered on, one row per record in the same order as the RecordSet.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix(Vec<Feature>);

impl FeatureMatrix {
    /// Wrap raw rows without any scaling.
    pub fn new(rows: Vec<Feature>) -> Self {
        FeatureMatrix(rows)
    }

    /// Build the (latitude, longitude) features of a RecordSet, standardized if requested.
    pub fn from_records(records: &RecordSet, scale_features: bool) -> Self {
        let raw = FeatureMatrix(records.coordinates());

        if scale_features {
            StandardScaler::fit(&raw).transform(&raw)
        } else {
            raw
        }
    }

    pub fn rows(&self) -> &[Feature] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count the rows that are not exact duplicates of an earlier row.
    pub fn distinct_rows(&self) -> usize {
        let mut sorted: Vec<Feature> = self.0.clone();
        sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
        sorted.dedup();
        sorted.len()
    }
}

/**
 * Per column mean and population standard deviation.
 *
 * A column with zero variance is only centered, which leaves it at zero.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    means: Feature,
    std_devs: Feature,
}

impl StandardScaler {
    /// Calculate the column statistics.
    pub fn fit(features: &FeatureMatrix) -> Self {
        let mut means = [0.0; NUM_FEATURES];
        let mut std_devs = [0.0; NUM_FEATURES];

        let n = features.len();
        if n == 0 {
            return StandardScaler { means, std_devs };
        }

        for row in features.rows() {
            for (mean, val) in means.iter_mut().zip(row) {
                *mean += val;
            }
        }
        means.iter_mut().for_each(|m| *m /= n as f64);

        for row in features.rows() {
            for col in 0..NUM_FEATURES {
                let diff = row[col] - means[col];
                std_devs[col] += diff * diff;
            }
        }
        std_devs.iter_mut().for_each(|s| *s = (*s / n as f64).sqrt());

        StandardScaler { means, std_devs }
    }

    pub fn means(&self) -> Feature {
        self.means
    }

    pub fn std_devs(&self) -> Feature {
        self.std_devs
    }

    /// Apply the scaling to every row.
    pub fn transform(&self, features: &FeatureMatrix) -> FeatureMatrix {
        let rows = features
            .rows()
            .iter()
            .map(|row| {
                let mut scaled = [0.0; NUM_FEATURES];
                for col in 0..NUM_FEATURES {
                    let centered = row[col] - self.means[col];
                    scaled[col] = if self.std_devs[col] > 0.0 {
                        centered / self.std_devs[col]
                    } else {
                        0.0
                    };
                }
                scaled
            })
            .collect();

        FeatureMatrix(rows)
    }
}
