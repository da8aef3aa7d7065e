/*!
 * Risk bands derived from fire brightness.
 *
 * There are two ways to label records. Each record can be labeled from its own brightness, or
 * every record in a cluster can share the label derived from the cluster's mean brightness. The
 * second characterizes the cluster as a whole, so an outlier may get a different label than it
 * would on its own. Callers choose with [RiskPolicy].
 */

use crate::record::RecordSet;
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use std::fmt::{self, Display};
use strum::{EnumString, IntoStaticStr};

/// Brightness (K) at or above which a fire is high risk.
pub const HIGH_RISK_BRIGHTNESS: f64 = 400.0;
/// Brightness (K) at or above which a fire is at least medium risk.
pub const MEDIUM_RISK_BRIGHTNESS: f64 = 200.0;

/** An ordinal classification of fire severity. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoStaticStr, Serialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    /// Short name of the band.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Name used in tables and map legends.
    pub fn description(&self) -> &'static str {
        use RiskLabel::*;

        match self {
            Low => "Low Risk",
            Medium => "Medium Risk",
            High => "High Risk",
        }
    }

    /// Numeric value for charting and averaging, 1 (low) to 3 (high).
    pub fn score(&self) -> u8 {
        use RiskLabel::*;

        match self {
            Low => 1,
            Medium => 2,
            High => 3,
        }
    }
}

impl Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.name())
    }
}

/** Which labeling is applied to a RecordSet. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum RiskPolicy {
    /// Each record is labeled by its own brightness.
    PerRecord,
    /// Each record is labeled by the mean brightness of its cluster.
    PerCluster,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy::PerCluster
    }
}

/**
 * Classify a brightness value.
 *
 * The lower bound of each band is inclusive, so 400.0 is High and 200.0 is Medium.
 */
pub fn classify_brightness(brightness: f64) -> RiskLabel {
    if brightness >= HIGH_RISK_BRIGHTNESS {
        RiskLabel::High
    } else if brightness >= MEDIUM_RISK_BRIGHTNESS {
        RiskLabel::Medium
    } else {
        RiskLabel::Low
    }
}

/// Classify each cluster by its mean brightness.
pub fn classify_cluster_means(mean_brightness: &HashMap<usize, f64>) -> HashMap<usize, RiskLabel> {
    mean_brightness
        .iter()
        .map(|(&id, &mean)| (id, classify_brightness(mean)))
        .collect()
}

/// Mean brightness of each cluster, over the members that have a brightness.
pub fn cluster_mean_brightness(records: &RecordSet) -> HashMap<usize, f64> {
    let mut sums: HashMap<usize, (f64, usize)> = HashMap::default();

    for rec in records {
        if let (Some(id), Some(brightness)) = (rec.cluster_id, rec.brightness) {
            let entry = sums.entry(id).or_insert((0.0, 0));
            entry.0 += brightness;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(id, (sum, count))| (id, sum / count as f64))
        .collect()
}

/**
 * Label every record according to the policy.
 *
 * Records that can't be classified (no brightness for the per record policy, no cluster or a
 * cluster without any brightness for the per cluster policy) are left unlabeled.
 */
pub fn apply_risk_labels(records: &mut RecordSet, policy: RiskPolicy) {
    match policy {
        RiskPolicy::PerRecord => {
            for rec in records.iter_mut() {
                rec.risk = rec.brightness.map(classify_brightness);
            }
        }
        RiskPolicy::PerCluster => {
            let labels = classify_cluster_means(&cluster_mean_brightness(records));
            for rec in records.iter_mut() {
                rec.risk = rec.cluster_id.and_then(|id| labels.get(&id).copied());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{preprocess::preprocess, record::RawRecord};
    use std::str::FromStr;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify_brightness(400.0), RiskLabel::High);
        assert_eq!(classify_brightness(399.99), RiskLabel::Medium);
        assert_eq!(classify_brightness(200.0), RiskLabel::Medium);
        assert_eq!(classify_brightness(199.99), RiskLabel::Low);

        assert_eq!(classify_brightness(450.0), RiskLabel::High);
        assert_eq!(classify_brightness(250.0), RiskLabel::Medium);
        assert_eq!(classify_brightness(100.0), RiskLabel::Low);
    }

    #[test]
    fn test_label_names() {
        assert_eq!(RiskLabel::High.name(), "High");
        assert_eq!(RiskLabel::Medium.description(), "Medium Risk");
        assert_eq!(RiskLabel::Low.to_string(), "Low");
        assert!(RiskLabel::Low < RiskLabel::High);
        assert_eq!(RiskLabel::High.score(), 3);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(RiskPolicy::from_str("per-record").unwrap(), RiskPolicy::PerRecord);
        assert_eq!(RiskPolicy::from_str("per-cluster").unwrap(), RiskPolicy::PerCluster);
        assert!(RiskPolicy::from_str("whatever").is_err());
    }

    #[test]
    fn test_classify_cluster_means() {
        let mut means = HashMap::default();
        means.insert(0, 450.0);
        means.insert(1, 200.0);
        means.insert(7, 12.0);

        let labels = classify_cluster_means(&means);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[&0], RiskLabel::High);
        assert_eq!(labels[&1], RiskLabel::Medium);
        assert_eq!(labels[&7], RiskLabel::Low);
    }

    fn clustered() -> RecordSet {
        let mut records = preprocess(vec![
            RawRecord::new(34.0, -119.0, 300.0, 10.0),
            RawRecord::new(34.1, -119.1, 450.0, 15.0),
            RawRecord::new(36.0, -121.0, 150.0, 12.5),
            RawRecord::at(36.1, -121.1),
        ]);

        for (rec, id) in records.iter_mut().zip([0, 0, 1, 1]) {
            rec.cluster_id = Some(id);
        }
        records
    }

    #[test]
    fn test_per_record_policy() {
        let mut records = clustered();
        apply_risk_labels(&mut records, RiskPolicy::PerRecord);

        let labels: Vec<_> = records.iter().map(|r| r.risk).collect();
        assert_eq!(
            labels,
            vec![
                Some(RiskLabel::Medium),
                Some(RiskLabel::High),
                Some(RiskLabel::Low),
                None
            ]
        );
    }

    #[test]
    fn test_per_cluster_policy() {
        let mut records = clustered();

        let means = cluster_mean_brightness(&records);
        assert_eq!(means[&0], 375.0);
        assert_eq!(means[&1], 150.0);

        apply_risk_labels(&mut records, RiskPolicy::PerCluster);

        let labels: Vec<_> = records.iter().map(|r| r.risk).collect();
        assert_eq!(
            labels,
            vec![
                Some(RiskLabel::Medium),
                Some(RiskLabel::Medium),
                Some(RiskLabel::Low),
                Some(RiskLabel::Low)
            ]
        );
    }
}
