/*!
 * Descriptive statistics for each cluster.
 */

use crate::{
    geo::Coord,
    record::{round_hundredths, RecordSet},
    risk::{classify_brightness, RiskLabel},
};
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;

/**
 * The aggregate properties of the records assigned to one cluster.
 *
 * All the averages are rounded to 2 decimal places. An average is `None` if no member of the
 * cluster has the underlying value.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// The cluster this row describes.
    pub cluster_id: usize,
    /// The number of records in the cluster.
    pub count: usize,
    /// Average brightness temperature in Kelvin.
    pub avg_brightness: Option<f64>,
    /// Average fire radiative power in megawatts.
    pub avg_frp: Option<f64>,
    /// Average intensity score.
    pub avg_intensity_score: Option<f64>,
    /// Average of the members' risk scores (1 low to 3 high), for members with a label.
    pub avg_risk_score: Option<f64>,
    /// The risk band of the average brightness.
    pub risk: Option<RiskLabel>,
    /// Mean position of the members.
    pub centroid: Coord,
    /// Distance from the centroid to the farthest member in kilometers.
    pub radius_km: f64,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    lat: f64,
    lon: f64,
    brightness: Mean,
    frp: Mean,
    intensity: Mean,
    risk_score: Mean,
    members: Vec<Coord>,
}

#[derive(Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, val: Option<f64>) {
        if let Some(val) = val {
            self.sum += val;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

/**
 * Summarize every cluster present in the RecordSet.
 *
 * There is exactly one row per distinct cluster id, in ascending order of id. Records without a
 * cluster id are not counted. The intensity score is derived from brightness and power for any
 * record that doesn't have one yet.
 */
pub fn summarize(records: &RecordSet) -> Vec<ClusterSummary> {
    let mut groups: HashMap<usize, Accumulator> = HashMap::default();

    for rec in records {
        let id = match rec.cluster_id {
            Some(id) => id,
            None => continue,
        };

        let acc = groups.entry(id).or_default();
        acc.count += 1;
        acc.lat += rec.latitude;
        acc.lon += rec.longitude;
        acc.brightness.add(rec.brightness);
        acc.frp.add(rec.fire_radiative_power);
        acc.intensity.add(rec.intensity_or_derived());
        acc.risk_score.add(rec.risk.map(|r| f64::from(r.score())));
        acc.members.push(Coord {
            lat: rec.latitude,
            lon: rec.longitude,
        });
    }

    let mut summaries: Vec<ClusterSummary> = groups
        .into_iter()
        .map(|(cluster_id, acc)| {
            let centroid = Coord {
                lat: acc.lat / acc.count as f64,
                lon: acc.lon / acc.count as f64,
            };

            let radius_km = acc
                .members
                .iter()
                .map(|m| centroid.great_circle_distance(m))
                .fold(0.0, f64::max);

            let avg_brightness = acc.brightness.value().map(round_hundredths);

            ClusterSummary {
                cluster_id,
                count: acc.count,
                avg_brightness,
                avg_frp: acc.frp.value().map(round_hundredths),
                avg_intensity_score: acc.intensity.value().map(round_hundredths),
                avg_risk_score: acc.risk_score.value().map(round_hundredths),
                risk: acc.brightness.value().map(classify_brightness),
                centroid,
                radius_km,
            }
        })
        .collect();

    summaries.sort_by_key(|s| s.cluster_id);

    log::debug!("summarized {} clusters", summaries.len());

    summaries
}
