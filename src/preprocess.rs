/*!
 * Clean up raw detections before analysis.
 */

use crate::record::{intensity_score, FireRecord, RawRecord, RecordSet};
use std::cmp::Ordering;

/**
 * Drop records without a position, sort them geographically, and derive the intensity score.
 *
 * Records missing a latitude or longitude are dropped, not imputed. The output is sorted by
 * latitude and then longitude, both ascending. Records that carry brightness and fire radiative
 * power get an intensity score, the rest are left without one.
 */
pub fn preprocess(raw: Vec<RawRecord>) -> RecordSet {
    let total = raw.len();

    let mut records: Vec<FireRecord> = raw.into_iter().filter_map(FireRecord::from_raw).collect();

    let dropped = total - records.len();
    if dropped > 0 {
        log::debug!("dropped {} of {} records without a position", dropped, total);
    }

    // Coordinates are finite here, so the comparison never fails.
    records.sort_by(|left, right| {
        left.latitude
            .partial_cmp(&right.latitude)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                left.longitude
                    .partial_cmp(&right.longitude)
                    .unwrap_or(Ordering::Equal)
            })
    });

    for rec in records.iter_mut() {
        if let (Some(brightness), Some(frp)) = (rec.brightness, rec.fire_radiative_power) {
            rec.intensity_score = Some(intensity_score(brightness, frp));
        }
    }

    RecordSet::from_sorted(records)
}
