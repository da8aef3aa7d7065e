/*!
 * The data associated with a single fire detection.
 *
 * A detection arrives from ingestion as a [RawRecord] where every field may be missing. After
 * preprocessing it becomes a [FireRecord] with a guaranteed position, and each later stage fills
 * in the derived field it is responsible for.
 */

use crate::{color::Rgba, risk::RiskLabel};

/// Weight of brightness in the intensity score.
pub const INTENSITY_BRIGHTNESS_WEIGHT: f64 = 0.6;
/// Weight of the fire radiative power in the intensity score.
pub const INTENSITY_FRP_WEIGHT: f64 = 0.4;

/**
 * A detection as delivered by ingestion, nothing is guaranteed to be present.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawRecord {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Brightness temperature in Kelvin.
    pub brightness: Option<f64>,
    /// Fire radiative power in megawatts.
    pub fire_radiative_power: Option<f64>,
}

impl RawRecord {
    /// Create a record that has all fields.
    pub fn new(latitude: f64, longitude: f64, brightness: f64, fire_radiative_power: f64) -> Self {
        RawRecord {
            latitude: Some(latitude),
            longitude: Some(longitude),
            brightness: Some(brightness),
            fire_radiative_power: Some(fire_radiative_power),
        }
    }

    /// Create a record with only a position.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        RawRecord {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..RawRecord::default()
        }
    }
}

/**
 * A detection with a known position.
 *
 * The derived fields are `None` until the stage that owns them has run.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireRecord {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Brightness temperature in Kelvin.
    pub brightness: Option<f64>,
    /// Fire radiative power in megawatts.
    pub fire_radiative_power: Option<f64>,
    /// Weighted composite of brightness and power, set by preprocessing.
    pub intensity_score: Option<f64>,
    /// Zero based cluster index, set by clustering.
    pub cluster_id: Option<usize>,
    /// Risk band, set by risk classification.
    pub risk: Option<RiskLabel>,
    /// Display color of the cluster, set by color assignment.
    pub color: Option<Rgba>,
}

impl FireRecord {
    /// Promote a raw record, returns `None` if either coordinate is missing or not finite.
    pub fn from_raw(raw: RawRecord) -> Option<Self> {
        let latitude = raw.latitude.filter(|v| v.is_finite())?;
        let longitude = raw.longitude.filter(|v| v.is_finite())?;

        Some(FireRecord {
            latitude,
            longitude,
            brightness: raw.brightness.filter(|v| !v.is_nan()),
            fire_radiative_power: raw.fire_radiative_power.filter(|v| !v.is_nan()),
            intensity_score: None,
            cluster_id: None,
            risk: None,
            color: None,
        })
    }

    /// The intensity score as stored, or derived from brightness and power if it wasn't.
    pub fn intensity_or_derived(&self) -> Option<f64> {
        self.intensity_score
            .or_else(|| Some(intensity_score(self.brightness?, self.fire_radiative_power?)))
    }
}

/// Calculate the intensity score, rounded to hundredths.
pub fn intensity_score(brightness: f64, fire_radiative_power: f64) -> f64 {
    round_hundredths(
        brightness * INTENSITY_BRIGHTNESS_WEIGHT + fire_radiative_power * INTENSITY_FRP_WEIGHT,
    )
}

/// Round to 2 decimal places, ties go to the even hundredth.
pub fn round_hundredths(val: f64) -> f64 {
    (val * 100.0).round_ties_even() / 100.0
}

/**
 * An ordered collection of fire records.
 *
 * Once built by the preprocessor the order never changes. Stages may update records in place
 * but there is no way to insert, remove, or reorder them.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet(Vec<FireRecord>);

impl RecordSet {
    /// Wrap records that are already in canonical order.
    pub(crate) fn from_sorted(records: Vec<FireRecord>) -> Self {
        RecordSet(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[FireRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FireRecord> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FireRecord> {
        self.0.iter_mut()
    }

    /// The (latitude, longitude) pair of every record, in order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.0.iter().map(|r| [r.latitude, r.longitude]).collect()
    }

    /// Consume the set and get the records back.
    pub fn into_records(self) -> Vec<FireRecord> {
        self.0
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a FireRecord;
    type IntoIter = std::slice::Iter<'a, FireRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_intensity_score() {
        assert_eq!(intensity_score(300.0, 10.0), 184.0);
        assert_eq!(intensity_score(450.0, 15.0), 276.0);
        assert_eq!(intensity_score(150.0, 12.5), 95.0);
        assert_eq!(intensity_score(312.34, 7.77), 190.51);
    }

    #[test]
    fn test_round_hundredths() {
        assert_eq!(round_hundredths(1.234), 1.23);
        assert_eq!(round_hundredths(1.236), 1.24);
        assert_eq!(round_hundredths(-2.5), -2.5);
        assert_eq!(round_hundredths(0.0), 0.0);
    }

    #[test]
    fn test_from_raw_requires_position() {
        assert!(FireRecord::from_raw(RawRecord::at(34.5, -117.5)).is_some());

        let no_lat = RawRecord {
            latitude: None,
            ..RawRecord::at(34.5, -117.5)
        };
        assert!(FireRecord::from_raw(no_lat).is_none());

        let nan_lon = RawRecord::at(34.5, f64::NAN);
        assert!(FireRecord::from_raw(nan_lon).is_none());
    }

    #[test]
    fn test_intensity_or_derived() {
        let mut rec = FireRecord::from_raw(RawRecord::new(300.0, -120.0, 300.0, 10.0)).unwrap();
        assert_eq!(rec.intensity_or_derived(), Some(184.0));

        rec.intensity_score = Some(1.0);
        assert_eq!(rec.intensity_or_derived(), Some(1.0));

        let bare = FireRecord::from_raw(RawRecord::at(30.0, -120.0)).unwrap();
        assert_eq!(bare.intensity_or_derived(), None);
    }
}
