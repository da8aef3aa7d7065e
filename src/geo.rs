/*!
 * Geographic types and the geo-referenced hand off of the final records.
 *
 * Positions are treated as planar for clustering, but the great circle distance is used when
 * reporting physical sizes of clusters.
 */

use crate::{
    color::ColorPalette,
    record::{FireRecord, RecordSet},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Mean radius of the Earth in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0090;

/// A latitude, longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /**
     * The great circle distance to another coordinate, in kilometers.
     *
     * Uses the haversine formula on a spherical Earth.
     */
    pub fn great_circle_distance(&self, other: &Coord) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let half_dlat = (lat2 - lat1) / 2.0;
        let half_dlon = (other.lon - self.lon).to_radians() / 2.0;

        let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);

        2.0 * h.sqrt().min(1.0).asin() * EARTH_RADIUS_KM
    }
}

/// Coordinate reference systems the exporter can tag records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// WGS 84 geographic latitude and longitude.
    Epsg4326,
}

impl Crs {
    pub fn name(&self) -> &'static str {
        match self {
            Crs::Epsg4326 => "EPSG:4326",
        }
    }

    /// The OGC URN, which is how GeoJSON names a CRS.
    pub fn urn(&self) -> &'static str {
        match self {
            Crs::Epsg4326 => "urn:ogc:def:crs:EPSG::4326",
        }
    }
}

/// A point geometry, stored in x (longitude), y (latitude) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn from_coord(coord: Coord) -> Self {
        GeoPoint {
            x: coord.lon,
            y: coord.lat,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.y
    }

    pub fn longitude(&self) -> f64 {
        self.x
    }
}

/**
 * A record with its point geometry attached.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRecord {
    pub geometry: GeoPoint,
    pub record: FireRecord,
}

impl GeoRecord {
    /// Latitude extracted from the geometry.
    pub fn latitude(&self) -> f64 {
        self.geometry.latitude()
    }

    /// Longitude extracted from the geometry.
    pub fn longitude(&self) -> f64 {
        self.geometry.longitude()
    }

    fn properties(&self) -> Map<String, Value> {
        let rec = &self.record;
        let mut props = Map::new();

        props.insert("latitude".into(), json!(self.latitude()));
        props.insert("longitude".into(), json!(self.longitude()));
        props.insert("brightness".into(), json!(rec.brightness));
        props.insert("frp".into(), json!(rec.fire_radiative_power));
        props.insert("intensity_score".into(), json!(rec.intensity_score));
        props.insert("cluster_mapping".into(), json!(rec.cluster_id));
        props.insert("risk_label".into(), json!(rec.risk.map(|r| r.description())));
        props.insert("color".into(), json!(rec.color.map(|c| c.channels())));

        props
    }
}

/**
 * The final, geo-referenced records in canonical order, ready for serialization or display.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecordSet {
    crs: Crs,
    features: Vec<GeoRecord>,
}

impl GeoRecordSet {
    /// Attach a point geometry to every record.
    pub fn export(records: &RecordSet, crs: Crs) -> Self {
        let features = records
            .iter()
            .map(|rec| GeoRecord {
                geometry: GeoPoint::from_coord(Coord {
                    lat: rec.latitude,
                    lon: rec.longitude,
                }),
                record: *rec,
            })
            .collect();

        GeoRecordSet { crs, features }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn features(&self) -> &[GeoRecord] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Rebuild the scalar coordinates from the geometries.
    pub fn coordinates(&self) -> Vec<Coord> {
        self.features
            .iter()
            .map(|f| Coord {
                lat: f.latitude(),
                lon: f.longitude(),
            })
            .collect()
    }

    /**
     * Build a GeoJSON FeatureCollection.
     *
     * If a palette is supplied it is included as a `cluster_colors` member so a renderer can
     * build a legend without scanning the features.
     */
    pub fn to_geojson(&self, palette: Option<&ColorPalette>) -> Value {
        let features: Vec<Value> = self
            .features
            .iter()
            .map(|f| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [f.geometry.x, f.geometry.y]
                    },
                    "properties": f.properties()
                })
            })
            .collect();

        let mut collection = json!({
            "type": "FeatureCollection",
            "crs": {
                "type": "name",
                "properties": { "name": self.crs.urn() }
            },
            "features": features
        });

        if let (Some(palette), Value::Object(members)) = (palette, &mut collection) {
            let colors: Map<String, Value> = palette
                .iter()
                .map(|(id, color)| (id.to_owned(), json!(color.channels())))
                .collect();
            members.insert("cluster_colors".into(), Value::Object(colors));
        }

        collection
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{preprocess::preprocess, record::RawRecord};

    #[test]
    fn test_great_circle_distance() {
        let here = Coord {
            lat: 45.0,
            lon: -120.0,
        };
        assert_eq!(here.great_circle_distance(&here), 0.0);

        // One degree of latitude is about 111.2 km.
        let north = Coord {
            lat: 46.0,
            lon: -120.0,
        };
        let dist = here.great_circle_distance(&north);
        assert!((dist - 111.195).abs() < 0.01);
        assert!((north.great_circle_distance(&here) - dist).abs() < 1.0e-9);
    }

    #[test]
    fn test_round_trip_coordinates() {
        let raw = vec![
            RawRecord::at(34.123456789, -120.987654321),
            RawRecord::at(-12.5, 179.999999),
            RawRecord::at(0.1 + 0.2, -0.0),
        ];
        let records = preprocess(raw);
        let exported = GeoRecordSet::export(&records, Crs::Epsg4326);

        assert_eq!(exported.len(), records.len());
        for (coord, rec) in exported.coordinates().iter().zip(records.iter()) {
            assert_eq!(coord.lat.to_bits(), rec.latitude.to_bits());
            assert_eq!(coord.lon.to_bits(), rec.longitude.to_bits());
        }
    }

    #[test]
    fn test_geojson_layout() {
        let records = preprocess(vec![RawRecord::new(34.0, -120.0, 300.0, 10.0)]);
        let exported = GeoRecordSet::export(&records, Crs::Epsg4326);
        let gj = exported.to_geojson(None);

        assert_eq!(gj["type"], "FeatureCollection");
        assert_eq!(gj["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::4326");
        assert_eq!(gj["features"][0]["geometry"]["coordinates"], json!([-120.0, 34.0]));
        assert_eq!(gj["features"][0]["properties"]["intensity_score"], json!(184.0));
        assert_eq!(gj["features"][0]["properties"]["cluster_mapping"], Value::Null);
        assert!(gj.get("cluster_colors").is_none());

        let palette = ColorPalette::generate(&["0"]);
        let gj = exported.to_geojson(Some(&palette));
        assert_eq!(gj["cluster_colors"]["0"], json!([31, 119, 180, 160]));
    }
}
