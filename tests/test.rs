use firecluster::{
    apply_risk_labels, classify_brightness, preprocess, read_records, ColorPalette, Crs,
    FireClusterResult, FirePipeline, GeoRecordSet, PipelineConfig, PipelineError, RawRecord,
    RecordSource, RiskLabel, RiskPolicy, CLUSTER_ALPHA,
};

/*-------------------------------------------------------------------------------------------------
 *                                         Test Data
 *-----------------------------------------------------------------------------------------------*/
fn four_fires() -> Vec<RawRecord> {
    vec![
        RawRecord::new(34.0, -120.0, 300.0, 10.0),
        RawRecord::new(35.0, -121.0, 220.0, 11.0),
        RawRecord::new(36.0, -122.0, 150.0, 12.5),
        RawRecord::new(37.0, -123.0, 450.0, 15.0),
    ]
}

fn two_groups() -> Vec<RawRecord> {
    let mut raw = vec![];
    for i in 0..10 {
        let d = i as f64 * 0.01;
        raw.push(RawRecord::new(45.0 + d, -120.0 - d, 420.0 + d, 30.0));
        raw.push(RawRecord::new(33.0 - d, -112.0 + d, 250.0 - d, 5.0));
    }
    raw
}

fn unscaled(k: usize) -> PipelineConfig {
    PipelineConfig {
        cluster_count: k,
        scale_features: false,
        ..PipelineConfig::default()
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                       End to End
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_four_fires_two_clusters() {
    let output = FirePipeline::from_records(four_fires(), unscaled(2))
        .run()
        .unwrap();

    let ids: Vec<usize> = output
        .features
        .features()
        .iter()
        .map(|f| f.record.cluster_id.unwrap())
        .collect();

    // Sorted by latitude, so each cluster is a contiguous pair.
    assert_eq!(ids, vec![0, 0, 1, 1]);
    assert_eq!(output.summary.len(), 2);
    assert_eq!(output.palette.len(), 2);
    assert!(output.validity_score.unwrap().is_finite());
}

#[test]
fn test_well_separated_groups() {
    let output = FirePipeline::from_records(two_groups(), PipelineConfig {
        cluster_count: 2,
        ..PipelineConfig::default()
    })
    .run()
    .unwrap();

    let score = output.validity_score.unwrap();
    assert!(score > 0.9 && score <= 1.0);

    assert_eq!(output.summary.len(), 2);
    assert_eq!(output.summary.iter().map(|s| s.count).sum::<usize>(), 20);

    // The southern group comes first in record order, so it is cluster 0.
    let south = &output.summary[0];
    let north = &output.summary[1];
    assert!(south.centroid.lat < north.centroid.lat);
    assert_eq!(south.risk, Some(RiskLabel::Medium));
    assert_eq!(north.risk, Some(RiskLabel::High));
    assert!(north.radius_km > 0.0 && north.radius_km < 20.0);
}

#[test]
fn test_determinism() {
    let first = FirePipeline::from_records(two_groups(), unscaled(3))
        .run()
        .unwrap();
    let second = FirePipeline::from_records(two_groups(), unscaled(3))
        .run()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_summary_counts_cover_all_records() {
    let output = FirePipeline::from_records(two_groups(), unscaled(4))
        .run()
        .unwrap();

    let total: usize = output.summary.iter().map(|s| s.count).sum();
    assert_eq!(total, output.features.len());

    for (i, row) in output.summary.iter().enumerate() {
        assert_eq!(row.cluster_id, i);
        assert!(row.count > 0);
    }
}

#[test]
fn test_too_many_clusters() {
    let result = FirePipeline::from_records(four_fires(), unscaled(5)).run();
    assert!(matches!(result, Err(PipelineError::Clustering(_))));
}

/*-------------------------------------------------------------------------------------------------
 *                                    Ingestion Failures
 *-----------------------------------------------------------------------------------------------*/
struct BrokenSource;

impl RecordSource for BrokenSource {
    fn load(&mut self) -> FireClusterResult<Vec<RawRecord>> {
        Err("connection refused".into())
    }
}

#[test]
fn test_ingestion_failure() {
    let result = FirePipeline::load(&mut BrokenSource, PipelineConfig::default());
    match result {
        Err(err @ PipelineError::Ingestion(_)) => {
            assert!(err.to_string().contains("connection refused"))
        }
        _ => panic!("expected an ingestion error"),
    }
}

#[test]
fn test_csv_to_clusters() {
    let data = "\
latitude,longitude,brightness,frp,confidence
34.0,-120.0,300.0,10.0,n
,-120.5,310.0,10.0,n
37.0,-123.0,450.0,15.0,h
36.0,-122.0,150.0,12.5,l
35.0,-121.0,220.0,11.0,n
";
    let mut raw = read_records(data.as_bytes()).unwrap();
    assert_eq!(raw.len(), 5);

    let mut pipeline = FirePipeline::load(&mut raw, unscaled(2)).unwrap();
    assert_eq!(pipeline.records().len(), 4);

    let output = pipeline.run().unwrap();
    assert_eq!(output.features.len(), 4);
}

/*-------------------------------------------------------------------------------------------------
 *                                      Preprocessing
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_preprocess_properties() {
    let mut raw = four_fires();
    raw.reverse();
    raw.push(RawRecord {
        latitude: Some(f64::NAN),
        ..RawRecord::at(0.0, 0.0)
    });
    raw.push(RawRecord {
        longitude: None,
        ..RawRecord::at(10.0, 10.0)
    });
    raw.push(RawRecord::at(35.0, -125.0));

    let records = preprocess(raw);
    assert_eq!(records.len(), 5);

    let coords = records.coordinates();
    for pair in coords.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    // Same latitude ordered by longitude.
    assert_eq!(coords[1], [35.0, -125.0]);
    assert_eq!(coords[2], [35.0, -121.0]);

    for rec in records.iter() {
        match (rec.brightness, rec.fire_radiative_power) {
            (Some(b), Some(p)) => {
                let score = rec.intensity_score.unwrap();
                let expected = ((0.6 * b + 0.4 * p) * 100.0).round() / 100.0;
                assert!((score - expected).abs() < 1.0e-9);
            }
            _ => assert!(rec.intensity_score.is_none()),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                          Risk
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_risk_boundaries() {
    assert_eq!(classify_brightness(400.0), RiskLabel::High);
    assert_eq!(classify_brightness(399.99), RiskLabel::Medium);
    assert_eq!(classify_brightness(200.0), RiskLabel::Medium);
    assert_eq!(classify_brightness(199.99), RiskLabel::Low);
}

#[test]
fn test_risk_policies_differ() {
    let records = preprocess(four_fires());

    let mut per_record = records.clone();
    apply_risk_labels(&mut per_record, RiskPolicy::PerRecord);
    let labels: Vec<_> = per_record.iter().map(|r| r.risk).collect();
    assert_eq!(
        labels,
        vec![
            Some(RiskLabel::Medium),
            Some(RiskLabel::Medium),
            Some(RiskLabel::Low),
            Some(RiskLabel::High)
        ]
    );

    let output = FirePipeline::from_records(four_fires(), PipelineConfig {
        risk_policy: RiskPolicy::PerCluster,
        ..unscaled(2)
    })
    .run()
    .unwrap();

    // Means are 260 and 300, both medium.
    for feature in output.features.features() {
        assert_eq!(feature.record.risk, Some(RiskLabel::Medium));
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                         Colors
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_palette_empty() {
    let empty: [&str; 0] = [];
    assert!(ColorPalette::generate(&empty).is_empty());
}

#[test]
fn test_palette_three_clusters() {
    let palette = ColorPalette::generate(&["0", "1", "2"]);
    assert_eq!(palette.len(), 3);

    let colors: Vec<_> = ["0", "1", "2"]
        .iter()
        .map(|id| palette.get(id).unwrap())
        .collect();

    for color in &colors {
        assert_eq!(color.a, CLUSTER_ALPHA);
    }
    assert_ne!(colors[0], colors[1]);
    assert_ne!(colors[1], colors[2]);
    assert_ne!(colors[0], colors[2]);

    assert_eq!(palette, ColorPalette::generate(&["2", "0", "1"]));
}

/*-------------------------------------------------------------------------------------------------
 *                                       Geo Export
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_geo_round_trip() {
    let records = preprocess(four_fires());
    let geo = GeoRecordSet::export(&records, Crs::Epsg4326);

    assert_eq!(geo.len(), records.len());
    for (feature, rec) in geo.features().iter().zip(records.iter()) {
        assert_eq!(feature.latitude(), rec.latitude);
        assert_eq!(feature.longitude(), rec.longitude);
        assert_eq!(&feature.record, rec);
    }

    let json = geo.to_geojson(None);
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"].as_array().unwrap().len(), 4);
    assert_eq!(json["features"][0]["geometry"]["coordinates"][0], -120.0);
    assert_eq!(json["features"][0]["geometry"]["coordinates"][1], 34.0);
}
