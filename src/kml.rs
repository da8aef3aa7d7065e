//! Write clustered fire detections to KML for viewing in a virtual globe.
//!
//! Only the handful of elements needed to draw colored points are supported. The writer streams
//! elements out as they're added, so the caller is responsible for closing what it opens. A
//! [KmlFile] closes the document when it is dropped.

use crate::{
    color::{ColorPalette, Rgba},
    geo::GeoRecordSet,
    summary::ClusterSummary,
    FireClusterResult,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Icon used for every fire point.
const FIRE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png";

pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    /// Create the file and write the document header.
    pub fn new<P: AsRef<Path>>(pth: P) -> FireClusterResult<Self> {
        let f = File::create(pth.as_ref())?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
        let _ = self.0.flush();
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put out the XML declaration and open the document.
    fn start_document(&mut self) -> FireClusterResult<()> {
        writeln!(self.output(), r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(self.output(), r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
        writeln!(self.output(), "<Document>")?;
        Ok(())
    }

    /// Close the document.
    fn finish_document(&mut self) {
        let _ = writeln!(self.output(), "</Document>\n</kml>");
    }

    /// Open a folder, optionally with a name and description.
    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> FireClusterResult<()> {
        writeln!(self.output(), "<Folder>")?;
        self.write_name_and_description(name, description)
    }

    fn finish_folder(&mut self) -> FireClusterResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Define a shared style for points of one color.
    fn write_point_style(
        &mut self,
        style_id: &str,
        color: Rgba,
        scale: f64,
    ) -> FireClusterResult<()> {
        let scale = if scale > 0.0 { scale } else { 1.0 };

        writeln!(self.output(), "<Style id=\"{}\">", style_id)?;
        writeln!(self.output(), "<IconStyle>")?;
        writeln!(self.output(), "<color>{}</color>", color.kml_hex())?;
        writeln!(self.output(), "<colorMode>normal</colorMode>")?;
        writeln!(self.output(), "<scale>{}</scale>", scale)?;
        writeln!(self.output(), "<Icon><href>{}</href></Icon>", FIRE_ICON)?;
        writeln!(self.output(), "</IconStyle>")?;
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Write a complete point placemark.
    fn write_point_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
        lat: f64,
        lon: f64,
    ) -> FireClusterResult<()> {
        writeln!(self.output(), "<Placemark>")?;
        self.write_name_and_description(name, description)?;

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},0</coordinates>\n</Point>",
            lon,
            lat
        )?;
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    fn write_name_and_description(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> FireClusterResult<()> {
        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            writeln!(
                self.output(),
                "<description><![CDATA[{}]]></description>",
                description
            )?;
        }

        Ok(())
    }
}

/**
 * Write every record as a point, in one folder per cluster, styled with the cluster color.
 *
 * Records without a cluster go in a folder of their own with the default style.
 */
pub fn write_clusters<K: KmlWriter>(
    kml: &mut K,
    features: &GeoRecordSet,
    summary: &[ClusterSummary],
    palette: &ColorPalette,
) -> FireClusterResult<()> {
    for (id, color) in palette.iter() {
        kml.write_point_style(&format!("cluster_{}", id), color, 0.8)?;
    }

    for cluster in summary {
        let name = format!("Cluster {}", cluster.cluster_id);
        let description = cluster_description(cluster);
        kml.start_folder(Some(&name), Some(&description))?;

        let style_url = format!("#cluster_{}", cluster.cluster_id);
        for feature in features
            .features()
            .iter()
            .filter(|f| f.record.cluster_id == Some(cluster.cluster_id))
        {
            let rec = &feature.record;
            let risk = rec.risk.map(|r| r.description()).unwrap_or("Unclassified");
            let description = match (rec.brightness, rec.fire_radiative_power) {
                (Some(b), Some(p)) => {
                    format!("{}<br/>brightness: {:.1} K<br/>FRP: {:.1} MW", risk, b, p)
                }
                _ => risk.to_owned(),
            };

            kml.write_point_placemark(
                None,
                Some(&description),
                Some(&style_url),
                feature.latitude(),
                feature.longitude(),
            )?;
        }

        kml.finish_folder()?;
    }

    let unclustered: Vec<_> = features
        .features()
        .iter()
        .filter(|f| f.record.cluster_id.is_none())
        .collect();

    if !unclustered.is_empty() {
        kml.start_folder(Some("Unclustered"), None)?;
        for feature in unclustered {
            kml.write_point_placemark(None, None, None, feature.latitude(), feature.longitude())?;
        }
        kml.finish_folder()?;
    }

    Ok(())
}

fn cluster_description(cluster: &ClusterSummary) -> String {
    let fmt_opt = |v: Option<f64>| match v {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_owned(),
    };

    format!(
        concat!(
            "records: {}<br/>",
            "risk: {}<br/>",
            "avg brightness: {}<br/>",
            "avg FRP: {}<br/>",
            "avg intensity: {}<br/>",
            "radius: {:.1} km"
        ),
        cluster.count,
        cluster.risk.map(|r| r.description()).unwrap_or("n/a"),
        fmt_opt(cluster.avg_brightness),
        fmt_opt(cluster.avg_frp),
        fmt_opt(cluster.avg_intensity_score),
        cluster.radius_km,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::{FirePipeline, PipelineConfig};
    use crate::record::RawRecord;

    struct KmlBuffer(Vec<u8>);

    impl KmlWriter for KmlBuffer {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.0
        }
    }

    #[test]
    fn test_write_clusters() {
        let config = PipelineConfig {
            cluster_count: 2,
            scale_features: false,
            ..PipelineConfig::default()
        };
        let raw = vec![
            RawRecord::new(34.0, -120.0, 300.0, 10.0),
            RawRecord::new(35.0, -121.0, 220.0, 11.0),
            RawRecord::new(36.0, -122.0, 150.0, 12.5),
            RawRecord::new(37.0, -123.0, 450.0, 15.0),
        ];
        let output = FirePipeline::from_records(raw, config).run().unwrap();

        let mut kml = KmlBuffer(vec![]);
        kml.start_document().unwrap();
        write_clusters(&mut kml, &output.features, &output.summary, &output.palette).unwrap();
        kml.finish_document();

        let text = String::from_utf8(kml.0).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.trim_end().ends_with("</kml>"));
        assert_eq!(text.matches("<Placemark>").count(), 4);
        assert_eq!(text.matches("<Style id=").count(), 2);
        assert_eq!(text.matches("<Folder>").count(), 2);
        assert!(text.contains("<coordinates>-120,34,0</coordinates>"));
        assert!(text.contains("<color>a0b4771f</color>"));
    }
}
