use clap::Parser;
use firecluster::{
    write_clusters, ClusterSummary, CsvRecordSource, FireClusterResult, FirePipeline, KmlFile,
    PipelineConfig, RiskPolicy, DEFAULT_CLUSTER_COUNT, DEFAULT_RANDOM_SEED,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Cluster wildfire detections and export them for display.
///
/// This program reads point fire detections from a CSV file (or every CSV file in a directory),
/// groups them into clusters, labels their risk, and writes a GeoJSON file of the annotated
/// detections along with an optional KML file. A per-cluster summary is printed to the terminal.
///
#[derive(Debug, Parser)]
#[clap(name = "fireclusters")]
#[clap(author, version, about)]
struct FireClustersOptionsInit {
    /// A CSV file, or a directory of them, with the fire detections.
    input: PathBuf,

    /// The number of clusters to make.
    #[clap(short = 'k', long)]
    #[clap(env = "FIRECLUSTER_K")]
    #[clap(default_value_t = DEFAULT_CLUSTER_COUNT)]
    clusters: usize,

    /// Cluster on raw latitude and longitude instead of standardized values.
    #[clap(long)]
    no_scale: bool,

    /// Seed for the cluster initialization.
    #[clap(long)]
    #[clap(env = "FIRECLUSTER_SEED")]
    #[clap(default_value_t = DEFAULT_RANDOM_SEED)]
    seed: u64,

    /// How to assign risk labels, "per-record" or "per-cluster".
    #[clap(short, long)]
    #[clap(default_value = "per-cluster")]
    risk_policy: RiskPolicy,

    /// The path to the GeoJSON file to produce from this run.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the input with "*.geojson".
    #[clap(short, long)]
    geojson_file: Option<PathBuf>,

    /// The path to a KML file to produce from this run.
    #[clap(long)]
    kml_file: Option<PathBuf>,

    /// The path to a JSON file with the per-cluster summary.
    #[clap(long)]
    summary_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct FireClustersOptionsChecked {
    /// The path to the input data.
    input: PathBuf,

    /// The path to the GeoJSON output.
    geojson_file: PathBuf,

    /// The path to the KML output, if any.
    kml_file: Option<PathBuf>,

    /// The path to the summary output, if any.
    summary_file: Option<PathBuf>,

    /// Settings for the analysis.
    config: PipelineConfig,

    /// Verbose output
    verbose: bool,
}

impl Display for FireClustersOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let policy: &'static str = self.config.risk_policy.into();

        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "         Input: {}", self.input.display())?;
        writeln!(f, "Output GeoJSON: {}", self.geojson_file.display())?;
        if let Some(kml_file) = &self.kml_file {
            writeln!(f, "    Output KML: {}", kml_file.display())?;
        }
        if let Some(summary_file) = &self.summary_file {
            writeln!(f, "Output Summary: {}", summary_file.display())?;
        }
        writeln!(f, "      Clusters: {}", self.config.cluster_count)?;
        writeln!(f, "   Scale Input: {}", self.config.scale_features)?;
        writeln!(f, "          Seed: {}", self.config.random_seed)?;
        writeln!(f, "   Risk Policy: {}", policy)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> FireClusterResult<FireClustersOptionsChecked> {
    let FireClustersOptionsInit {
        input,
        clusters,
        no_scale,
        seed,
        risk_policy,
        geojson_file,
        kml_file,
        summary_file,
        verbose,
    } = FireClustersOptionsInit::parse();

    if clusters == 0 {
        return Err("the number of clusters must be at least 1".into());
    }

    let geojson_file = match geojson_file {
        Some(v) => v,
        None => {
            let mut clone = input.clone();
            if input.is_dir() {
                clone.push("clusters");
            }
            clone.set_extension("geojson");
            clone
        }
    };

    let config = PipelineConfig {
        cluster_count: clusters,
        scale_features: !no_scale,
        random_seed: seed,
        risk_policy,
        ..PipelineConfig::default()
    };

    let checked = FireClustersOptionsChecked {
        input,
        geojson_file,
        kml_file,
        summary_file,
        config,
        verbose,
    };

    if verbose {
        println!("{}", checked);
    }

    Ok(checked)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> FireClusterResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let mut source = CsvRecordSource::new(&opts.input);
    let mut pipeline = FirePipeline::load(&mut source, opts.config)?;
    let output = pipeline.run()?;

    let geojson = output.features.to_geojson(Some(&output.palette));
    let mut f = BufWriter::new(File::create(&opts.geojson_file)?);
    serde_json::to_writer(&mut f, &geojson)?;
    f.flush()?;
    log::info!(
        "wrote {} features to {}",
        output.features.len(),
        opts.geojson_file.display()
    );

    if let Some(kml_file) = &opts.kml_file {
        let mut kfile = KmlFile::new(kml_file)?;
        write_clusters(&mut kfile, &output.features, &output.summary, &output.palette)?;
        log::info!("wrote {}", kml_file.display());
    }

    if let Some(summary_file) = &opts.summary_file {
        let mut f = BufWriter::new(File::create(summary_file)?);
        serde_json::to_writer_pretty(&mut f, &output.summary)?;
        f.flush()?;
        log::info!("wrote {}", summary_file.display());
    }

    print_summary(&output.summary);

    match output.validity_score {
        Ok(score) => println!("\nSilhouette score: {:.4}", score),
        Err(err) => println!("\nSilhouette score: {}", err),
    }

    Ok(())
}

fn print_summary(summary: &[ClusterSummary]) {
    let fmt_opt = |v: Option<f64>| match v {
        Some(v) => format!("{:.2}", v),
        None => "-".to_owned(),
    };

    println!(
        "{:>7} {:>7} {:>14} {:>10} {:>13} {:>12} {:>11}",
        "cluster", "count", "avg_brightness", "avg_frp", "avg_intensity", "risk", "radius (km)"
    );

    for row in summary {
        println!(
            "{:>7} {:>7} {:>14} {:>10} {:>13} {:>12} {:>11.1}",
            row.cluster_id,
            row.count,
            fmt_opt(row.avg_brightness),
            fmt_opt(row.avg_frp),
            fmt_opt(row.avg_intensity_score),
            row.risk.map(|r| r.description()).unwrap_or("-"),
            row.radius_km,
        );
    }
}
