/*!
 * Run all the stages, from raw detections to display ready products.
 *
 * Ingestion happens once in [FirePipeline::load], followed by preprocessing and feature scaling.
 * The clustering dependent stages can then be run as many times as needed with different
 * cluster counts on the same prepared records.
 */

use crate::{
    cluster::{
        KMeans, DEFAULT_CLUSTER_COUNT, DEFAULT_MAX_ITERATIONS, DEFAULT_RANDOM_SEED,
        DEFAULT_RESTARTS,
    },
    color::{cluster_identities, ColorAssigner, ColorPalette},
    error::{ClusteringError, FireClusterResult, PipelineError},
    geo::{Crs, GeoRecordSet},
    preprocess::preprocess,
    record::{RawRecord, RecordSet},
    risk::{apply_risk_labels, RiskPolicy},
    scale::FeatureMatrix,
    summary::{summarize, ClusterSummary},
};

/// Anything that can supply raw detections.
pub trait RecordSource {
    /// Load every record. A failure here means the pipeline will not run at all.
    fn load(&mut self) -> FireClusterResult<Vec<RawRecord>>;
}

impl RecordSource for Vec<RawRecord> {
    fn load(&mut self) -> FireClusterResult<Vec<RawRecord>> {
        Ok(std::mem::take(self))
    }
}

/// Options that control a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// The number of clusters, `k`.
    pub cluster_count: usize,
    /// Standardize latitude and longitude before clustering.
    pub scale_features: bool,
    /// Seed for centroid initialization.
    pub random_seed: u64,
    /// Limit on Lloyd iterations per clustering run.
    pub max_iterations: usize,
    /// Number of seeded clustering runs, the best is kept.
    pub restarts: usize,
    /// Which risk labeling to apply to the records.
    pub risk_policy: RiskPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            cluster_count: DEFAULT_CLUSTER_COUNT,
            scale_features: true,
            random_seed: DEFAULT_RANDOM_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            restarts: DEFAULT_RESTARTS,
            risk_policy: RiskPolicy::default(),
        }
    }
}

/// The products of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// The clustered, classified, colored, geo-referenced records.
    pub features: GeoRecordSet,
    /// One row per cluster, ascending by cluster id.
    pub summary: Vec<ClusterSummary>,
    /// The silhouette score, or the reason it is undefined.
    pub validity_score: Result<f64, ClusteringError>,
    /// The color of each cluster.
    pub palette: ColorPalette,
}

/**
 * Preprocessed records and their features, ready to be clustered.
 */
#[derive(Debug)]
pub struct FirePipeline {
    config: PipelineConfig,
    records: RecordSet,
    features: FeatureMatrix,
    colors: ColorAssigner,
}

impl FirePipeline {
    /**
     * Load records from a source and prepare them.
     *
     * If the source fails, the error is returned and nothing else is done.
     */
    pub fn load<S: RecordSource>(
        source: &mut S,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let raw = source.load().map_err(PipelineError::Ingestion)?;
        log::info!("loaded {} records", raw.len());

        Ok(Self::from_records(raw, config))
    }

    /// Prepare records that are already in memory.
    pub fn from_records(raw: Vec<RawRecord>, config: PipelineConfig) -> Self {
        let records = preprocess(raw);
        let features = FeatureMatrix::from_records(&records, config.scale_features);

        FirePipeline {
            config,
            records,
            features,
            colors: ColorAssigner::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The preprocessed records, before any clustering.
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// Run the clustering dependent stages with the configured cluster count.
    pub fn run(&mut self) -> Result<PipelineOutput, PipelineError> {
        let k = self.config.cluster_count;
        self.run_with_cluster_count(k).map_err(PipelineError::from)
    }

    /**
     * Cluster, classify, color, summarize, and export with `k` clusters.
     *
     * The prepared records are not modified, so this can be called repeatedly.
     */
    pub fn run_with_cluster_count(&mut self, k: usize) -> Result<PipelineOutput, ClusteringError> {
        let clustering = KMeans::new(k)
            .with_seed(self.config.random_seed)
            .with_max_iterations(self.config.max_iterations)
            .with_restarts(self.config.restarts)
            .fit(&self.features)?;

        let mut records = self.records.clone();
        clustering.apply_to(&mut records);
        apply_risk_labels(&mut records, self.config.risk_policy);

        let palette = self
            .colors
            .palette_for(&cluster_identities(&records))
            .clone();
        palette.apply_to(&mut records);

        let summary = summarize(&records);
        let validity_score = clustering.validity_score();

        match validity_score {
            Ok(score) => log::info!("k={} silhouette score {:.4}", k, score),
            Err(ref err) => log::warn!("k={}: {}", k, err),
        }

        Ok(PipelineOutput {
            features: GeoRecordSet::export(&records, Crs::Epsg4326),
            summary,
            validity_score,
            palette,
        })
    }
}
