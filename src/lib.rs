/*!
 * Group point wildfire detections into geographic clusters and describe them.
 *
 * Raw detections (latitude, longitude, brightness, fire radiative power) are cleaned and sorted,
 * clustered with k-means on their (optionally standardized) positions, labeled with a risk band,
 * colored by cluster, summarized per cluster, and finally geo-referenced for display. The
 * [FirePipeline] runs all of those stages, but each one is also available on its own.
 */

pub use cluster::{
    silhouette_score, Clustering, KMeans, DEFAULT_CLUSTER_COUNT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_RANDOM_SEED, DEFAULT_RESTARTS,
};
pub use color::{cluster_identities, ColorAssigner, ColorPalette, Rgba, CLUSTER_ALPHA};
pub use csv_source::{read_records, CsvRecordSource};
pub use error::{ClusteringError, FireClusterResult, PipelineError};
pub use geo::{Coord, Crs, GeoPoint, GeoRecord, GeoRecordSet};
pub use kml::{write_clusters, KmlFile, KmlWriter};
pub use pipeline::{FirePipeline, PipelineConfig, PipelineOutput, RecordSource};
pub use preprocess::preprocess;
pub use record::{intensity_score, FireRecord, RawRecord, RecordSet};
pub use risk::{
    apply_risk_labels, classify_brightness, classify_cluster_means, cluster_mean_brightness,
    RiskLabel, RiskPolicy,
};
pub use scale::{Feature, FeatureMatrix, StandardScaler};
pub use summary::{summarize, ClusterSummary};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod color;
mod csv_source;
mod error;
mod geo;
mod kml;
mod pipeline;
mod preprocess;
mod record;
mod risk;
mod scale;
mod summary;
