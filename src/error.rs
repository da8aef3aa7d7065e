use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type for anything that touches the outside world (files, parsing, writers).
pub type FireClusterResult<T> = Result<T, Box<dyn Error>>;

/// Structural problems with a clustering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringError {
    /// The requested number of clusters is zero or more than the number of distinct points.
    InvalidClusterCount {
        requested: usize,
        distinct_points: usize,
    },
    /// The validity score is undefined when every point shares one cluster or every point has
    /// its own cluster.
    DegenerateValidityScore { clusters: usize, points: usize },
}

impl Display for ClusteringError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::InvalidClusterCount {
                requested,
                distinct_points,
            } => write!(
                f,
                "invalid cluster count {} for {} distinct points",
                requested, distinct_points
            ),
            Self::DegenerateValidityScore { clusters, points } => write!(
                f,
                "validity score undefined for {} clusters over {} points",
                clusters, points
            ),
        }
    }
}

impl Error for ClusteringError {}

/// Everything that can stop a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// Loading the records failed, no stage was run.
    Ingestion(Box<dyn Error>),
    /// The clustering request was malformed.
    Clustering(ClusteringError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::Ingestion(err) => write!(f, "ingestion failed: {}", err),
            Self::Clustering(err) => write!(f, "clustering failed: {}", err),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ingestion(err) => Some(err.as_ref()),
            Self::Clustering(err) => Some(err),
        }
    }
}

impl From<ClusteringError> for PipelineError {
    fn from(err: ClusteringError) -> Self {
        PipelineError::Clustering(err)
    }
}
