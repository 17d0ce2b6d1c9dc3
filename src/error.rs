use thiserror::Error;

/// Input or configuration rejected before any iteration starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of clusters must be between 1 and {points} (number of points), got {k}")]
    InvalidClusterCount { k: usize, points: usize },

    #[error("number of clusters must be at least 1")]
    ZeroClusters,

    #[error("coordinates in dimension {dimension} are too large to measure or average without overflow")]
    CoordinateOverflow { dimension: usize },

    #[error("unknown distance strategy '{0}'")]
    UnknownDistance(String),

    #[error("unknown initialization method '{0}', expected 'random' or 'weighted'")]
    UnknownInit(String),

    #[error("cannot cluster an empty point set")]
    EmptyPoints,

    #[error("points must have at least one dimension")]
    ZeroDimension,

    #[error("point {index} has {got} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("centers have {got} dimensions but points have {expected}")]
    CenterDimension { expected: usize, got: usize },

    #[error("expected {expected} initial centers, got {got}")]
    CenterCount { expected: usize, got: usize },

    #[error("number of restarts must be at least 1")]
    NoRestarts,
}

/// A distance strategy could not produce a value for a pair of points.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("distance unavailable: {reason}")]
pub struct DistanceUnavailable {
    pub reason: String,
}

impl DistanceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub(crate) fn invalid_value(strategy: &str, value: f64) -> Self {
        Self::new(format!("{} returned invalid distance {}", strategy, value))
    }
}

/// The assignment step was voided because one point/center pair had no distance.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("assignment failed for point {point} against center {center}: {source}")]
pub struct AssignmentError {
    pub point: usize,
    pub center: usize,
    #[source]
    pub source: DistanceUnavailable,
}

/// Failure of a standalone `predict` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("invalid input: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// Run-level failure of `KMeans::fit`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("initialization failed measuring point {point} against center {center}: {source}")]
    Initialization {
        point: usize,
        center: usize,
        #[source]
        source: DistanceUnavailable,
    },

    #[error("iteration {iteration}: {source}")]
    AssignmentFailed {
        iteration: usize,
        #[source]
        source: AssignmentError,
    },
}
