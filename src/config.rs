use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::error::ConfigError;

/// How the starting centers are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMethod {
    /// k distinct points sampled uniformly without replacement.
    Random,
    /// k-means++ seeding, weighted by distance to the nearest chosen center.
    #[default]
    Weighted,
}

impl FromStr for InitMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "weighted" | "k++" | "kmeans++" | "k-means++" => Ok(Self::Weighted),
            _ => Err(ConfigError::UnknownInit(s.to_string())),
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Weighted => write!(f, "weighted"),
        }
    }
}

/// Upper bound on assignment/update rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterationCap {
    /// Iterate until the centers stop changing.
    #[default]
    Unbounded,
    Limit(NonZeroUsize),
}

impl IterationCap {
    pub fn reached(&self, iterations: usize) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Limit(limit) => iterations >= limit.get(),
        }
    }
}

/// `0` means no cap.
impl From<usize> for IterationCap {
    fn from(value: usize) -> Self {
        NonZeroUsize::new(value).map_or(Self::Unbounded, Self::Limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    pub init: InitMethod,
    pub max_iterations: IterationCap,
    /// Name of the distance strategy, resolved through a `DistanceRegistry`
    pub distance: String,
    /// Log per-iteration centers and per-point progress
    pub verbose: bool,
    /// Seed for the random source used by initialization; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 8,
            init: InitMethod::Weighted,
            max_iterations: IterationCap::Unbounded,
            distance: "euclidean".to_string(),
            verbose: false,
            seed: None,
        }
    }
}

impl KMeansConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn with_init(mut self, init: InitMethod) -> Self {
        self.init = init;
        self
    }

    /// `0` removes the cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = IterationCap::from(max_iterations);
        self
    }

    pub fn with_distance(mut self, distance: impl Into<String>) -> Self {
        self.distance = distance.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
