use std::sync::Arc;

use itertools::Itertools;
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::centroid::update_centers;
use crate::config::KMeansConfig;
use crate::distance::{measure, Distance, DistanceRegistry};
use crate::error::{AssignmentError, ConfigError, FitError, PredictError};
use crate::initialization::initial_centers;

/// How a completed run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Recomputed centers were exactly equal to the previous ones.
    Converged,
    /// The iteration cap was hit first.
    MaxIterationsReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    centers: Array2<f64>,
    labels: Vec<usize>,
    termination: Termination,
    iterations: usize,
    inertia: f64,
}

impl FittedModel {
    /// One row per cluster; row `i` is the center of cluster `i`.
    pub fn centers(&self) -> ArrayView2<f64> {
        self.centers.view()
    }

    /// Cluster index for every input point, in input order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Number of assignment/update rounds that ran.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Sum of each point's distance to its center in the final assignment step.
    ///
    /// After `MaxIterationsReached` that step ran against the centers from
    /// before the last update, so this value does not describe `centers()`.
    /// After `Converged` the two coincide.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn into_parts(self) -> (Array2<f64>, Vec<usize>) {
        (self.centers, self.labels)
    }

    pub fn predict(&self, points: ArrayView2<f64>, distance: &dyn Distance) -> Result<Vec<usize>, PredictError> {
        predict(points, self.centers.view(), distance)
    }
}

struct Assignment {
    labels: Vec<usize>,
    distances: Vec<f64>,
}

/// Labels every point with its nearest center, lowest index winning ties.
///
/// One unavailable distance voids the whole step.
fn assign(
    points: ArrayView2<f64>,
    centers: ArrayView2<f64>,
    distance: &dyn Distance,
    verbose: bool,
) -> Result<Assignment, AssignmentError> {
    let n = points.nrows();
    let mut labels = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);

    for (point_idx, point) in points.outer_iter().enumerate() {
        let mut nearest = (0, f64::INFINITY);
        for (center_idx, center) in centers.outer_iter().enumerate() {
            let d = measure(distance, point, center).map_err(|source| AssignmentError {
                point: point_idx,
                center: center_idx,
                source,
            })?;
            if center_idx == 0 || d < nearest.1 {
                nearest = (center_idx, d);
            }
        }
        labels.push(nearest.0);
        distances.push(nearest.1);

        if verbose && point_idx % 100 == 0 {
            log::info!("{:.2}%", point_idx as f64 / n as f64 * 100.0);
        }
    }

    Ok(Assignment { labels, distances })
}

/// The assignment step on its own, against any set of centers.
pub fn predict(
    points: ArrayView2<f64>,
    centers: ArrayView2<f64>,
    distance: &dyn Distance,
) -> Result<Vec<usize>, PredictError> {
    if centers.nrows() == 0 {
        return Err(ConfigError::InvalidClusterCount { k: 0, points: points.nrows() }.into());
    }
    if centers.ncols() != points.ncols() {
        return Err(ConfigError::CenterDimension {
            expected: points.ncols(),
            got: centers.ncols(),
        }
        .into());
    }
    Ok(assign(points, centers, distance, false)?.labels)
}

/// Rejects empty, zero-dimensional or non-finite input, and coordinates large
/// enough to overflow distance or mean computations.
pub fn validate_points(points: ArrayView2<f64>) -> Result<(), ConfigError> {
    if points.nrows() == 0 {
        return Err(ConfigError::EmptyPoints);
    }
    if points.ncols() == 0 {
        return Err(ConfigError::ZeroDimension);
    }
    if let Some((index, _)) = points
        .outer_iter()
        .find_position(|point| point.iter().any(|v| !v.is_finite()))
    {
        return Err(ConfigError::NonFinite { index });
    }

    // Bounds the squared Euclidean norm of any difference and the per-cluster sums
    let (n, dimensions) = points.dim();
    for (dimension, column) in points.axis_iter(Axis(1)).enumerate() {
        let (min, max) = column
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = max - min;
        let largest = min.abs().max(max.abs());
        if !(span * span * dimensions as f64).is_finite() || !(largest * n as f64).is_finite() {
            return Err(ConfigError::CoordinateOverflow { dimension });
        }
    }
    Ok(())
}

fn format_centers(centers: ArrayView2<f64>) -> String {
    centers.outer_iter().map(|c| format!("{:?}", c.to_vec())).join(", ")
}

/// k-means over a pluggable distance strategy.
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
    distance: Arc<dyn Distance>,
}

impl KMeans {
    /// Resolves `config.distance` through `registry`.
    pub fn new(config: KMeansConfig, registry: &DistanceRegistry) -> Result<Self, ConfigError> {
        let distance = registry.get(&config.distance)?;
        Self::with_distance(config, distance)
    }

    /// Uses `distance` directly, ignoring `config.distance`.
    pub fn with_distance(config: KMeansConfig, distance: Arc<dyn Distance>) -> Result<Self, ConfigError> {
        if config.k == 0 {
            return Err(ConfigError::ZeroClusters);
        }
        Ok(Self { config, distance })
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    pub fn distance(&self) -> &dyn Distance {
        self.distance.as_ref()
    }

    fn validate(&self, points: ArrayView2<f64>) -> Result<(), ConfigError> {
        validate_points(points)?;
        if self.config.k > points.nrows() {
            return Err(ConfigError::InvalidClusterCount {
                k: self.config.k,
                points: points.nrows(),
            });
        }
        Ok(())
    }

    /// Seeds from `config.seed` when set, from entropy otherwise.
    pub fn fit(&self, points: ArrayView2<f64>) -> Result<FittedModel, FitError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.fit_with_rng(points, &mut rng)
    }

    pub fn fit_with_rng<R: Rng + ?Sized>(&self, points: ArrayView2<f64>, rng: &mut R) -> Result<FittedModel, FitError> {
        self.validate(points)?;

        let centers = initial_centers(
            self.config.init,
            points,
            self.config.k,
            self.distance(),
            rng,
            self.config.verbose,
        )?;
        log::info!("initialized {} centers with {} seeding", self.config.k, self.config.init);

        self.refine_validated(points, centers)
    }

    /// Runs the iteration loop from caller-supplied starting centers.
    pub fn refine(&self, points: ArrayView2<f64>, centers: Array2<f64>) -> Result<FittedModel, FitError> {
        self.validate(points)?;
        if centers.nrows() != self.config.k {
            return Err(ConfigError::CenterCount {
                expected: self.config.k,
                got: centers.nrows(),
            }
            .into());
        }
        if centers.ncols() != points.ncols() {
            return Err(ConfigError::CenterDimension {
                expected: points.ncols(),
                got: centers.ncols(),
            }
            .into());
        }
        self.refine_validated(points, centers)
    }

    fn refine_validated(&self, points: ArrayView2<f64>, mut centers: Array2<f64>) -> Result<FittedModel, FitError> {
        let verbose = self.config.verbose;
        let mut iterations = 0;

        loop {
            if iterations > 0 && iterations % 10 == 0 {
                log::info!("Finished iteration {}", iterations);
            }

            let assignment = assign(points, centers.view(), self.distance(), verbose)
                .map_err(|source| FitError::AssignmentFailed {
                    iteration: iterations + 1,
                    source,
                })?;
            iterations += 1;

            let new_centers = update_centers(points, &assignment.labels, centers.view());
            let inertia = assignment.distances.iter().sum::<f64>();

            // Exact equality: floating point noise can keep this from ever holding
            if new_centers == centers {
                log::info!("Converged after {} iterations", iterations);
                return Ok(FittedModel {
                    centers,
                    labels: assignment.labels,
                    termination: Termination::Converged,
                    iterations,
                    inertia,
                });
            }
            centers = new_centers;

            if verbose {
                log::info!("iter: {} centers: {}", iterations, format_centers(centers.view()));
            } else {
                log::debug!("iter: {} inertia: {}", iterations, inertia);
            }

            if self.config.max_iterations.reached(iterations) {
                log::info!("Reached maximum of {} iterations without converging", iterations);
                return Ok(FittedModel {
                    centers,
                    labels: assignment.labels,
                    termination: Termination::MaxIterationsReached,
                    iterations,
                    inertia,
                });
            }
        }
    }

    /// Runs `restarts` independent fits in parallel and keeps the one with the
    /// lowest inertia.
    ///
    /// Run `i` seeds its own generator with `seed + i`, so the outcome is
    /// reproducible when `config.seed` is set. Failed runs are skipped; if all
    /// of them fail, the first failure is returned.
    pub fn fit_best_of(&self, points: ArrayView2<f64>, restarts: usize) -> Result<FittedModel, FitError> {
        if restarts == 0 {
            return Err(ConfigError::NoRestarts.into());
        }
        self.validate(points)?;

        let base_seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let results: Vec<Result<FittedModel, FitError>> = (0..restarts)
            .into_par_iter()
            .map(|run| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(run as u64));
                self.fit_with_rng(points, &mut rng)
            })
            .collect();

        let mut first_error = None;
        let mut best: Option<(usize, FittedModel)> = None;
        for (run, result) in results.into_iter().enumerate() {
            match result {
                Ok(model) => {
                    log::info!("Finished KMeans for initialization #{} - Inertia: {}", run, model.inertia);
                    if best.as_ref().map_or(true, |(_, b)| model.inertia < b.inertia) {
                        best = Some((run, model));
                    }
                }
                Err(err) => {
                    log::warn!("Initialization #{} failed: {}", run, err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match (best, first_error) {
            (Some((run, model)), _) => {
                log::info!("Best initialization is index #{} with {} inertia", run, model.inertia);
                Ok(model)
            }
            (None, Some(err)) => Err(err),
            (None, None) => Err(ConfigError::NoRestarts.into()),
        }
    }
}
