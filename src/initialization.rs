use std::borrow::Cow;

use itertools::Itertools;
use ndarray::{Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::config::InitMethod;
use crate::distance::{measure, Distance};
use crate::error::FitError;

/// Indices of the starting centers. Callers guarantee `1 <= k <= points.nrows()`.
pub fn initial_indices<R: Rng + ?Sized>(
    method: InitMethod,
    points: ArrayView2<f64>,
    k: usize,
    distance: &dyn Distance,
    rng: &mut R,
    verbose: bool,
) -> Result<Vec<usize>, FitError> {
    match method {
        InitMethod::Random => Ok(random_indices(points.nrows(), k, rng)),
        InitMethod::Weighted => kmeans_plusplus(points, k, distance, rng, verbose),
    }
}

pub fn initial_centers<R: Rng + ?Sized>(
    method: InitMethod,
    points: ArrayView2<f64>,
    k: usize,
    distance: &dyn Distance,
    rng: &mut R,
    verbose: bool,
) -> Result<Array2<f64>, FitError> {
    let indices = initial_indices(method, points, k, distance, rng, verbose)?;
    Ok(points.select(Axis(0), &indices))
}

/// k distinct indices sampled without replacement.
pub fn random_indices<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    index::sample(rng, n, k).into_vec()
}

/// Weights whose total stays finite. Distances near `f64::MAX` are rescaled
/// by the largest one, which keeps their proportions.
fn draw_weights(distances: &[f64]) -> Cow<'_, [f64]> {
    if distances.iter().sum::<f64>().is_finite() {
        return Cow::Borrowed(distances);
    }
    let max = distances.iter().copied().fold(0.0, f64::max);
    Cow::Owned(distances.iter().map(|d| d / max).collect())
}

/// k-means++ seeding over an arbitrary distance strategy.
///
/// Each point's weight is its distance to the nearest center chosen so far, so
/// already chosen points (weight zero) are never drawn again unless every
/// weight is zero. In that case the next center is drawn uniformly from the
/// points not chosen yet.
pub fn kmeans_plusplus<R: Rng + ?Sized>(
    points: ArrayView2<f64>,
    k: usize,
    distance: &dyn Distance,
    rng: &mut R,
    verbose: bool,
) -> Result<Vec<usize>, FitError> {
    let n = points.nrows();
    let mut chosen: Vec<usize> = Vec::with_capacity(k);

    // Randomly select the first center
    chosen.push(rng.gen_range(0..n));

    let mut min_distances = vec![f64::MAX; n];

    while chosen.len() < k {
        let center_idx = chosen.len() - 1;
        let center = points.row(chosen[center_idx]);

        // Only the newest center can lower a point's nearest distance
        for (idx, min_dist) in min_distances.iter_mut().enumerate() {
            let d = measure(distance, points.row(idx), center).map_err(|source| {
                FitError::Initialization {
                    point: idx,
                    center: center_idx,
                    source,
                }
            })?;
            *min_dist = min_dist.min(d);
        }

        let weights = draw_weights(&min_distances);
        let next = match WeightedIndex::new(&*weights) {
            Ok(index) => index.sample(rng),
            Err(err) => {
                log::warn!("k++ weights are degenerate ({}), choosing uniformly among unused points", err);
                let remaining = (0..n).filter(|idx| !chosen.contains(idx)).collect_vec();
                // chosen.len() < k <= n, so at least one point is left
                *remaining.choose(rng).unwrap_or(&0)
            }
        };
        chosen.push(next);

        if verbose {
            log::info!("k++ centers:\n{}", points.select(Axis(0), &chosen));
        }
    }

    Ok(chosen)
}
