use ndarray::{Array2, ArrayView1, ArrayView2};

/// Running per-cluster sums for the update step.
#[derive(Debug, Clone)]
pub struct CentroidAccumulator {
    sums: Array2<f64>,
    counts: Vec<usize>,
}

impl CentroidAccumulator {
    pub fn new(k: usize, dimensions: usize) -> Self {
        Self {
            sums: Array2::zeros((k, dimensions)),
            counts: vec![0; k],
        }
    }

    pub fn update_centroid(&mut self, label: usize, data_point: ArrayView1<f64>) {
        let mut sum = self.sums.row_mut(label);
        sum += &data_point;
        self.counts[label] += 1;
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Means of each cluster. A cluster that received no point keeps its
    /// center from `previous` so no NaN reaches the next iteration.
    pub fn finalize_centroids(self, previous: ArrayView2<f64>) -> Array2<f64> {
        let Self { mut sums, counts } = self;
        for ((mut centroid, &count), old) in sums.outer_iter_mut().zip(counts.iter()).zip(previous.outer_iter()) {
            if count > 0 {
                centroid /= count as f64;
            } else {
                centroid.assign(&old);
            }
        }
        sums
    }
}

/// The update step: every center becomes the mean of the points labeled with it.
pub fn update_centers(points: ArrayView2<f64>, labels: &[usize], previous: ArrayView2<f64>) -> Array2<f64> {
    let mut accumulator = CentroidAccumulator::new(previous.nrows(), previous.ncols());
    for (point, &label) in points.outer_iter().zip(labels.iter()) {
        accumulator.update_centroid(label, point);
    }
    accumulator.finalize_centroids(previous)
}
