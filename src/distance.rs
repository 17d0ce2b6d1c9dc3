use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use ndarray::ArrayView1;

use crate::error::{ConfigError, DistanceUnavailable};

/// Pairwise distance between two points of equal dimensionality.
///
/// Implementations return a non-negative value or `DistanceUnavailable` when
/// the pair cannot be resolved. The clustering loop never retries a failed
/// call. Built-in strategies are pure; external ones may block on I/O.
pub trait Distance: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64, DistanceUnavailable>;
}

/// Calls the strategy and rejects values that would poison the weighted draw or argmin.
pub(crate) fn measure(
    strategy: &dyn Distance,
    a: ArrayView1<f64>,
    b: ArrayView1<f64>,
) -> Result<f64, DistanceUnavailable> {
    let value = strategy.distance(a, b)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DistanceUnavailable::invalid_value(strategy.name(), value))
    }
}

pub fn euclidean_distance(us: ArrayView1<f64>, them: ArrayView1<f64>) -> f64 {
    us.iter()
        .zip(them.iter())
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

pub fn manhattan_distance(us: ArrayView1<f64>, them: ArrayView1<f64>) -> f64 {
    us.iter().zip(them.iter()).map(|(a, b)| (a - b).abs()).sum()
}

/// L2 norm of the difference vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Distance for Euclidean {
    fn name(&self) -> &str {
        "euclidean"
    }

    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64, DistanceUnavailable> {
        Ok(euclidean_distance(a, b))
    }
}

/// L1 norm of the difference vector, a.k.a. city block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Distance for Manhattan {
    fn name(&self) -> &str {
        "manhattan"
    }

    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64, DistanceUnavailable> {
        Ok(manhattan_distance(a, b))
    }
}

/// Named set of strategies a configuration can select from.
#[derive(Debug, Clone, Default)]
pub struct DistanceRegistry {
    strategies: HashMap<String, Arc<dyn Distance>>,
}

impl DistanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `euclidean`, `manhattan` and its alias `cityblock`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let manhattan: Arc<dyn Distance> = Arc::new(Manhattan);
        registry.register("euclidean", Arc::new(Euclidean));
        registry.register("manhattan", manhattan.clone());
        registry.register("cityblock", manhattan);
        registry
    }

    /// Adds a strategy, replacing any previous one under the same name.
    pub fn register(&mut self, name: impl Into<String>, strategy: Arc<dyn Distance>) -> &mut Self {
        self.strategies.insert(name.into().to_lowercase(), strategy);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Distance>, ConfigError> {
        self.strategies
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDistance(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[derive(Debug)]
    struct Negative;

    impl Distance for Negative {
        fn name(&self) -> &str {
            "negative"
        }

        fn distance(&self, _: ArrayView1<f64>, _: ArrayView1<f64>) -> Result<f64, DistanceUnavailable> {
            Ok(-1.0)
        }
    }

    #[test]
    fn test_builtin_metrics() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(euclidean_distance(a.view(), b.view()), 5.0);
        assert_eq!(manhattan_distance(a.view(), b.view()), 7.0);
        assert_eq!(Euclidean.distance(b.view(), a.view()), Ok(5.0));
        assert_eq!(Manhattan.distance(b.view(), b.view()), Ok(0.0));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = DistanceRegistry::with_builtins();
        assert_eq!(registry.get("euclidean").unwrap().name(), "euclidean");
        assert_eq!(registry.get("CityBlock").unwrap().name(), "manhattan");
        assert_eq!(registry.names(), vec!["cityblock", "euclidean", "manhattan"]);
        assert_eq!(
            registry.get("driving").unwrap_err(),
            ConfigError::UnknownDistance("driving".to_string())
        );
    }

    #[test]
    fn test_measure_rejects_invalid_values() {
        let a = array![1.0];
        let err = measure(&Negative, a.view(), a.view()).unwrap_err();
        assert!(err.reason.contains("negative"));
        assert_eq!(measure(&Euclidean, a.view(), a.view()), Ok(0.0));
    }
}
