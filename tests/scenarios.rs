use std::sync::Arc;

use itertools::Itertools;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use kmeans_kpp_custom_distance::distance::euclidean_distance;
use kmeans_kpp_custom_distance::{
    predict, AssignmentError, DistanceRegistry, FitError, InitMethod, KMeans, KMeansConfig, RouteTable, Termination,
    TravelDistance,
};

fn builtin(config: KMeansConfig) -> KMeans {
    KMeans::new(config, &DistanceRegistry::with_builtins()).unwrap()
}

/// Every ordered pair of `points`, measured as the straight-line distance.
fn route_table(points: &Array2<f64>) -> RouteTable {
    let mut table = RouteTable::new();
    for (a, b) in points.outer_iter().tuple_combinations() {
        table.insert_symmetric((a[0], a[1]), (b[0], b[1]), euclidean_distance(a, b));
    }
    table
}

#[test]
fn two_pairs_converge_to_their_midpoints() {
    let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
    let kmeans = builtin(KMeansConfig::new(2).with_init(InitMethod::Random));

    let model = kmeans.refine(points.view(), array![[0.0, 0.0], [10.0, 0.0]]).unwrap();

    assert_eq!(model.termination(), Termination::Converged);
    assert_eq!(model.centers(), array![[0.0, 0.5], [10.0, 0.5]]);
    assert_eq!(model.labels(), &[0, 0, 1, 1]);
    assert_eq!(model.iterations(), 2);
}

#[test]
fn identical_points_converge_immediately_with_label_zero() {
    let points = array![[3.0, -1.0], [3.0, -1.0], [3.0, -1.0]];
    for init in [InitMethod::Random, InitMethod::Weighted] {
        for seed in 0..10 {
            let model = builtin(KMeansConfig::new(3).with_init(init).with_seed(seed))
                .fit(points.view())
                .unwrap();
            assert!(model.converged());
            assert_eq!(model.iterations(), 1);
            assert_eq!(model.labels(), &[0, 0, 0]);
            assert!(model.centers().outer_iter().all(|c| c == points.row(0)));
        }
    }
}

#[test]
fn one_center_per_point_is_the_identity() {
    let points = array![[0.0, 0.0], [1.0, 3.0], [7.0, 2.0], [4.0, 9.0], [-5.0, 6.0]];
    for seed in 0..10 {
        for init in [InitMethod::Random, InitMethod::Weighted] {
            let model = builtin(KMeansConfig::new(5).with_init(init).with_seed(seed))
                .fit(points.view())
                .unwrap();
            assert!(model.converged());
            assert_eq!(model.labels().iter().unique().count(), 5);
            for (idx, &label) in model.labels().iter().enumerate() {
                assert_eq!(model.centers().row(label), points.row(idx));
            }
        }
    }
}

#[test]
fn missing_route_mid_run_fails_the_whole_fit() {
    let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
    let travel = Arc::new(TravelDistance::new(route_table(&points)));
    let kmeans = KMeans::with_distance(KMeansConfig::new(2), travel).unwrap();

    // The first round only measures tabulated points; the recomputed midpoints have no routes
    let err = kmeans.refine(points.view(), array![[0.0, 0.0], [10.0, 0.0]]).unwrap_err();
    match err {
        FitError::AssignmentFailed {
            iteration,
            source: AssignmentError { point, center, .. },
        } => {
            assert_eq!(iteration, 2);
            assert_eq!((point, center), (0, 0));
        }
        other => panic!("expected an assignment failure, got {:?}", other),
    }
}

#[test]
fn registered_travel_distance_runs_like_a_builtin() {
    let points = array![[37.77, -122.42], [37.78, -122.41], [40.71, -74.00], [40.72, -74.01]];
    let mut registry = DistanceRegistry::with_builtins();
    registry.register("driving", Arc::new(TravelDistance::new(route_table(&points))));

    let kmeans = KMeans::new(KMeansConfig::new(2).with_distance("driving"), &registry).unwrap();
    let labels = predict(points.view(), points.select(ndarray::Axis(0), &[0, 2]).view(), kmeans.distance()).unwrap();
    assert_eq!(labels, vec![0, 0, 1, 1]);
}

#[test]
fn predict_reuses_fitted_centers() {
    let points = array![[0.0], [0.5], [1.0], [20.0], [20.5], [21.0]];
    let kmeans = builtin(KMeansConfig::new(2).with_distance("cityblock"));
    let mut rng = StdRng::seed_from_u64(17);
    let model = kmeans.fit_with_rng(points.view(), &mut rng).unwrap();

    let first = model.predict(points.view(), kmeans.distance()).unwrap();
    let second = model.predict(points.view(), kmeans.distance()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
    assert_eq!(first[0], first[2]);
    assert_eq!(first[3], first[5]);
    assert_ne!(first[0], first[3]);
}

/// Distinct points are as far apart as an f64 allows.
#[derive(Debug)]
struct FarApart;

impl kmeans_kpp_custom_distance::Distance for FarApart {
    fn name(&self) -> &str {
        "far-apart"
    }

    fn distance(
        &self,
        a: ndarray::ArrayView1<f64>,
        b: ndarray::ArrayView1<f64>,
    ) -> Result<f64, kmeans_kpp_custom_distance::DistanceUnavailable> {
        Ok(if a == b { 0.0 } else { 1e308 })
    }
}

#[test]
fn weighted_seeding_survives_distances_near_f64_max() {
    let points = array![[0.0], [1.0], [2.0], [3.0]];
    let config = KMeansConfig::new(2).with_init(InitMethod::Weighted).with_seed(1).with_max_iterations(20);
    let model = KMeans::with_distance(config, Arc::new(FarApart))
        .unwrap()
        .fit(points.view())
        .unwrap();
    assert_eq!(model.labels().len(), 4);
    assert_eq!(model.centers().nrows(), 2);
}
