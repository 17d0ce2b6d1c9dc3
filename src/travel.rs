//! Travel distance between `(latitude, longitude)` points.
//!
//! The actual routing backend lives outside this crate. Anything that can answer
//! an origin/destination query implements [`RouteService`] and is wrapped in a
//! [`TravelDistance`] to take part in clustering like any other metric.

use std::collections::HashMap;
use std::fmt::Debug;

use ndarray::ArrayView1;

use crate::distance::Distance;
use crate::error::DistanceUnavailable;

pub type Coordinate = (f64, f64);

pub trait RouteService: Debug + Send + Sync {
    /// Travel distance from `from` to `to`, in the service's unit (usually meters).
    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, DistanceUnavailable>;
}

#[derive(Debug, Clone)]
pub struct TravelDistance<S> {
    service: S,
}

impl<S: RouteService> TravelDistance<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

fn coordinate(point: ArrayView1<f64>) -> Result<Coordinate, DistanceUnavailable> {
    if point.len() != 2 {
        return Err(DistanceUnavailable::new(format!(
            "travel distance needs (latitude, longitude) points, got {} dimensions",
            point.len()
        )));
    }
    Ok((point[0], point[1]))
}

impl<S: RouteService> Distance for TravelDistance<S> {
    fn name(&self) -> &str {
        "driving"
    }

    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64, DistanceUnavailable> {
        self.service.route_distance(coordinate(a)?, coordinate(b)?)
    }
}

/// Precomputed origin/destination matrix.
///
/// Lookups match coordinates exactly, so a recomputed center that is not one of
/// the tabulated locations has no route and reports `DistanceUnavailable`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(u64, u64, u64, u64), f64>,
}

fn route_key(from: Coordinate, to: Coordinate) -> (u64, u64, u64, u64) {
    // +0.0 and -0.0 must hit the same entry
    let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
    (bits(from.0), bits(from.1), bits(to.0), bits(to.1))
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Coordinate, to: Coordinate, distance: f64) -> &mut Self {
        self.routes.insert(route_key(from, to), distance);
        self
    }

    /// Same distance in both directions.
    pub fn insert_symmetric(&mut self, a: Coordinate, b: Coordinate, distance: f64) -> &mut Self {
        self.insert(a, b, distance).insert(b, a, distance)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteService for RouteTable {
    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, DistanceUnavailable> {
        if from == to {
            return Ok(0.0);
        }
        self.routes.get(&route_key(from, to)).copied().ok_or_else(|| {
            DistanceUnavailable::new(format!("no route from {:?} to {:?}", from, to))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_route_table_lookup() {
        let mut table = RouteTable::new();
        table.insert_symmetric((37.77, -122.42), (37.80, -122.27), 19_500.0);
        let travel = TravelDistance::new(table);

        let sf = array![37.77, -122.42];
        let oakland = array![37.80, -122.27];
        assert_eq!(travel.distance(sf.view(), oakland.view()), Ok(19_500.0));
        assert_eq!(travel.distance(oakland.view(), sf.view()), Ok(19_500.0));
        assert_eq!(travel.distance(sf.view(), sf.view()), Ok(0.0));
        assert_eq!(travel.service().len(), 2);
    }

    #[test]
    fn test_missing_route_is_unavailable() {
        let travel = TravelDistance::new(RouteTable::new());
        let a = array![1.0, 2.0];
        let b = array![3.0, 4.0];
        let err = travel.distance(a.view(), b.view()).unwrap_err();
        assert!(err.reason.contains("no route"));
    }

    #[test]
    fn test_wrong_dimension_is_unavailable() {
        let travel = TravelDistance::new(RouteTable::new());
        let a = array![1.0, 2.0, 3.0];
        assert!(travel.distance(a.view(), a.view()).is_err());
    }

    #[test]
    fn test_signed_zero_shares_entry() {
        let mut table = RouteTable::new();
        table.insert((0.0, 1.0), (2.0, 3.0), 7.0);
        assert_eq!(table.route_distance((-0.0, 1.0), (2.0, 3.0)), Ok(7.0));
    }
}
