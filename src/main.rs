use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use ndarray::{concatenate, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

use kmeans_kpp_custom_distance::load::{load_points, save_model};
use kmeans_kpp_custom_distance::logger::init_logger;
use kmeans_kpp_custom_distance::{DistanceRegistry, InitMethod, KMeans, KMeansConfig};

#[derive(Debug, Parser)]
#[command(name = "kmeans", about = "k-means with k-means++ seeding and a selectable distance")]
struct Args {
    /// Protobuf `PointSet` file to cluster; a synthetic data set is used when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the protobuf `ClusteredData` result
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of clusters
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// `random` or `weighted` (k-means++)
    #[arg(long, default_value = "weighted")]
    init: String,

    /// Iteration cap, 0 for none
    #[arg(long = "max-iter", default_value_t = 0)]
    max_iter: usize,

    /// Distance strategy name
    #[arg(long, default_value = "euclidean")]
    distance: String,

    #[arg(long)]
    seed: Option<u64>,

    /// Independent initializations; the lowest inertia wins
    #[arg(long, default_value_t = 1)]
    restarts: usize,

    /// Number of synthetic points per blob when no input is given
    #[arg(long, default_value_t = 100)]
    demo_points: usize,

    #[arg(short, long)]
    verbose: bool,
}

/// Three square blobs of uniformly scattered 2-D points.
fn demo_dataset(points_per_blob: usize, seed: Option<u64>) -> Result<Array2<f64>, Box<dyn Error>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let offsets = [[0.0, 0.0], [10.0, 0.0], [5.0, 8.0]];
    let blobs = offsets
        .iter()
        .map(|offset| {
            let mut blob = Array2::random_using((points_per_blob, 2), Uniform::new(-1.0, 1.0), &mut rng);
            for mut row in blob.outer_iter_mut() {
                row[0] += offset[0];
                row[1] += offset[1];
            }
            blob
        })
        .collect::<Vec<_>>();
    let views = blobs.iter().map(|b| b.view()).collect::<Vec<_>>();
    Ok(concatenate(Axis(0), &views)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger(LevelFilter::Info).map_err(|err| err.to_string())?;

    let init: InitMethod = args.init.parse()?;
    let mut config = KMeansConfig::new(args.k)
        .with_init(init)
        .with_max_iterations(args.max_iter)
        .with_distance(args.distance.as_str())
        .with_verbose(args.verbose);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let points = match &args.input {
        Some(path) => load_points(path)?,
        None => demo_dataset(args.demo_points, args.seed)?,
    };

    let registry = DistanceRegistry::with_builtins();
    let kmeans = KMeans::new(config, &registry)?;
    log::info!(
        "Starting KMeans with {} distance, k = {}, {} points",
        kmeans.distance().name(),
        args.k,
        points.nrows()
    );

    let model = if args.restarts > 1 {
        kmeans.fit_best_of(points.view(), args.restarts)?
    } else {
        kmeans.fit(points.view())?
    };

    log::info!(
        "{:?} after {} iterations - Inertia: {}",
        model.termination(),
        model.iterations(),
        model.inertia()
    );
    for (idx, center) in model.centers().outer_iter().enumerate() {
        println!("center {}: {:?}", idx, center.to_vec());
    }
    println!("labels: {:?}", model.labels());

    if let Some(dir) = &args.output {
        let path = save_model(dir, "clustering", &model)?;
        log::info!("Saved result to {}", path.display());
    }

    Ok(())
}
