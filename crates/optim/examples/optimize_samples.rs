use clap::Parser;

use srombox_optim::{optimize_sizes, Algorithm, OptimConfig, OptimStrategy, SromParams};
use srombox_srom::{postprocess::CDF_GRID_PTS, Postprocessor, SromSeries};
use srombox_target::{RandomVector, SampleRandomVector};
use std::path::Path;

/// Optimizes SROMs of several sizes matching samples read from a table file
/// (one row per sample, one column per dimension) and saves their parameters.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Table of target samples
    samples: String,
    /// SROM sizes
    #[arg(short, long, value_delimiter = ',', default_value = "10")]
    sizes: Vec<usize>,
    #[arg(short, long, default_value = "./srom_results")]
    outdir: String,
    /// Weights of moment, CDF and correlation errors
    #[arg(short, long, value_delimiter = ',', default_value = "1,1,1")]
    weights: Vec<f64>,
    /// Error metric: sse, mean or max
    #[arg(short, long, default_value = "sse")]
    error: String,
    #[arg(long, default_value_t = 5)]
    max_moment: usize,
    #[arg(short = 'n', long, default_value_t = 1)]
    n_tries: usize,
    /// Number of random sample sets tested, probabilities only are optimized when given
    #[arg(long)]
    n_test_samples: Option<usize>,
    /// Use COBYLA instead of SLSQP
    #[arg(long)]
    cobyla: bool,
    #[arg(long)]
    seed: Option<u64>,
}

fn report(series: &SromSeries, target: &dyn RandomVector, max_moment: usize) -> anyhow::Result<()> {
    let cdfs = Postprocessor::compare_srom_cdfs(series, target, CDF_GRID_PTS)?;
    for ((size, srom), (_, srom_cdfs)) in series.iter().zip(cdfs.srom_cdfs.iter()) {
        let post = Postprocessor::new(srom, target)?;
        let moments = post.compare_moments(max_moment)?;
        let cdf_error = (srom_cdfs - &cdfs.target_cdfs)
            .iter()
            .fold(0., |acc: f64, v| acc.max(v.abs()));
        println!(
            "SROM m={size}: max moment relative error = {:.3e}, max CDF error = {:.3e}",
            moments.max_error(),
            cdf_error
        );
        if target.dim() > 1 {
            let correlations = post.compare_correlations()?;
            println!("  max correlation error = {:.3e}", correlations.max_error());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::new().filter_or("SROMBOX_LOG", "info");
    let mut builder = env_logger::Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let args = Args::parse();
    let target = SampleRandomVector::from_file(Path::new(&args.samples))?;
    println!(
        "Target: {} samples of dimension {}",
        target.size(),
        target.dim()
    );

    let mut config = OptimConfig::default()
        .n_tries(args.n_tries)
        .outdir(args.outdir.clone())
        .objective(
            SromParams::new()
                .obj_weights(&args.weights)
                .error(&args.error)
                .max_moment(args.max_moment),
        );
    if args.cobyla {
        config = config.algorithm(Algorithm::Cobyla);
    }
    if let Some(n_test_samples) = args.n_test_samples {
        let strategy = OptimStrategy::SequentialSampling { n_test_samples };
        config = config.strategy(strategy);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    let (series, results) = optimize_sizes(&target, &args.sizes, &config)?;
    for (size, res) in args.sizes.iter().zip(results.iter()) {
        println!(
            "SROM m={size}: objective = {:.6e}, converged = {} ({})",
            res.objective, res.converged, res.status
        );
    }
    report(&series, &target, args.max_moment)?;
    println!("SROM parameters saved in {}", args.outdir);
    Ok(())
}
