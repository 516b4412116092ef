use std::{path::PathBuf, time::Duration};

use ::log::{LevelFilter, info, warn};
use anyhow::anyhow;
use spseg::{
    algorithm::{IterativeAlgorithm, TerminatingIterativeAlgorithm},
    column_generation::ColumnGeneration,
    config::{ColumnGenerationConfig, ConnectivityMode, PricingStrategy},
    errors::InvariantCheck,
    graph::*,
    io::{Instance, SegmentationWriter},
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    name = "segment_solver",
    about = "Partitions a superpixel graph into connected segments around master nodes"
)]
struct Opts {
    /// Instance file; read from stdin if omitted
    #[structopt(short = "i", long, parse(from_os_str))]
    input: Option<PathBuf>,

    /// Solution file; written to stdout if omitted
    #[structopt(short = "o", long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// JSON file with a (partial) solver configuration
    #[structopt(short = "c", long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Solve the built-in twelve node instance instead of reading one
    #[structopt(long)]
    demo: bool,

    /// heuristic-then-exact | exact-only
    #[structopt(long)]
    strategy: Option<PricingStrategy>,

    /// cuts | flow | flow-and-cuts
    #[structopt(long)]
    connectivity: Option<ConnectivityMode>,

    #[structopt(long)]
    max_rounds: Option<usize>,

    /// Time budget of the pricing phase in seconds
    #[structopt(short = "T", long)]
    timeout: Option<f64>,

    /// Threads per LP/MIP solve
    #[structopt(long)]
    threads: Option<usize>,

    /// Print the solve statistics as JSON to stderr
    #[structopt(short = "s", long)]
    statistics: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn load_instance(opts: &Opts) -> anyhow::Result<Instance> {
    if opts.demo {
        let (graph, masters) = demo_instance();
        return Ok(Instance { graph, masters });
    }

    if let Some(path) = &opts.input {
        Ok(Instance::try_read_file(path)?)
    } else {
        let stdin = std::io::stdin().lock();
        Ok(Instance::try_read(stdin)?)
    }
}

fn load_config(opts: &Opts) -> anyhow::Result<ColumnGenerationConfig> {
    let mut config = match &opts.config {
        Some(path) => ColumnGenerationConfig::try_read_json_file(path)?,
        None => ColumnGenerationConfig::default(),
    };

    if let Some(strategy) = opts.strategy {
        config.strategy = strategy;
    }
    if let Some(connectivity) = opts.connectivity {
        config.connectivity = connectivity;
    }
    if opts.max_rounds.is_some() {
        config.max_rounds = opts.max_rounds;
    }
    if let Some(threads) = opts.threads {
        config.solver.threads = threads;
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::from_args();
    spseg::log::build_logger_for_verbosity(LevelFilter::Warn, opts.verbose);

    let Instance { graph, masters } = load_instance(&opts)?;
    let config = load_config(&opts)?;
    info!(
        "Read instance with n={} m={} and {} master nodes",
        graph.number_of_nodes(),
        graph.number_of_edges(),
        masters.len()
    );

    let mut algo: ColumnGeneration =
        ColumnGeneration::new(&graph, &masters, masters.len(), config)?;

    if let Some(seconds) = opts.timeout {
        algo.run_until_timeout(Duration::from_secs_f64(seconds))?;
        if !algo.is_completed() {
            warn!("Timeout of {seconds}s reached; solving the integral master");
            algo.stop_pricing();
        }
    }

    let result = algo
        .run_to_completion()?
        .ok_or_else(|| anyhow!("column generation ended without a solution"))?;

    result.segmentation.is_correct(&graph)?;
    info!(
        "Found segmentation of cost {} (lp bound {})",
        result.statistics.integral_cost, result.statistics.lp_bound
    );

    if let Some(path) = &opts.output {
        result.segmentation.try_write_segmentation_file(path)?;
    } else {
        let stdout = std::io::stdout().lock();
        result.segmentation.try_write_segmentation(stdout)?;
    }

    if opts.statistics {
        eprintln!("{}", serde_json::to_string_pretty(&result.statistics)?);
    }

    Ok(())
}
