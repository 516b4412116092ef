use std::path::PathBuf;

use ::log::{LevelFilter, info};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use spseg::{
    graph::*,
    io::{Instance, InstanceWriter},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "random_instances",
    about = "Writes random connected superpixel instances"
)]
struct Opt {
    /// Directory the instances are written to
    #[structopt(short = "d", long, parse(from_os_str), default_value = "instances")]
    directory: PathBuf,

    #[structopt(short = "r", long, default_value = "10")]
    repeats: u32,

    /// Number of nodes of each instance
    #[structopt(short = "n", long, default_value = "50")]
    nodes: NumNodes,

    /// Probability of each additional edge on top of the spanning tree
    #[structopt(short = "p", long, default_value = "0.05")]
    probability: f64,

    /// Number of master nodes
    #[structopt(short = "k", long, default_value = "4")]
    masters: NumNodes,

    /// Standard deviation of the color noise
    #[structopt(long, default_value = "10")]
    noise: f64,

    #[structopt(short = "s", long, default_value = "1234")]
    seed: u64,

    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,
}

const PALETTE: [f64; 5] = [0.0, 60.0, 120.0, 180.0, 240.0];

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    spseg::log::build_logger_for_verbosity(LevelFilter::Warn, opt.verbose);

    anyhow::ensure!(
        opt.masters >= 1 && opt.masters <= opt.nodes,
        "number of master nodes has to be in 1..={}",
        opt.nodes
    );

    anyhow::ensure!(
        (0.0..=1.0).contains(&opt.probability),
        "edge probability has to be in [0, 1]"
    );
    anyhow::ensure!(opt.noise >= 0.0, "noise has to be nonnegative");

    std::fs::create_dir_all(&opt.directory)?;
    let mut rng = Pcg64Mcg::seed_from_u64(opt.seed);

    for i in 0..opt.repeats {
        let graph = random_connected_superpixels(
            &mut rng,
            opt.nodes,
            opt.probability,
            &PALETTE,
            opt.noise,
        );
        let masters = random_master_nodes(&mut rng, opt.nodes, opt.masters);
        let instance = Instance { graph, masters };

        let filename = opt.directory.join(format!(
            "n{:>04}_m{:>05}_k{:>02}_s{}_{i:>03}.seg",
            opt.nodes,
            instance.graph.number_of_edges(),
            opt.masters,
            opt.seed
        ));

        instance.try_write_instance_file(&filename)?;
        info!("Wrote {}", filename.display());
    }

    Ok(())
}
