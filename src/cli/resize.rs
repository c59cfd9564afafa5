use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{load_snapshot, rng_from, save_snapshot};

#[derive(Args)]
pub struct ResizeArgs {
    /// Snapshot file, rewritten in place
    pub snapshot: PathBuf,
    /// New population size (at least the survivor count)
    #[arg(short, long)]
    pub size: usize,
    /// Fill new slots with random genomes instead of survivor crossovers
    #[arg(long)]
    pub randomize: bool,
    /// RNG seed (default: entropy)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn cmd_resize(args: ResizeArgs) {
    let mut engine = load_snapshot(&args.snapshot);
    let before = engine.len();
    let mut rng = rng_from(args.seed);

    if let Err(e) = engine.set_population_size(args.size, args.randomize, &mut rng) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    save_snapshot(&engine, &args.snapshot);
    eprintln!("Resized population {} -> {}", before, engine.len());
}
