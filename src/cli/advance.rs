use std::path::PathBuf;

use clap::Args;

use super::{load_snapshot, rng_from, save_snapshot};

#[derive(Args)]
pub struct AdvanceArgs {
    /// Snapshot file, rewritten in place
    pub snapshot: PathBuf,
    /// Worker threads (default: sequential)
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// RNG seed (default: entropy)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Zero every fitness after advancing
    #[arg(long)]
    pub reset_fitness: bool,
}

pub fn cmd_advance(args: AdvanceArgs) {
    let mut engine = load_snapshot(&args.snapshot);
    let mut rng = rng_from(args.seed);

    match args.workers {
        Some(workers) => engine.advance_generation_concurrently(workers, &mut rng),
        None => engine.advance_generation(&mut rng),
    }
    let best = engine.last_best_index();
    let best_fitness = engine.fitness(0);
    if args.reset_fitness {
        engine.reset_fitness();
    }

    save_snapshot(&engine, &args.snapshot);
    eprintln!(
        "Generation {}: previous best #{} (fitness {}) now at #0",
        engine.generation(),
        best,
        best_fitness,
    );
}
