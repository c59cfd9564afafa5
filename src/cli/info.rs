use std::path::PathBuf;

use clap::Args;

use super::load_snapshot;

#[derive(Args)]
pub struct InfoArgs {
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Also list every individual's fitness
    #[arg(long)]
    pub fitness: bool,
}

pub fn cmd_info(args: InfoArgs) {
    let engine = load_snapshot(&args.snapshot);
    let params = engine.params();

    println!("generation:  {}", engine.generation());
    println!("topology:    {}", params.topology);
    println!("genes:       {}", params.topology.genome_size());
    println!("activation:  {}", params.activation);
    println!("population:  {}", engine.len());
    println!("survivors:   {}", params.survivors);
    println!("crossover:   {}", params.crossover);
    println!(
        "mutation:    {} (rate {}, magnitude {}, {} noise)",
        params.mutation, params.mutation_rate, params.mutation_magnitude, params.noise
    );

    let best = engine
        .population()
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, ind)| match best {
            Some((_, f)) if f >= ind.fitness => best,
            _ => Some((i, ind.fitness)),
        });
    if let Some((index, fitness)) = best {
        println!("best:        #{} fitness {}", index, fitness);
    }

    if args.fitness {
        for (i, ind) in engine.population().iter().enumerate() {
            println!("  {:>5}  {}", i, ind.fitness);
        }
    }
}
