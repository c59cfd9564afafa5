use std::path::PathBuf;
use std::process;

use clap::Args;

use neurogenetic::EngineConfig;

use super::save_snapshot;

#[derive(Args)]
pub struct InitArgs {
    /// TOML engine configuration
    #[arg(short, long)]
    pub config: PathBuf,
    /// Snapshot file to write
    #[arg(short, long)]
    pub out: PathBuf,
    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

pub fn cmd_init(args: InitArgs) {
    let config = match EngineConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: '{}': {}", args.config.display(), e);
            process::exit(1);
        }
    };

    if args.out.exists() && !args.force {
        eprintln!(
            "error: '{}' already exists (use --force to overwrite)",
            args.out.display()
        );
        process::exit(1);
    }

    let mut rng = config.rng();
    let engine = match config.build(&mut rng) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    save_snapshot(&engine, &args.out);
    eprintln!(
        "Created population of {} ({} survivors), topology {}, {} genes each",
        engine.len(),
        engine.survivors(),
        config.topology,
        config.topology.genome_size(),
    );
}
