use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(
    name = "neurogenetic",
    version,
    about = "Evolve fixed-topology neural networks with a genetic algorithm"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a random population from a TOML config and save it
    Init(cli::init::InitArgs),
    /// Summarize a saved population
    Info(cli::info::InfoArgs),
    /// Run one individual's network on an input vector
    Query(cli::query::QueryArgs),
    /// Grow or shrink a saved population
    Resize(cli::resize::ResizeArgs),
    /// Advance a saved population by one generation using its stored fitness
    Advance(cli::advance::AdvanceArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => cli::init::cmd_init(args),
        Command::Info(args) => cli::info::cmd_info(args),
        Command::Query(args) => cli::query::cmd_query(args),
        Command::Resize(args) => cli::resize::cmd_resize(args),
        Command::Advance(args) => cli::advance::cmd_advance(args),
    }
}
