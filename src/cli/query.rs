use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{load_snapshot, parse_input};

#[derive(Args)]
pub struct QueryArgs {
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Individual to evaluate
    #[arg(short, long, default_value = "0")]
    pub index: usize,
    /// Comma-separated input vector, e.g. 0.5,1,-2
    #[arg(long, allow_hyphen_values = true)]
    pub input: String,
}

pub fn cmd_query(args: QueryArgs) {
    let engine = load_snapshot(&args.snapshot);

    let input = match parse_input(&args.input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: bad input {}", e);
            process::exit(1);
        }
    };
    let expected = engine.params().topology.inputs();
    if input.len() != expected {
        eprintln!(
            "error: input has {} values, topology {} expects {}",
            input.len(),
            engine.params().topology,
            expected
        );
        process::exit(1);
    }
    if args.index >= engine.len() {
        eprintln!(
            "error: index {} out of range (population {})",
            args.index,
            engine.len()
        );
        process::exit(1);
    }

    let output = engine.output(args.index, &input);
    let (max, argmax) = engine.max_output(args.index, &input);
    let (min, argmin) = engine.min_output(args.index, &input);

    let formatted: Vec<String> = output.iter().map(|v| v.to_string()).collect();
    println!("output: [{}]", formatted.join(", "));
    println!("max:    {} at {}", max, argmax);
    println!("min:    {} at {}", min, argmin);
}
