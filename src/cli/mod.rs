pub mod advance;
pub mod info;
pub mod init;
pub mod query;
pub mod resize;

use std::path::Path;
use std::process;

use rand::rngs::StdRng;
use rand::SeedableRng;

use neurogenetic::{snapshot, Engine};

pub fn load_snapshot(path: &Path) -> Engine {
    match snapshot::load(path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: cannot load '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

pub fn save_snapshot(engine: &Engine, path: &Path) {
    if let Err(e) = snapshot::save(engine, path) {
        eprintln!("error: cannot save '{}': {}", path.display(), e);
        process::exit(1);
    }
}

pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Parse `0.5,1,-2` into a vector.
pub fn parse_input(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|e| format!("'{}': {}", part, e))
        })
        .collect()
}
