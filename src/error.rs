//! Error type shared by the engine, snapshot codec, and config loader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Topology has fewer than two layers or an empty layer.
    #[error("invalid topology {0:?}: need at least 2 non-empty layers")]
    InvalidTopology(Vec<usize>),

    #[error("topology {0:?} is too large: genome size overflows usize")]
    TopologyTooLarge(Vec<usize>),

    #[error("invalid population size {requested}: must be at least the {survivors} survivors")]
    InvalidPopulationSize { requested: usize, survivors: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot bytes are malformed, truncated, or fail their checksum.
    #[error("snapshot decode failed: {0}")]
    Decode(String),

    #[error("snapshot encode failed: {0}")]
    Encode(String),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    #[error("config parse failed: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
