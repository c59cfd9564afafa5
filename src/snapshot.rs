//! Whole-engine snapshots.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! offset  size  field
//!      0     4  magic "SNGN"
//!      4     2  format version
//!      6     2  reserved (0)
//!      8     8  payload length
//!     16    32  BLAKE3 digest of the payload
//!     48     *  payload: rkyv archive of the engine body
//! ```
//!
//! A snapshot decodes into a complete [`Engine`] or into an error, never
//! into a partially built engine.

use std::path::Path;

use rkyv::rancor;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::activation::Activation;
use crate::engine::{Engine, EvolutionParams};
use crate::error::{Error, Result};
use crate::genome::{Individual, Topology};
use crate::operators::{Crossover, Mutation, Noise};

pub const MAGIC: [u8; 4] = *b"SNGN";
/// Format version written by [`encode`]; [`decode`] accepts only this one.
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 48;

/// Archived engine state. Sizes are stored as u64 so the archive does not
/// depend on the writer's pointer width.
#[derive(Archive, Serialize, Deserialize, Clone, Debug)]
#[rkyv(derive(Debug))]
struct SnapshotBody {
    layers: Vec<u64>,
    activation: Activation,
    survivors: u64,
    mutation_rate: f64,
    mutation_magnitude: f64,
    mutation: Mutation,
    crossover: Crossover,
    noise: Noise,
    generation: u64,
    genomes: Vec<Vec<f64>>,
    fitness: Vec<f64>,
}

impl SnapshotBody {
    fn from_engine(engine: &Engine) -> Self {
        let params = engine.params();
        Self {
            layers: params.topology.layers().iter().map(|&l| l as u64).collect(),
            activation: params.activation,
            survivors: params.survivors as u64,
            mutation_rate: params.mutation_rate,
            mutation_magnitude: params.mutation_magnitude,
            mutation: params.mutation,
            crossover: params.crossover,
            noise: params.noise,
            generation: engine.generation(),
            genomes: engine.population().iter().map(|i| i.genome.clone()).collect(),
            fitness: engine.population().iter().map(|i| i.fitness).collect(),
        }
    }

    fn into_engine(self) -> Result<Engine> {
        let layers = self
            .layers
            .iter()
            .map(|&l| to_usize(l, "layer size"))
            .collect::<Result<Vec<_>>>()?;
        let topology = Topology::new(layers).map_err(|e| Error::Decode(e.to_string()))?;
        if self.genomes.len() != self.fitness.len() {
            return Err(Error::Decode(format!(
                "{} genomes but {} fitness values",
                self.genomes.len(),
                self.fitness.len()
            )));
        }

        let params = EvolutionParams {
            topology,
            activation: self.activation,
            survivors: to_usize(self.survivors, "survivor count")?,
            mutation_rate: self.mutation_rate,
            mutation_magnitude: self.mutation_magnitude,
            mutation: self.mutation,
            crossover: self.crossover,
            noise: self.noise,
        };
        let population = self
            .genomes
            .into_iter()
            .zip(self.fitness)
            .map(|(genome, fitness)| Individual { genome, fitness })
            .collect();

        Engine::from_parts(params, population, self.generation).map_err(|e| Error::Decode(e.to_string()))
    }
}

fn to_usize(v: u64, what: &str) -> Result<usize> {
    usize::try_from(v).map_err(|_| Error::Decode(format!("{} {} does not fit in usize", what, v)))
}

/// Serialize the entire engine into one blob.
pub fn encode(engine: &Engine) -> Result<Vec<u8>> {
    let body = SnapshotBody::from_engine(engine);
    let payload = rkyv::to_bytes::<rancor::Error>(&body).map_err(|e| Error::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(blake3::hash(&payload).as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Rebuild an engine from a blob produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Engine> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Decode(format!(
            "truncated header: {} of {} bytes",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::Decode("bad magic".into()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[8..16]);
    let declared = u64::from_le_bytes(len_bytes);
    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != declared {
        return Err(Error::Decode(format!(
            "payload is {} bytes, header declares {}",
            payload.len(),
            declared
        )));
    }
    if blake3::hash(payload).as_bytes()[..] != bytes[16..HEADER_LEN] {
        return Err(Error::Decode("checksum mismatch".into()));
    }

    // rkyv needs the archive aligned; the payload sits at an arbitrary offset
    let mut aligned = AlignedVec::<16>::with_capacity(payload.len());
    aligned.extend_from_slice(payload);
    let body = rkyv::from_bytes::<SnapshotBody, rancor::Error>(&aligned)
        .map_err(|e| Error::Decode(e.to_string()))?;
    body.into_engine()
}

/// Encode `engine` to `path`, creating parent directories.
pub fn save(engine: &Engine, path: &Path) -> Result<()> {
    let bytes = encode(engine)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        generation = engine.generation(),
        "saved snapshot"
    );
    Ok(())
}

/// Read and decode a snapshot file.
pub fn load(path: &Path) -> Result<Engine> {
    let bytes = std::fs::read(path)?;
    let engine = decode(&bytes)?;
    info!(
        path = %path.display(),
        generation = engine.generation(),
        population = engine.len(),
        "loaded snapshot"
    );
    Ok(engine)
}
