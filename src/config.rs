//! Engine configuration loaded from TOML.
//!
//! ```toml
//! topology = [2, 3, 1]
//! activation = "tanh"
//! population = 20
//! survivors = 5
//! mutation_rate = 0.1
//! mutation_magnitude = 0.5
//! mutation = "single-gene"
//! crossover = "division-point"
//! noise = "gaussian"
//! seed = 42
//! ```

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::engine::{Engine, EvolutionParams};
use crate::error::{Error, Result};
use crate::genome::Topology;
use crate::operators::{Crossover, Mutation, Noise};

fn default_mutation_rate() -> f64 {
    0.1
}

fn default_mutation_magnitude() -> f64 {
    0.5
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub topology: Topology,
    #[serde(default)]
    pub activation: Activation,
    pub population: usize,
    pub survivors: usize,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_mutation_magnitude")]
    pub mutation_magnitude: f64,
    #[serde(default)]
    pub mutation: Mutation,
    #[serde(default)]
    pub crossover: Crossover,
    #[serde(default)]
    pub noise: Noise,
    /// Fixed RNG seed; entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Same checks the engine applies at construction.
    pub fn validate(&self) -> Result<()> {
        self.params().validate(self.population)
    }

    /// Evolution parameters described by this config.
    pub fn params(&self) -> EvolutionParams {
        EvolutionParams {
            topology: self.topology.clone(),
            activation: self.activation,
            survivors: self.survivors,
            mutation_rate: self.mutation_rate,
            mutation_magnitude: self.mutation_magnitude,
            mutation: self.mutation,
            crossover: self.crossover,
            noise: self.noise,
        }
    }

    /// Seeded RNG when `seed` is set, otherwise one seeded from entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Fresh randomized engine for this config.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Engine> {
        Engine::new(self.params(), self.population, rng)
    }
}
