//! Genetic evolution of fixed-topology feed-forward networks.
//!
//! Each individual's network weights live in one flat genome. The host
//! evaluates individuals through [`Engine::output`] and friends, records a
//! fitness per individual, then calls [`Engine::advance_generation`] (or its
//! concurrent twin) to keep the fittest survivors and refill the rest of the
//! population by crossover and mutation.

pub mod activation;
pub mod config;
pub mod engine;
pub mod error;
pub mod genome;
pub mod operators;
pub mod output;
pub mod selection;
pub mod snapshot;

pub use activation::Activation;
pub use config::EngineConfig;
pub use engine::{Engine, EvolutionParams};
pub use error::{Error, Result};
pub use genome::{checked_genome_size, genome_size, Individual, Topology};
pub use operators::{Crossover, Mutation, Noise};
