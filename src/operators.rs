//! Genetic operators: crossover variants, mutation variants, mutation noise.
//!
//! Every operator writes into a caller-owned child genome of the same length
//! as its parents. Nothing here allocates.

use std::fmt;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform as UniformDist};
use rand::Rng;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// How two parents combine into a child. Declaration order is the wire tag.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[serde(rename_all = "kebab-case")]
#[rkyv(derive(Debug))]
pub enum Crossover {
    /// Father prefix up to a random point, mother suffix after it.
    #[default]
    DivisionPoint,
    /// Fair coin per gene.
    Uniform,
    /// Clone of the father.
    MonoParent,
    /// `alpha * father + (1 - alpha) * mother`, one alpha per call.
    Arithmetic,
}

impl Crossover {
    pub const ALL: [Crossover; 4] = [
        Crossover::DivisionPoint,
        Crossover::Uniform,
        Crossover::MonoParent,
        Crossover::Arithmetic,
    ];

    /// Overwrite `child` with a combination of `father` and `mother`.
    pub fn apply<R: Rng + ?Sized>(self, child: &mut [f64], father: &[f64], mother: &[f64], rng: &mut R) {
        match self {
            Crossover::DivisionPoint => division_point(child, father, mother, rng),
            Crossover::Uniform => uniform(child, father, mother, rng),
            Crossover::MonoParent => mono_parent(child, father),
            Crossover::Arithmetic => arithmetic(child, father, mother, rng),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Crossover::DivisionPoint => "division-point",
            Crossover::Uniform => "uniform",
            Crossover::MonoParent => "mono-parent",
            Crossover::Arithmetic => "arithmetic",
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Crossover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crossover::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown crossover '{}'", s))
    }
}

/// Copy the father verbatim; the mother is ignored.
pub fn mono_parent(child: &mut [f64], father: &[f64]) {
    child.copy_from_slice(father);
}

/// `child[..point]` from the father, `child[point..]` from the mother.
/// `point` must be in `0..=child.len()`.
pub fn division_point_at(child: &mut [f64], father: &[f64], mother: &[f64], point: usize) {
    child[..point].copy_from_slice(&father[..point]);
    child[point..].copy_from_slice(&mother[point..]);
}

/// [`division_point_at`] with `point` drawn uniformly from `0..len`.
pub fn division_point<R: Rng + ?Sized>(child: &mut [f64], father: &[f64], mother: &[f64], rng: &mut R) {
    if child.is_empty() {
        return;
    }
    let point = rng.gen_range(0..child.len());
    division_point_at(child, father, mother, point);
}

/// `child = alpha * father + (1 - alpha) * mother`, gene by gene.
pub fn arithmetic_with(child: &mut [f64], father: &[f64], mother: &[f64], alpha: f64) {
    for ((c, f), m) in child.iter_mut().zip(father).zip(mother) {
        *c = f * alpha + m * (1.0 - alpha);
    }
}

/// [`arithmetic_with`] with one `alpha` drawn uniformly from `[0, 1)` per child.
pub fn arithmetic<R: Rng + ?Sized>(child: &mut [f64], father: &[f64], mother: &[f64], rng: &mut R) {
    let alpha = rng.gen::<f64>();
    arithmetic_with(child, father, mother, alpha);
}

/// Each gene from the father or the mother with equal probability.
pub fn uniform<R: Rng + ?Sized>(child: &mut [f64], father: &[f64], mother: &[f64], rng: &mut R) {
    for ((c, f), m) in child.iter_mut().zip(father).zip(mother) {
        *c = if rng.gen_bool(0.5) { *f } else { *m };
    }
}

/// How a freshly crossed child is perturbed.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[serde(rename_all = "kebab-case")]
#[rkyv(derive(Debug))]
pub enum Mutation {
    /// At most one gene per child, with probability `rate`.
    #[default]
    SingleGene,
    /// `len` independent attempts, each with probability `rate`. Each
    /// successful attempt hits a freshly drawn random index, not the loop
    /// position, so a gene can be hit more than once and the expected number
    /// of distinct genes touched is below `rate * len`.
    AllGenes,
}

impl Mutation {
    pub const ALL: [Mutation; 2] = [Mutation::SingleGene, Mutation::AllGenes];

    /// Perturb `genome` in place.
    pub fn apply<R: Rng + ?Sized>(self, genome: &mut [f64], rate: f64, magnitude: f64, noise: Noise, rng: &mut R) {
        match self {
            Mutation::SingleGene => mutate_single_gene(genome, rate, magnitude, noise, rng),
            Mutation::AllGenes => mutate_all_genes(genome, rate, magnitude, noise, rng),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mutation::SingleGene => "single-gene",
            Mutation::AllGenes => "all-genes",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mutation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mutation::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown mutation '{}'", s))
    }
}

/// Distribution of the offset added to a mutated gene, before scaling by
/// the mutation magnitude `m`.
///
/// `Gaussian` has variance `m²`, `Uniform` has variance `m² / 3`, so the
/// same magnitude mutates noticeably harder under `Gaussian`, which also has
/// unbounded tails.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[serde(rename_all = "kebab-case")]
#[rkyv(derive(Debug))]
pub enum Noise {
    /// Standard normal offset.
    #[default]
    Gaussian,
    /// Offset uniform in `[-1, 1)`.
    Uniform,
}

impl Noise {
    pub const ALL: [Noise; 2] = [Noise::Gaussian, Noise::Uniform];

    /// One noise value scaled by `magnitude`.
    pub fn sample<R: Rng + ?Sized>(self, magnitude: f64, rng: &mut R) -> f64 {
        let unit = match self {
            Noise::Gaussian => standard_normal().sample(rng),
            Noise::Uniform => UniformDist::new(-1.0, 1.0).sample(rng),
        };
        unit * magnitude
    }

    pub fn name(self) -> &'static str {
        match self {
            Noise::Gaussian => "gaussian",
            Noise::Uniform => "uniform",
        }
    }
}

impl fmt::Display for Noise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Noise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Noise::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| format!("unknown noise '{}'", s))
    }
}

fn standard_normal() -> Normal {
    // mean 0 / std 1 is always a valid parameterisation
    match Normal::new(0.0, 1.0) {
        Ok(n) => n,
        Err(_) => unreachable!("standard normal parameters are valid"),
    }
}

fn perturb_random_gene<R: Rng + ?Sized>(genome: &mut [f64], magnitude: f64, noise: Noise, rng: &mut R) {
    let idx = rng.gen_range(0..genome.len());
    genome[idx] += noise.sample(magnitude, rng);
}

/// With probability `rate`, add noise to one randomly chosen gene.
pub fn mutate_single_gene<R: Rng + ?Sized>(genome: &mut [f64], rate: f64, magnitude: f64, noise: Noise, rng: &mut R) {
    if genome.is_empty() {
        return;
    }
    if rng.gen::<f64>() < rate {
        perturb_random_gene(genome, magnitude, noise, rng);
    }
}

/// `len` attempts, each adding noise to a random gene with probability `rate`.
pub fn mutate_all_genes<R: Rng + ?Sized>(genome: &mut [f64], rate: f64, magnitude: f64, noise: Noise, rng: &mut R) {
    for _ in 0..genome.len() {
        if rng.gen::<f64>() < rate {
            perturb_random_gene(genome, magnitude, noise, rng);
        }
    }
}
