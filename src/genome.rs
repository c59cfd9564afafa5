//! Genome layout and the feed-forward network it encodes.
//!
//! A genome is a flat `f64` vector. For each layer `l >= 1`, in order, and
//! for each neuron `o` of that layer, it holds one bias followed by
//! `size(l - 1)` incoming weights. Offsets are therefore comparable across
//! any two genomes of the same topology, which is what position-based
//! crossover relies on.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{Error, Result};

/// Number of genes for a layer-size list: Σ size(l) * (size(l-1) + 1).
///
/// Returns 0 for fewer than two layers. Panics on overflow; use
/// [`checked_genome_size`] for untrusted layer sizes.
pub fn genome_size(layers: &[usize]) -> usize {
    layers.windows(2).map(|w| w[1] * (w[0] + 1)).sum()
}

/// [`genome_size`], or `None` if the count does not fit in `usize`.
pub fn checked_genome_size(layers: &[usize]) -> Option<usize> {
    layers.windows(2).try_fold(0usize, |total, w| {
        w[0].checked_add(1)
            .and_then(|fan_in| w[1].checked_mul(fan_in))
            .and_then(|genes| total.checked_add(genes))
    })
}

/// Validated network shape: at least two layers, none empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Topology {
    layers: Vec<usize>,
}

impl Topology {
    /// Validate a layer-size list, input layer first.
    pub fn new(layers: Vec<usize>) -> Result<Self> {
        if layers.len() < 2 || layers.contains(&0) {
            return Err(Error::InvalidTopology(layers));
        }
        if checked_genome_size(&layers).is_none() {
            return Err(Error::TopologyTooLarge(layers));
        }
        Ok(Self { layers })
    }

    /// Layer sizes, input layer first.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Width of the input layer.
    pub fn inputs(&self) -> usize {
        self.layers[0]
    }

    /// Width of the output layer.
    pub fn outputs(&self) -> usize {
        self.layers[self.layers.len() - 1]
    }

    /// Genes per individual. Cannot overflow once constructed.
    pub fn genome_size(&self) -> usize {
        genome_size(&self.layers)
    }

    /// Widest layer; sizes the evaluation scratch buffers.
    pub fn max_width(&self) -> usize {
        self.layers.iter().copied().max().unwrap_or(0)
    }
}

impl TryFrom<Vec<usize>> for Topology {
    type Error = Error;

    fn try_from(layers: Vec<usize>) -> Result<Self> {
        Topology::new(layers)
    }
}

impl From<Topology> for Vec<usize> {
    fn from(t: Topology) -> Self {
        t.layers
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.layers.iter().map(|l| l.to_string()).collect();
        f.write_str(&parts.join("-"))
    }
}

impl FromStr for Topology {
    type Err = Error;

    /// Parses `2-3-1` or `2,3,1`.
    fn from_str(s: &str) -> Result<Self> {
        let layers = s
            .split(|c| c == '-' || c == ',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidConfig(format!("topology '{}': {}", s, e)))?;
        Topology::new(layers)
    }
}

/// Ping-pong buffers reused across evaluations.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    front: Vec<f64>,
    back: Vec<f64>,
}

impl Scratch {
    /// Buffers pre-sized for layers up to `width` neurons.
    pub fn new(width: usize) -> Self {
        Self {
            front: Vec::with_capacity(width),
            back: Vec::with_capacity(width),
        }
    }
}

/// Decode `genome` as a network over `layers` and run it on `input`.
///
/// Panics if `input.len() != layers[0]` or the genome is shorter than
/// `genome_size(layers)`.
pub fn evaluate(genome: &[f64], layers: &[usize], activation: Activation, input: &[f64]) -> Vec<f64> {
    let mut scratch = Scratch::default();
    evaluate_with(&mut scratch, genome, layers, activation, input).to_vec()
}

/// Same as [`evaluate`], writing through `scratch`. The returned slice is
/// the final layer and lives until the next call.
pub fn evaluate_with<'s>(
    scratch: &'s mut Scratch,
    genome: &[f64],
    layers: &[usize],
    activation: Activation,
    input: &[f64],
) -> &'s [f64] {
    assert_eq!(
        input.len(),
        layers[0],
        "input width {} does not match topology input {}",
        input.len(),
        layers[0]
    );
    assert!(
        genome.len() >= genome_size(layers),
        "genome of {} genes is too short for topology",
        genome.len()
    );

    scratch.front.clear();
    scratch.front.extend_from_slice(input);

    let mut offset = 0;
    for l in 1..layers.len() {
        let fan_in = layers[l - 1];
        scratch.back.clear();
        for _ in 0..layers[l] {
            let bias = genome[offset];
            let weights = &genome[offset + 1..offset + 1 + fan_in];
            offset += fan_in + 1;

            let sum = scratch
                .front
                .iter()
                .zip(weights)
                .fold(bias, |acc, (x, w)| acc + x * w);
            scratch.back.push(activation.apply(sum));
        }
        // this layer's output feeds the next one
        std::mem::swap(&mut scratch.front, &mut scratch.back);
    }

    &scratch.front
}

/// One member of the population.
#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
    pub genome: Vec<f64>,
    pub fitness: f64,
}

impl Individual {
    /// All-zero genome, zero fitness.
    pub fn zeroed(genome_len: usize) -> Self {
        Self {
            genome: vec![0.0; genome_len],
            fitness: 0.0,
        }
    }

    /// Fresh individual with a randomized genome and zero fitness.
    pub fn random<R: Rng + ?Sized>(genome_len: usize, rng: &mut R) -> Self {
        let mut ind = Self::zeroed(genome_len);
        ind.randomize(rng);
        ind
    }

    /// Every gene uniform in `[-1, 1)`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for gene in self.genome.iter_mut() {
            *gene = rng.gen::<f64>() * 2.0 - 1.0;
        }
    }
}
