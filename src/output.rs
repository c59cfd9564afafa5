//! Network output queries for individuals of an [`Engine`].

use rayon::prelude::*;

use crate::engine::Engine;
use crate::genome::{evaluate, evaluate_with, Scratch};

impl Engine {
    /// Final-layer output of individual `index` on `input`.
    pub fn output(&self, index: usize, input: &[f64]) -> Vec<f64> {
        let params = self.params();
        evaluate(
            self.genome(index),
            params.topology.layers(),
            params.activation,
            input,
        )
    }

    /// Largest output and its position. First maximum wins ties.
    pub fn max_output(&self, index: usize, input: &[f64]) -> (f64, usize) {
        extreme(&self.output(index, input), |best, v| best < v)
    }

    /// Smallest output and its position. First minimum wins ties.
    pub fn min_output(&self, index: usize, input: &[f64]) -> (f64, usize) {
        extreme(&self.output(index, input), |best, v| best > v)
    }

    /// Outputs of every individual on the same input, in population order.
    ///
    /// Evaluated in parallel; each rayon task reuses one scratch buffer.
    pub fn outputs(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let params = self.params();
        let layers = params.topology.layers();
        let width = params.topology.max_width();
        self.population()
            .par_iter()
            .map_init(
                || Scratch::new(width),
                |scratch, ind| {
                    evaluate_with(scratch, &ind.genome, layers, params.activation, input).to_vec()
                },
            )
            .collect()
    }
}

fn extreme(values: &[f64], replaces: impl Fn(f64, f64) -> bool) -> (f64, usize) {
    let mut index = 0;
    let mut value = values[0];
    for (i, &v) in values.iter().enumerate().skip(1) {
        if replaces(value, v) {
            index = i;
            value = v;
        }
    }
    (value, index)
}
