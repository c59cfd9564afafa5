//! The evolutionary engine: owns the population and advances generations.
//!
//! A generation is rank, then regenerate every slot in
//! `[survivors, len)` by crossover of two survivors followed by mutation of
//! the fresh child. Survivors are only ever read during regeneration and
//! each non-survivor slot is written by exactly one breeder; the concurrent
//! path hands out those slots as exclusive `&mut` borrows.

use std::ops::Range;
use std::thread;

use crossbeam::channel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::genome::{Individual, Topology};
use crate::operators::{Crossover, Mutation, Noise};
use crate::selection::{rank, select_parents};

/// Algorithm parameters, fixed for the engine's lifetime unless changed
/// through the engine's setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    pub topology: Topology,
    pub activation: Activation,
    pub survivors: usize,
    /// Probability of each mutation attempt, in `[0, 1]`.
    pub mutation_rate: f64,
    /// Scale applied to the mutation noise.
    pub mutation_magnitude: f64,
    pub mutation: Mutation,
    pub crossover: Crossover,
    pub noise: Noise,
}

impl EvolutionParams {
    /// Defaults for everything but the shape and survivor count.
    pub fn new(topology: Topology, survivors: usize) -> Self {
        Self {
            topology,
            activation: Activation::default(),
            survivors,
            mutation_rate: 0.1,
            mutation_magnitude: 0.5,
            mutation: Mutation::default(),
            crossover: Crossover::default(),
            noise: Noise::default(),
        }
    }

    /// Check survivor count, rate and magnitude against a population size.
    pub fn validate(&self, population_size: usize) -> Result<()> {
        if self.survivors == 0 {
            return Err(Error::InvalidConfig("survivors must be at least 1".into()));
        }
        if population_size < self.survivors {
            return Err(Error::InvalidPopulationSize {
                requested: population_size,
                survivors: self.survivors,
            });
        }
        check_rate(self.mutation_rate)?;
        check_magnitude(self.mutation_magnitude)?;
        Ok(())
    }
}

fn check_rate(rate: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(Error::InvalidConfig(format!(
            "mutation rate {} is outside [0, 1]",
            rate
        )));
    }
    Ok(())
}

fn check_magnitude(magnitude: f64) -> Result<()> {
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "mutation magnitude {} must be finite and non-negative",
            magnitude
        )));
    }
    Ok(())
}

/// Population under evolution plus its parameters and generation counter.
#[derive(Clone, Debug)]
pub struct Engine {
    params: EvolutionParams,
    population: Vec<Individual>,
    generation: u64,
    last_best: usize,
}

impl Engine {
    /// Build a freshly randomized population.
    pub fn new<R: Rng + ?Sized>(params: EvolutionParams, population_size: usize, rng: &mut R) -> Result<Self> {
        params.validate(population_size)?;
        let genome_len = params.topology.genome_size();
        let population = (0..population_size)
            .map(|_| Individual::random(genome_len, rng))
            .collect();
        debug!(
            topology = %params.topology,
            population = population_size,
            genome_len,
            "created engine"
        );
        Ok(Self {
            params,
            population,
            generation: 0,
            last_best: 0,
        })
    }

    /// Reassemble an engine from stored parts, checking they agree.
    pub fn from_parts(params: EvolutionParams, population: Vec<Individual>, generation: u64) -> Result<Self> {
        params.validate(population.len())?;
        let genome_len = params.topology.genome_size();
        if let Some((i, ind)) = population
            .iter()
            .enumerate()
            .find(|(_, ind)| ind.genome.len() != genome_len)
        {
            return Err(Error::InvalidConfig(format!(
                "individual {} has {} genes, topology {} needs {}",
                i,
                ind.genome.len(),
                params.topology,
                genome_len
            )));
        }
        Ok(Self {
            params,
            population,
            generation,
            last_best: 0,
        })
    }

    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    /// Generations advanced so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Where the fittest individual sat right before the last ranking. After
    /// that ranking it is at index 0.
    pub fn last_best_index(&self) -> usize {
        self.last_best
    }

    /// Number of top-ranked slots kept each generation.
    pub fn survivors(&self) -> usize {
        self.params.survivors
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    /// The whole population in slot order.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn individual(&self, index: usize) -> &Individual {
        &self.population[index]
    }

    /// Genome of slot `index`. Panics if out of range.
    pub fn genome(&self, index: usize) -> &[f64] {
        &self.population[index].genome
    }

    /// Sort the survivor prefix and record the pre-ranking best index.
    pub fn rank(&mut self) {
        self.last_best = rank(&mut self.population, self.params.survivors);
    }

    /// Advance one generation on the calling thread.
    pub fn advance_generation<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.generation += 1;
        self.rank();

        let params = &self.params;
        let (survivors, offspring) = self.population.split_at_mut(params.survivors);
        for child in offspring.iter_mut() {
            breed(params, survivors, child, rng);
        }

        self.log_generation();
    }

    /// Advance one generation with `workers` threads draining a bounded
    /// queue of non-survivor slots.
    ///
    /// Each worker gets its own RNG seeded from `rng`, so results are
    /// reproducible only in distribution, not bit for bit.
    pub fn advance_generation_concurrently<R: Rng + ?Sized>(&mut self, workers: usize, rng: &mut R) {
        let workers = if workers == 0 {
            warn!("worker count 0 requested, using 1");
            1
        } else {
            workers
        };

        self.generation += 1;
        self.rank();

        let params = &self.params;
        let (survivors, offspring) = self.population.split_at_mut(params.survivors);
        let survivors: &[Individual] = survivors;
        let expected = offspring.len();
        let seeds: Vec<u64> = (0..workers).map(|_| rng.gen()).collect();

        let (tx, rx) = channel::bounded::<&mut Individual>(workers);
        let bred: usize = thread::scope(|s| {
            let handles: Vec<_> = seeds
                .into_iter()
                .map(|seed| {
                    let rx = rx.clone();
                    s.spawn(move || {
                        let mut rng = StdRng::seed_from_u64(seed);
                        let mut count = 0usize;
                        for child in rx.iter() {
                            breed(params, survivors, child, &mut rng);
                            count += 1;
                        }
                        count
                    })
                })
                .collect();
            drop(rx);

            for child in offspring.iter_mut() {
                // only fails when every worker is gone, i.e. one panicked
                if tx.send(child).is_err() {
                    break;
                }
            }
            drop(tx);

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .sum()
        });
        debug_assert_eq!(bred, expected);
        debug!(workers, bred, "concurrent regeneration finished");

        self.log_generation();
    }

    fn log_generation(&self) {
        debug!(
            generation = self.generation,
            best_fitness = self.population[0].fitness,
            last_best = self.last_best,
            regenerated = self.population.len() - self.params.survivors,
            "advanced generation"
        );
    }

    /// Grow or shrink the population after ranking it.
    ///
    /// New slots are either random or one crossover of two survivors; they
    /// are not mutated. Shrinking keeps the first `new_size` ranked slots.
    pub fn set_population_size<R: Rng + ?Sized>(
        &mut self,
        new_size: usize,
        randomize: bool,
        rng: &mut R,
    ) -> Result<()> {
        if new_size < self.params.survivors {
            return Err(Error::InvalidPopulationSize {
                requested: new_size,
                survivors: self.params.survivors,
            });
        }
        self.rank();

        let old_size = self.population.len();
        if new_size > old_size {
            let genome_len = self.params.topology.genome_size();
            self.population.reserve(new_size - old_size);
            for _ in old_size..new_size {
                let mut ind = Individual::zeroed(genome_len);
                if randomize {
                    ind.randomize(rng);
                } else {
                    let survivors = &self.population[..self.params.survivors];
                    let (father, mother) = select_parents(survivors.len(), rng);
                    self.params.crossover.apply(
                        &mut ind.genome,
                        &survivors[father].genome,
                        &survivors[mother].genome,
                        rng,
                    );
                }
                self.population.push(ind);
            }
        } else {
            self.population.truncate(new_size);
        }

        info!(from = old_size, to = new_size, randomize, "resized population");
        Ok(())
    }

    /// Re-randomize the genomes in `range`. Fitness is left alone.
    pub fn randomize<R: Rng + ?Sized>(&mut self, range: Range<usize>, rng: &mut R) {
        for ind in &mut self.population[range] {
            ind.randomize(rng);
        }
    }

    /// Re-randomize every genome, survivors included.
    pub fn randomize_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let len = self.population.len();
        self.randomize(0..len, rng);
    }

    // Fitness accessors. Out-of-range indices panic.

    pub fn fitness(&self, index: usize) -> f64 {
        self.population[index].fitness
    }

    pub fn set_fitness(&mut self, index: usize, fitness: f64) {
        self.population[index].fitness = fitness;
    }

    /// Accumulate into the fitness of slot `index`.
    pub fn add_fitness(&mut self, index: usize, fitness: f64) {
        self.population[index].fitness += fitness;
    }

    /// Zero every fitness value.
    pub fn reset_fitness(&mut self) {
        for ind in &mut self.population {
            ind.fitness = 0.0;
        }
    }

    /// Change the survivor count; must stay within `1..=len`.
    pub fn set_survivors(&mut self, survivors: usize) -> Result<()> {
        if survivors == 0 || survivors > self.population.len() {
            return Err(Error::InvalidConfig(format!(
                "survivors {} must be in 1..={}",
                survivors,
                self.population.len()
            )));
        }
        self.params.survivors = survivors;
        Ok(())
    }

    /// Change the mutation probability; must be in `[0, 1]`.
    pub fn set_mutation_rate(&mut self, rate: f64) -> Result<()> {
        check_rate(rate)?;
        self.params.mutation_rate = rate;
        Ok(())
    }

    /// Change the noise scale; must be finite and non-negative.
    pub fn set_mutation_magnitude(&mut self, magnitude: f64) -> Result<()> {
        check_magnitude(magnitude)?;
        self.params.mutation_magnitude = magnitude;
        Ok(())
    }

    /// Switch the mutation operator for later generations.
    pub fn set_mutation(&mut self, mutation: Mutation) {
        self.params.mutation = mutation;
    }

    /// Switch the crossover operator for later generations and resizes.
    pub fn set_crossover(&mut self, crossover: Crossover) {
        self.params.crossover = crossover;
    }

    /// Switch the mutation noise distribution.
    pub fn set_noise(&mut self, noise: Noise) {
        self.params.noise = noise;
    }
}

/// Overwrite `child` with a crossed and mutated offspring of two survivors.
fn breed<R: Rng + ?Sized>(params: &EvolutionParams, survivors: &[Individual], child: &mut Individual, rng: &mut R) {
    let (father, mother) = select_parents(survivors.len(), rng);
    params.crossover.apply(
        &mut child.genome,
        &survivors[father].genome,
        &survivors[mother].genome,
        rng,
    );
    params.mutation.apply(
        &mut child.genome,
        params.mutation_rate,
        params.mutation_magnitude,
        params.noise,
        rng,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(survivors: usize) -> EvolutionParams {
        EvolutionParams::new(Topology::new(vec![2, 3, 1]).unwrap(), survivors)
    }

    fn engine(size: usize, survivors: usize, seed: u64) -> (Engine, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let engine = Engine::new(params(survivors), size, &mut rng).unwrap();
        (engine, rng)
    }

    #[test]
    fn new_engine_is_randomized() {
        let (engine, _) = engine(10, 3, 1);
        assert_eq!(engine.len(), 10);
        assert_eq!(engine.generation(), 0);
        assert!(engine.population().iter().all(|ind| ind.genome.len() == 13));
        assert!(engine.population().iter().all(|ind| ind.fitness == 0.0));
        assert_ne!(engine.genome(0), engine.genome(1));
    }

    #[test]
    fn rejects_bad_params() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Engine::new(params(0), 5, &mut rng).is_err());
        assert!(matches!(
            Engine::new(params(6), 5, &mut rng),
            Err(Error::InvalidPopulationSize { requested: 5, survivors: 6 })
        ));
        let mut p = params(2);
        p.mutation_rate = 1.5;
        assert!(Engine::new(p, 5, &mut rng).is_err());
        let mut p = params(2);
        p.mutation_magnitude = f64::NAN;
        assert!(Engine::new(p, 5, &mut rng).is_err());
    }

    #[test]
    fn rank_records_last_best() {
        let (mut engine, _) = engine(8, 3, 2);
        for i in 0..8 {
            engine.set_fitness(i, [2.0, 5.0, 1.0, 9.0, 0.0, 3.0, 7.0, 4.0][i]);
        }
        let best_genome = engine.genome(3).to_vec();
        engine.rank();
        assert_eq!(engine.last_best_index(), 3);
        assert_eq!(engine.genome(0), best_genome.as_slice());
        assert_eq!(engine.fitness(0), 9.0);
        assert_eq!(engine.fitness(1), 7.0);
        assert_eq!(engine.fitness(2), 5.0);
    }

    #[test]
    fn advance_keeps_survivors_and_replaces_the_rest() {
        let (mut engine, mut rng) = engine(12, 4, 3);
        for i in 0..12 {
            engine.set_fitness(i, i as f64);
        }
        let before: Vec<Vec<f64>> = engine.population().iter().map(|i| i.genome.clone()).collect();
        engine.advance_generation(&mut rng);

        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.last_best_index(), 11);
        for (pos, orig) in [11, 10, 9, 8].into_iter().enumerate() {
            assert_eq!(engine.genome(pos), before[orig].as_slice());
        }
    }

    #[test]
    fn mono_parent_children_copy_survivors() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = params(2);
        p.crossover = Crossover::MonoParent;
        p.mutation_rate = 0.0;
        let mut engine = Engine::new(p, 6, &mut rng).unwrap();
        engine.set_fitness(5, 1.0);
        engine.advance_generation(&mut rng);
        for i in 2..6 {
            let g = engine.genome(i);
            assert!(g == engine.genome(0) || g == engine.genome(1));
        }
    }

    #[test]
    fn concurrent_advance_fills_every_slot() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = params(3);
        p.crossover = Crossover::MonoParent;
        p.mutation_rate = 0.0;
        let mut engine = Engine::new(p, 40, &mut rng).unwrap();
        for i in 0..40 {
            engine.set_fitness(i, -(i as f64));
        }
        let survivors: Vec<Vec<f64>> = (0..3).map(|i| engine.genome(i).to_vec()).collect();
        engine.advance_generation_concurrently(4, &mut rng);

        assert_eq!(engine.generation(), 1);
        for i in 0..3 {
            assert_eq!(engine.genome(i), survivors[i].as_slice());
        }
        for i in 3..40 {
            assert!(survivors.iter().any(|s| s.as_slice() == engine.genome(i)));
        }
    }

    #[test]
    fn zero_workers_still_advances() {
        let (mut engine, mut rng) = engine(10, 2, 6);
        engine.advance_generation_concurrently(0, &mut rng);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn resize_below_survivors_fails_without_change() {
        let (mut engine, mut rng) = engine(10, 4, 7);
        engine.set_fitness(9, 3.0);
        let before = engine.population().to_vec();
        let err = engine.set_population_size(3, true, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidPopulationSize { requested: 3, survivors: 4 }));
        assert_eq!(engine.population(), before.as_slice());
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let (mut engine, mut rng) = engine(6, 2, 8);
        engine.set_fitness(4, 10.0);
        let best = engine.genome(4).to_vec();

        engine.set_population_size(9, true, &mut rng).unwrap();
        assert_eq!(engine.len(), 9);
        assert_eq!(engine.genome(0), best.as_slice());
        assert!(engine.population()[6..].iter().all(|i| i.fitness == 0.0));

        engine.set_population_size(3, false, &mut rng).unwrap();
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.genome(0), best.as_slice());
    }

    #[test]
    fn grown_individuals_are_unmutated_crossovers() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = params(1);
        p.crossover = Crossover::MonoParent;
        p.mutation_rate = 1.0;
        let mut engine = Engine::new(p, 4, &mut rng).unwrap();
        engine.set_population_size(8, false, &mut rng).unwrap();
        for i in 4..8 {
            assert_eq!(engine.genome(i), engine.genome(0));
        }
    }

    #[test]
    fn grown_individuals_honour_arithmetic_crossover() {
        // survivor 0 holds g, survivor 1 holds -2g at offset g, so any blend
        // is k * g with k in [-2, 1]; a division-point child would not be
        let mut p = params(2);
        p.crossover = Crossover::Arithmetic;
        p.mutation_rate = 1.0;
        let len = p.topology.genome_size();
        let mut population = vec![
            Individual {
                genome: (0..len).map(|g| g as f64).collect(),
                fitness: 2.0,
            },
            Individual {
                genome: (0..len).map(|g| -2.0 * g as f64).collect(),
                fitness: 1.0,
            },
        ];
        population.extend((0..2).map(|_| Individual::zeroed(len)));
        let mut engine = Engine::from_parts(p, population, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(21);

        engine.set_population_size(40, false, &mut rng).unwrap();

        let mut blended = 0;
        for i in 4..40 {
            let child = engine.genome(i);
            let k = child[1];
            assert!((-2.0..=1.0).contains(&k), "slot {} scale {}", i, k);
            for (g, gene) in child.iter().enumerate() {
                assert!((gene - k * g as f64).abs() < 1e-9, "slot {} gene {}", i, g);
            }
            if k != 1.0 && k != -2.0 {
                blended += 1;
            }
        }
        assert!(blended > 0);
    }

    #[test]
    fn fitness_accessors() {
        let (mut engine, mut rng) = engine(4, 1, 10);
        engine.set_fitness(2, 1.5);
        engine.add_fitness(2, 2.0);
        assert_eq!(engine.fitness(2), 3.5);
        engine.reset_fitness();
        assert!(engine.population().iter().all(|i| i.fitness == 0.0));

        let g1 = engine.genome(1).to_vec();
        let g2 = engine.genome(2).to_vec();
        engine.randomize(2..4, &mut rng);
        assert_eq!(engine.genome(1), g1.as_slice());
        assert_ne!(engine.genome(2), g2.as_slice());

        engine.set_fitness(0, 4.0);
        let before = engine.population().to_vec();
        engine.randomize_all(&mut rng);
        for (old, new) in before.iter().zip(engine.population()) {
            assert_ne!(old.genome, new.genome);
            assert_eq!(old.fitness, new.fitness);
            assert!(new.genome.iter().all(|g| (-1.0..1.0).contains(g)));
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_fitness_panics() {
        let (engine, _) = engine(4, 1, 11);
        engine.fitness(4);
    }

    #[test]
    fn setters_validate() {
        let (mut engine, _) = engine(5, 2, 12);
        assert!(engine.set_survivors(0).is_err());
        assert!(engine.set_survivors(6).is_err());
        engine.set_survivors(5).unwrap();
        assert_eq!(engine.survivors(), 5);
        assert!(engine.set_mutation_rate(-0.1).is_err());
        engine.set_mutation_rate(0.3).unwrap();
        assert!(engine.set_mutation_magnitude(f64::INFINITY).is_err());
        engine.set_crossover(Crossover::Arithmetic);
        assert_eq!(engine.params().crossover, Crossover::Arithmetic);
        engine.set_mutation(Mutation::AllGenes);
        assert_eq!(engine.params().mutation, Mutation::AllGenes);
        engine.set_noise(Noise::Uniform);
        assert_eq!(engine.params().noise, Noise::Uniform);
    }

    #[test]
    fn from_parts_checks_genome_length() {
        let p = params(1);
        let pop = vec![Individual::zeroed(13), Individual::zeroed(12)];
        assert!(Engine::from_parts(p.clone(), pop, 0).is_err());
        let pop = vec![Individual::zeroed(13), Individual::zeroed(13)];
        let engine = Engine::from_parts(p, pop, 7).unwrap();
        assert_eq!(engine.generation(), 7);
    }
}
