//! Survivor ranking and parent choice.

use rand::Rng;

use crate::genome::Individual;

/// Index of the highest fitness in `population[from..]`. The first maximum
/// wins ties.
pub fn max_fitness_index(population: &[Individual], from: usize) -> usize {
    let mut index = from;
    let mut best = population[from].fitness;
    for (i, ind) in population.iter().enumerate().skip(from + 1) {
        if best < ind.fitness {
            best = ind.fitness;
            index = i;
        }
    }
    index
}

/// Move the `survivors` fittest individuals to the front, sorted descending.
///
/// This is a selection sort that stops after `survivors` positions, so it
/// costs O(survivors * len) and leaves `[survivors, len)` unordered. Returns
/// the index the global best held before anything moved.
pub fn rank(population: &mut [Individual], survivors: usize) -> usize {
    if population.is_empty() {
        return 0;
    }
    let last_best = max_fitness_index(population, 0);
    for i in 0..survivors.min(population.len()) {
        let max = max_fitness_index(population, i);
        if population[i].fitness < population[max].fitness {
            population.swap(i, max);
        }
    }
    last_best
}

/// Two parent indices drawn with replacement from `[0, survivors)`, ordered
/// so that `father <= mother`.
pub fn select_parents<R: Rng + ?Sized>(survivors: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.gen_range(0..survivors);
    let b = rng.gen_range(0..survivors);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn with_fitness(values: &[f64]) -> Vec<Individual> {
        values
            .iter()
            .enumerate()
            .map(|(i, &f)| Individual {
                genome: vec![i as f64],
                fitness: f,
            })
            .collect()
    }

    fn tags(pop: &[Individual]) -> Vec<usize> {
        pop.iter().map(|ind| ind.genome[0] as usize).collect()
    }

    #[test]
    fn ranks_prefix_descending() {
        let mut pop = with_fitness(&[3.0, 9.0, 1.0, 7.0, 5.0, 8.0]);
        let last_best = rank(&mut pop, 3);
        assert_eq!(last_best, 1);
        assert_eq!(&tags(&pop)[..3], &[1, 5, 3]);
        let mut rest: Vec<usize> = tags(&pop)[3..].to_vec();
        rest.sort();
        assert_eq!(rest, vec![0, 2, 4]);
    }

    #[test]
    fn ties_keep_lower_index_first() {
        let mut pop = with_fitness(&[1.0, 4.0, 4.0, 2.0]);
        assert_eq!(rank(&mut pop, 2), 1);
        assert_eq!(&tags(&pop)[..2], &[1, 2]);
    }

    #[test]
    fn survivors_equal_to_len_is_a_full_sort() {
        let mut pop = with_fitness(&[0.5, -1.0, 2.0, 1.0]);
        rank(&mut pop, 4);
        assert_eq!(tags(&pop), vec![2, 3, 0, 1]);
    }

    #[test]
    fn already_sorted_is_untouched() {
        let mut pop = with_fitness(&[5.0, 4.0, 3.0, 2.0]);
        assert_eq!(rank(&mut pop, 2), 0);
        assert_eq!(tags(&pop), vec![0, 1, 2, 3]);
    }

    #[test]
    fn parents_are_ordered_survivors() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut seen_equal = false;
        for _ in 0..500 {
            let (f, m) = select_parents(4, &mut rng);
            assert!(f <= m && m < 4);
            seen_equal |= f == m;
        }
        assert!(seen_equal, "selection is with replacement");
        assert_eq!(select_parents(1, &mut rng), (0, 0));
    }
}
