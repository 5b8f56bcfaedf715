//! Genetic Algorithm over customer orderings.
//!
//! Each generation keeps the `elite_count` best individuals unchanged and
//! refills the population with offspring of those elites. The only input is
//! the distance matrix, so the search never touches the road graph.

use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::heuristics::operators::{order_crossover, random_permutation, swap_mutation};
use crate::matrix::DistanceMatrix;
use crate::solution::Solution;

/// Individual in the genetic algorithm population
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// Customer visiting order; owns its buffer
    pub permutation: Vec<usize>,
    /// Cyclic tour cost (lower is better)
    pub fitness: f64,
}

impl Individual {
    pub fn new(permutation: Vec<usize>, matrix: &DistanceMatrix) -> Self {
        let fitness = matrix.tour_cost(&permutation);
        Individual { permutation, fitness }
    }
}

/// How offspring are produced from the elite set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReproductionOperator {
    /// Copy one elite parent and swap two random positions
    SwapMutation,
    /// Order Crossover (OX) of two elite parents, then a swap mutation
    OrderCrossover,
}

impl ReproductionOperator {
    pub fn name(&self) -> &'static str {
        match self {
            ReproductionOperator::SwapMutation => "GA-SwapMutation",
            ReproductionOperator::OrderCrossover => "GA-OrderCrossover",
        }
    }
}

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Elite count (best individuals preserved unchanged)
    pub elite_count: usize,
    /// Offspring operator
    pub reproduction: ReproductionOperator,
    /// Random seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 50,
            max_generations: 150,
            elite_count: 10,
            reproduction: ReproductionOperator::SwapMutation,
            seed: None,
        }
    }
}

impl GAConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(RouteError::InvalidInput("population size must be at least 1".into()));
        }
        if self.elite_count == 0 || self.elite_count >= self.population_size {
            return Err(RouteError::InvalidInput(format!(
                "elite count must be in 1..{} (got {})",
                self.population_size, self.elite_count
            )));
        }
        Ok(())
    }
}

/// Fitness summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a> {
    config: GAConfig,
    matrix: &'a DistanceMatrix,
    population: Vec<Individual>,
    rng: ChaCha8Rng,
    generation: usize,
    history: Vec<GenerationStats>,
}

impl<'a> GeneticAlgorithm<'a> {
    /// Set up a run over `matrix`, seeding the RNG from `config.seed`.
    pub fn new(matrix: &'a DistanceMatrix, config: GAConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(matrix, config, rng)
    }

    /// Set up a run with an explicit random source.
    pub fn with_rng(matrix: &'a DistanceMatrix, config: GAConfig, rng: ChaCha8Rng) -> Result<Self> {
        if matrix.size() < 2 {
            return Err(RouteError::InvalidInput(format!(
                "need a depot and at least one customer, got {} stop(s)",
                matrix.size()
            )));
        }
        config.validate()?;

        Ok(GeneticAlgorithm {
            config,
            matrix,
            population: Vec::new(),
            rng,
            generation: 0,
            history: Vec::new(),
        })
    }

    /// Fill the population with independent random orderings.
    fn initialize_population(&mut self) {
        let num_stops = self.matrix.size();
        self.population = (0..self.config.population_size)
            .map(|_| Individual::new(random_permutation(num_stops, &mut self.rng), self.matrix))
            .collect();
        self.sort_population();
        self.generation = 0;
        self.history.clear();
        self.record_stats();
    }

    fn sort_population(&mut self) {
        self.population.sort_by_key(|ind| OrderedFloat(ind.fitness));
    }

    fn record_stats(&mut self) {
        let fitness = self.population.iter().map(|ind| ind.fitness);
        let best = fitness.clone().fold(f64::INFINITY, f64::min);
        let worst = fitness.clone().fold(f64::NEG_INFINITY, f64::max);
        let mean = fitness.sum::<f64>() / self.population.len() as f64;
        self.history.push(GenerationStats {
            generation: self.generation,
            best,
            worst,
            mean,
        });
    }

    /// Produce one child from the (sorted) elite prefix of the population.
    fn reproduce(&mut self) -> Individual {
        let elite = &self.population[..self.config.elite_count];

        let mut child = match self.config.reproduction {
            ReproductionOperator::OrderCrossover if elite.len() > 1 => {
                let picks = rand::seq::index::sample(&mut self.rng, elite.len(), 2);
                let (p1, p2) = (&elite[picks.index(0)], &elite[picks.index(1)]);
                order_crossover(&p1.permutation, &p2.permutation, &mut self.rng)
            }
            _ => {
                let parent = &elite[self.rng.gen_range(0..elite.len())];
                parent.permutation.clone()
            }
        };

        swap_mutation(&mut child, &mut self.rng);
        Individual::new(child, self.matrix)
    }

    /// Create new generation
    fn evolve(&mut self) {
        let mut new_population = Vec::with_capacity(self.config.population_size);
        new_population.extend(self.population.iter().take(self.config.elite_count).cloned());

        while new_population.len() < self.config.population_size {
            let child = self.reproduce();
            new_population.push(child);
        }

        self.population = new_population;
        self.sort_population();
        self.generation += 1;
        self.record_stats();
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> Solution {
        self.run_with_observer(|_| {})
    }

    /// Run the genetic algorithm, calling `observer` after every generation.
    pub fn run_with_observer<F>(&mut self, mut observer: F) -> Solution
    where
        F: FnMut(&GenerationStats),
    {
        let start = std::time::Instant::now();

        self.initialize_population();

        while self.generation < self.config.max_generations {
            self.evolve();

            if let Some(stats) = self.history.last() {
                debug!(
                    "[GA] Gen {}  Best {:.3}  Mean {:.3}  Worst {:.3}",
                    stats.generation, stats.best, stats.mean, stats.worst
                );
                observer(stats);
            }
        }

        let permutation = self.best().map(|ind| ind.permutation.clone()).unwrap_or_default();
        let mut solution = Solution::new(self.matrix, permutation, self.config.reproduction.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.generations = self.generation;

        info!(
            "[GA] Finished {} generations in {:.3}s, best distance {:.3}",
            self.generation, solution.computation_time, solution.distance
        );
        solution
    }

    /// Best individual of the current population, `None` before [`run`](Self::run).
    pub fn best(&self) -> Option<&Individual> {
        self.population.first()
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Fitness summary per generation, generation 0 being the random start.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }
}

/// Order the customers of `matrix` with the default swap-mutation GA.
///
/// Returns the best permutation of customers `1..N` and its cyclic distance.
pub fn optimize(
    matrix: &DistanceMatrix,
    generations: usize,
    population_size: usize,
    elite_size: usize,
    rng_seed: Option<u64>,
) -> Result<(Vec<usize>, f64)> {
    let config = GAConfig {
        population_size,
        max_generations: generations,
        elite_count: elite_size,
        seed: rng_seed,
        ..Default::default()
    };
    let mut ga = GeneticAlgorithm::new(matrix, config)?;
    let solution = ga.run();
    Ok((solution.permutation, solution.distance))
}
