//! Generational optimizer: ranks a cohort by fitness, keeps elites and breeds the rest.

use std::sync::Arc;

use circuitbots_core::{
    CohortEvaluator, ConfigError, Contender, GenerationOutcome, Policy, TrainingError,
};
use ordered_float::OrderedFloat;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::network::{FeedForwardPolicy, PolicyGenome};

/// Optimizer knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    /// Cohort size evaluated each generation.
    pub population_size: usize,
    /// Training stops once any member reaches this fitness.
    pub fitness_threshold: f32,
    /// Maximum number of generations to evaluate.
    pub generation_cap: u32,
    /// Top members copied unchanged into the next generation.
    pub elitism: usize,
    /// Members sampled per tournament when picking a parent.
    pub tournament_size: usize,
    /// Per-parameter mutation probability.
    pub mutation_rate: f32,
    /// Standard deviation of gaussian mutation noise.
    pub mutation_scale: f32,
    /// Hidden layer widths of every genome.
    pub hidden_layers: Vec<usize>,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            fitness_threshold: 2_500.0,
            generation_cap: 50,
            elitism: 2,
            tournament_size: 3,
            mutation_rate: 0.2,
            mutation_scale: 0.5,
            hidden_layers: vec![8],
            rng_seed: None,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Invalid("population_size must be non-zero"));
        }
        if self.generation_cap == 0 {
            return Err(ConfigError::Invalid("generation_cap must be at least one"));
        }
        if self.elitism > self.population_size {
            return Err(ConfigError::Invalid("elitism cannot exceed population_size"));
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::Invalid("tournament_size must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) || self.mutation_scale < 0.0 {
            return Err(ConfigError::Invalid(
                "mutation_rate must be within [0, 1] and mutation_scale non-negative",
            ));
        }
        if !self.fitness_threshold.is_finite() {
            return Err(ConfigError::Invalid("fitness_threshold must be finite"));
        }
        Ok(())
    }

    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// One genome in the cohort along with its latest score.
#[derive(Debug, Clone)]
pub struct Member {
    id: u64,
    genome: Arc<PolicyGenome>,
    fitness: f32,
}

impl Member {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn genome(&self) -> &PolicyGenome {
        &self.genome
    }

    #[must_use]
    pub const fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl Contender for Member {
    fn policy(&self) -> Box<dyn Policy> {
        Box::new(FeedForwardPolicy::new(Arc::clone(&self.genome)))
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }
}

/// Evolving cohort of feed-forward genomes.
#[derive(Debug)]
pub struct Population {
    config: PopulationConfig,
    rng: SmallRng,
    members: Vec<Member>,
    next_id: u64,
    generation: u32,
    champion: Option<Member>,
}

impl Population {
    /// Seed a population of random genomes.
    pub fn new(config: PopulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let members = (0..config.population_size)
            .map(|index| Member {
                id: index as u64,
                genome: Arc::new(PolicyGenome::random(&config.hidden_layers, &mut rng)),
                fitness: 0.0,
            })
            .collect();
        Ok(Self {
            next_id: config.population_size as u64,
            config,
            rng,
            members,
            generation: 0,
            champion: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Generations fully evaluated so far.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Best member seen in any completed generation.
    #[must_use]
    pub fn champion(&self) -> Option<&Member> {
        self.champion.as_ref()
    }

    /// Evolve until the fitness threshold or the generation cap is reached. Returns the
    /// best genome found, or `None` when the evaluator aborted the run.
    pub fn run<E>(&mut self, evaluator: &mut E) -> Result<Option<PolicyGenome>, TrainingError>
    where
        E: CohortEvaluator<Member> + ?Sized,
    {
        while self.generation < self.config.generation_cap {
            match evaluator.evaluate(&mut self.members)? {
                GenerationOutcome::Aborted => {
                    info!(generation = self.generation + 1, "training aborted");
                    return Ok(None);
                }
                GenerationOutcome::Completed(report) => {
                    debug!(generation = report.generation, ticks = report.ticks, "cohort evaluated");
                }
            }
            self.generation += 1;
            self.rank();

            let best = self.members[0].fitness;
            let mean =
                self.members.iter().map(|m| m.fitness).sum::<f32>() / self.members.len() as f32;
            if self
                .champion
                .as_ref()
                .is_none_or(|champion| best > champion.fitness)
            {
                self.champion = Some(self.members[0].clone());
            }
            info!(
                generation = self.generation,
                best,
                mean,
                champion = self.champion.as_ref().map_or(0.0, |c| c.fitness),
                "generation ranked"
            );
            if best >= self.config.fitness_threshold {
                info!(generation = self.generation, best, "fitness threshold reached");
                break;
            }
            if self.generation < self.config.generation_cap {
                self.breed();
            }
        }
        Ok(self
            .champion
            .as_ref()
            .map(|champion| PolicyGenome::clone(&champion.genome)))
    }

    fn rank(&mut self) {
        self.members
            .sort_by_key(|member| std::cmp::Reverse(OrderedFloat(member.fitness)));
    }

    fn breed(&mut self) {
        let ranked = std::mem::take(&mut self.members);
        let mut next = Vec::with_capacity(self.config.population_size);
        next.extend(ranked.iter().take(self.config.elitism).map(|elite| Member {
            fitness: 0.0,
            ..elite.clone()
        }));
        while next.len() < self.config.population_size {
            let mother = self.tournament(&ranked);
            let father = self.tournament(&ranked);
            let mut child = mother
                .genome
                .crossover(&father.genome, &mut self.rng)
                .unwrap_or_else(|| PolicyGenome::clone(&mother.genome));
            child.mutate(&mut self.rng, self.config.mutation_rate, self.config.mutation_scale);
            let id = self.next_id;
            self.next_id += 1;
            next.push(Member {
                id,
                genome: Arc::new(child),
                fitness: 0.0,
            });
        }
        self.members = next;
    }

    fn tournament<'a>(&mut self, ranked: &'a [Member]) -> &'a Member {
        let mut best = &ranked[self.rng.random_range(0..ranked.len())];
        for _ in 1..self.config.tournament_size {
            let candidate = &ranked[self.rng.random_range(0..ranked.len())];
            if OrderedFloat(candidate.fitness) > OrderedFloat(best.fitness) {
                best = candidate;
            }
        }
        best
    }
}
