//! Population management: evaluation, rank-based selection, and
//! generational replacement.
//!
//! Agents are evaluated in parallel with rayon; each agent's episodes run
//! on an independent random stream derived from the generation seed and
//! the agent's index, so a fixed master seed reproduces the run exactly.
//! Replacement is asexual: survivors are chosen by rank, then the ranks are
//! refilled with mutated clones picked proportionally to fitness.

use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{debug, info};

use super::agent::Agent;
use super::game::{GameSim, Rules};
use super::rng;

/// An agent paired with its score for the current generation.
#[derive(Debug, Clone)]
pub struct AgentScore {
    /// The agent.
    pub agent: Agent,
    /// Apples eaten, summed over this generation's episodes.
    pub score: u32,
}

/// A fixed-size population of evolving agents.
#[derive(Debug, Clone)]
pub struct Population {
    /// Current members with their generation scores.
    pub members: Vec<AgentScore>,
    population_size: usize,
    games_per_generation: usize,
    generation: u32,
    best_score: u32,
    best_agent: Option<Agent>,
}

impl Population {
    /// Creates an empty population shell; call [`Population::initialize`]
    /// or [`Population::initialize_with`] before running generations.
    pub fn new(population_size: usize, games_per_generation: usize) -> Self {
        assert!(population_size > 0);
        Self {
            members: Vec::with_capacity(population_size),
            population_size,
            games_per_generation,
            generation: 0,
            best_score: 0,
            best_agent: None,
        }
    }

    /// Seeds the population with fresh randomly-initialized agents.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) {
        self.members.clear();
        for _ in 0..self.population_size {
            let mut agent = Agent::new(rng);
            agent.initialize(rng);
            self.members.push(AgentScore { agent, score: 0 });
        }
        self.best_agent = Some(self.members[0].agent.clone());
        self.best_score = 0;
    }

    /// Seeds the population from pre-built agents (e.g. a seed manifest).
    /// The population size becomes the number of agents supplied.
    pub fn initialize_with(&mut self, agents: Vec<Agent>) {
        assert!(!agents.is_empty());
        self.population_size = agents.len();
        self.members = agents
            .into_iter()
            .map(|agent| AgentScore { agent, score: 0 })
            .collect();
        self.best_agent = Some(self.members[0].agent.clone());
        self.best_score = 0;
    }

    /// Current generation counter.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Population size held constant across generations.
    pub fn size(&self) -> usize {
        self.population_size
    }

    /// Best single-generation score seen across the whole run.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// The agent that achieved [`Population::best_score`].
    pub fn best_agent(&self) -> Option<&Agent> {
        self.best_agent.as_ref()
    }

    /// Evaluates every member over `games_per_generation` fresh episodes.
    ///
    /// Scores are the sum of apples eaten across the episodes. Members are
    /// independent, so evaluation fans out across the rayon pool; the
    /// best-ever bookkeeping happens after the join, which doubles as the
    /// generation barrier.
    pub fn evaluate(&mut self, rules: &Rules, generation_seed: u64) {
        let games_per_generation = self.games_per_generation;

        self.members
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, member)| {
                let mut agent_rng = rng::derive_agent_rng(generation_seed, index);
                member.score = 0;

                for _ in 0..games_per_generation {
                    let mut game = GameSim::new(rules.clone(), &mut agent_rng);
                    member.agent.align_heading(game.heading);

                    while !game.is_terminal() {
                        let movement = member.agent.decide(&game, &mut agent_rng);
                        debug_assert!(game.is_legal_move(movement));
                        game.advance(movement, &mut agent_rng);
                    }

                    member.score += game.apples_eaten;
                }

                debug!(
                    agent = member.agent.id,
                    species = %member.agent.species,
                    score = member.score,
                    "agent evaluated"
                );
            });

        self.update_best();
    }

    /// Folds the current scores into the best-ever bookkeeping.
    pub fn update_best(&mut self) {
        if let Some(best) = self.members.iter().max_by_key(|m| m.score) {
            if best.score > self.best_score || self.best_agent.is_none() {
                self.best_score = best.score;
                self.best_agent = Some(best.agent.clone());
            }
        }
    }

    /// Replaces the population in place: rank-based survival, then
    /// fitness-proportionate refill with mutated clones, then a shuffle
    /// and score reset.
    pub fn advance_generation<R: Rng>(&mut self, mutation_rate: f64, rng: &mut R) {
        self.members.sort_by(|a, b| b.score.cmp(&a.score));

        let sorted = std::mem::take(&mut self.members);
        let (survivors, total_fitness) = rank_survivors(sorted, rng);

        let mut next = survivors.clone();
        while next.len() < self.population_size {
            let parent = roulette_pick(&survivors, total_fitness, rng);
            let mut child = parent.agent.spawn_clone(rng);
            child.mutate(mutation_rate, rng);
            next.push(AgentScore {
                agent: child,
                score: 0,
            });
        }

        // Iteration order carries no fitness meaning; shuffling just keeps
        // the ranking honest for observers.
        next.shuffle(rng);
        for member in &mut next {
            member.score = 0;
        }

        self.members = next;
        self.generation += 1;
    }

    /// Runs one full generation: evaluate, log, select, and replace.
    pub fn run_generation<R: Rng>(&mut self, rules: &Rules, mutation_rate: f64, rng: &mut R) {
        let generation_seed: u64 = rng.random();
        self.evaluate(rules, generation_seed);

        let generation_best = self.members.iter().map(|m| m.score).max().unwrap_or(0);
        info!(
            generation = self.generation,
            generation_best,
            best_ever = self.best_score,
            "generation complete"
        );

        self.advance_generation(mutation_rate, rng);
    }
}

/// Rank-based survival over a score-descending population.
///
/// Rank `i` of `n` dies with probability `i / n`, so the best agent always
/// survives and survival probability decreases strictly with rank. Returns
/// the survivors and the sum of their scores.
pub fn rank_survivors<R: Rng>(
    sorted: Vec<AgentScore>,
    rng: &mut R,
) -> (Vec<AgentScore>, u64) {
    let n = sorted.len();
    let mut survivors = Vec::with_capacity(n);
    let mut total_fitness: u64 = 0;

    for (rank, member) in sorted.into_iter().enumerate() {
        let death_chance = rank as f64 / n as f64;
        if rng.random::<f64>() >= death_chance {
            total_fitness += u64::from(member.score);
            survivors.push(member);
        }
    }

    (survivors, total_fitness)
}

/// Fitness-proportionate parent selection among survivors.
///
/// When every survivor scored zero the draw degenerates to a uniform pick.
fn roulette_pick<'a, R: Rng>(
    survivors: &'a [AgentScore],
    total_fitness: u64,
    rng: &mut R,
) -> &'a AgentScore {
    if total_fitness == 0 {
        return &survivors[rng.random_range(0..survivors.len())];
    }

    let roll = rng.random::<f64>() * total_fitness as f64;
    let mut accumulated = 0.0;
    for member in survivors {
        accumulated += f64::from(member.score);
        if roll < accumulated {
            return member;
        }
    }
    &survivors[survivors.len() - 1]
}
