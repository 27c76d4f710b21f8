//! # Serpent - Evolved Snake Agents
//!
//! A snake game where the snake is steered by small neural networks that
//! evolve through a genetic algorithm. Agents perceive the field through a
//! seven-ray vision encoding, pick relative moves by roulette over their
//! brain's outputs, and breed, mutate, and die by rank-based selection.
//!
//! ## Features
//!
//! - Neural network brains (two-layer MLP with leaky ReLU activation)
//! - Genetic algorithm evolution (jitter/replace/scale/negate mutation,
//!   blend and mix crossover)
//! - Seven-ray vision with apple, body, and wall proximity per ray
//! - Deterministic, seedable episodes and parallel evaluation
//! - Rank-based survival with fitness-proportionate replacement
//! - Binary persistence for agents plus JSON seed manifests
//!
//! ## Core Modules
//!
//! - [`simulation::game`] - Snake episode state, rules, and vision
//! - [`simulation::brain`] - Neural network and genetic operators
//! - [`simulation::agent`] - Agent identity and decision policy
//! - [`simulation::population`] - Evaluation, selection, and replacement
//! - [`simulation::persist`] - Agent records and seed manifests

/// Core simulation logic and data structures.
pub mod simulation {
    /// Agent identity, lineage, and the movement decision policy.
    pub mod agent;
    /// Neural network brains and their genetic operators.
    pub mod brain;
    /// The snake episode: field, snake, apple, and vision encoding.
    pub mod game;
    /// Training run parameters.
    pub mod params;
    /// Binary agent records and JSON seed manifests.
    pub mod persist;
    /// Controllers that steer an episode (human or evolved).
    pub mod player;
    /// Population evaluation and generational replacement.
    pub mod population;
    /// Seedable random number generator construction.
    pub mod rng;
}
