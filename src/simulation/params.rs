use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::game::Rules;

/// Training parameters for a full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Episode rules shared by every game.
    pub rules: Rules,
    /// Number of agents per generation.
    pub population_size: usize,
    /// Episodes each agent plays per generation; fitness is the sum of
    /// apples eaten across them.
    pub games_per_generation: usize,
    /// Generations to run before stopping.
    pub generations: u32,
    /// Mutation rate constant applied to every cloned child.
    pub mutation_rate: f64,
    /// Master seed; a fixed seed reproduces the whole run.
    pub seed: u64,
    /// Optional JSON manifest of persisted agents to seed the population
    /// from instead of random initialization.
    pub seed_manifest: Option<PathBuf>,
    /// Where to write the best-ever agent record after the run.
    pub best_agent_path: PathBuf,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            population_size: 100,
            games_per_generation: 100,
            generations: 100,
            mutation_rate: 0.40,
            seed: 42,
            seed_manifest: None,
            best_agent_path: PathBuf::from("best_agent.bin"),
        }
    }
}
