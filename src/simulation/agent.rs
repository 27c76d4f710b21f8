//! Evolved snake agents: identity, lineage, and the movement policy.
//!
//! An agent owns exactly one brain and converts the episode's sensory
//! encoding into an absolute movement direction via weighted sampling over
//! the brain's three relative outputs (straight, left, right).

use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{Array1, s};
use rand::Rng;

use super::brain::{Brain, BreedError, BreedingMode};
use super::game::{Direction, GameSim, VISION_SIZE};

/// Brain input width: one turn-pressure feature plus the vision encoding.
pub const BRAIN_INPUTS: usize = 1 + VISION_SIZE;

/// Hidden layer width used for all evolved agents.
pub const BRAIN_HIDDEN: usize = 18;

/// Brain output width: straight, turn left, turn right.
pub const BRAIN_OUTPUTS: usize = 3;

/// Below this total preference mass the policy is considered indifferent
/// and a move is picked uniformly at random. Undertrained brains emitting
/// all-zero preferences are an expected, common state early in evolution.
const INDIFFERENCE_EPSILON: f64 = 0.001;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// One member of the evolving population.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique id, monotonic over the process lifetime.
    pub id: u64,
    /// Human-readable identifier for this individual.
    pub name: String,
    /// Coarse lineage tag. Propagated through cloning and mutation;
    /// crossover offspring get a freshly derived species.
    pub species: String,
    /// Raw brain output from the most recent decision, for introspection.
    pub decision: Array1<f64>,
    brain: Option<Brain>,
    last_movement: Direction,
}

impl Agent {
    /// Creates an uninitialized agent with a fresh id, name, and species.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: format!("{:032x}", rng.random::<u128>()),
            species: species_name(rng),
            decision: Array1::zeros(BRAIN_OUTPUTS),
            brain: None,
            last_movement: Direction::Right,
        }
    }

    /// Reassembles an agent from persisted parts. The result is already
    /// initialized: [`Agent::initialize`] is a no-op on it.
    pub fn from_parts(name: String, species: String, brain: Brain) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name,
            species,
            decision: Array1::zeros(brain.output_size),
            brain: Some(brain),
            last_movement: Direction::Right,
        }
    }

    /// Seeds the brain if absent. Idempotent.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) {
        if self.brain.is_some() {
            return;
        }
        self.brain = Some(Brain::new_random(
            BRAIN_INPUTS,
            BRAIN_HIDDEN,
            BRAIN_OUTPUTS,
            rng,
        ));
    }

    /// Whether the agent owns a brain yet.
    pub fn is_initialized(&self) -> bool {
        self.brain.is_some()
    }

    /// The agent's brain, if initialized.
    pub fn brain(&self) -> Option<&Brain> {
        self.brain.as_ref()
    }

    /// The heading the next relative decision will be resolved against.
    pub fn last_movement(&self) -> Direction {
        self.last_movement
    }

    /// Re-anchors the agent's heading, e.g. at the start of a fresh episode
    /// whose snake faces a different way than the previous episode ended.
    pub fn align_heading(&mut self, heading: Direction) {
        self.last_movement = heading;
    }

    /// Chooses the next absolute movement for the given episode state.
    ///
    /// The brain sees one turn-pressure feature (turns since eating over the
    /// stall cap) followed by the 21 vision features, and emits preferences
    /// for continuing straight, turning left, and turning right relative to
    /// the last heading. The move is drawn by roulette over the non-negative
    /// preferences, falling back to a uniform pick when the brain is
    /// indifferent.
    pub fn decide<R: Rng>(&mut self, game: &GameSim, rng: &mut R) -> Direction {
        let brain = self
            .brain
            .as_ref()
            .expect("agent must be initialized before deciding");

        let mut input = Array1::zeros(brain.input_size);
        input[0] =
            f64::from(game.turns_since_eating) / f64::from(game.rules.max_ai_turns);
        input.slice_mut(s![1..]).assign(&game.vision());

        let activations = brain.compute(&input);
        self.decision = activations.output.clone();

        // Raise an all-negative preference vector until its minimum sits at
        // zero; otherwise throw away the negative options.
        let max = self.decision.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Array1<f64> = if max < 0.0 {
            let min = self.decision.iter().copied().fold(f64::INFINITY, f64::min);
            self.decision.mapv(|v| v - min)
        } else {
            self.decision.mapv(|v| v.max(0.0))
        };

        let options = [
            self.last_movement,
            self.last_movement.turn_left(),
            self.last_movement.turn_right(),
        ];

        let total: f64 = weights.sum();
        let movement = if total < INDIFFERENCE_EPSILON {
            options[rng.random_range(0..options.len())]
        } else {
            let roll = rng.random::<f64>() * total;
            let mut accumulated = 0.0;
            let mut chosen = options[options.len() - 1];
            for (index, &weight) in weights.iter().enumerate() {
                accumulated += weight;
                if roll < accumulated {
                    chosen = options[index];
                    break;
                }
            }
            chosen
        };

        self.last_movement = movement;
        movement
    }

    /// Clones the agent: fresh id and name, inherited species, and a
    /// deep-copied brain tagged as a mutated clone.
    pub fn spawn_clone<R: Rng>(&self, rng: &mut R) -> Self {
        let mut child = Agent::new(rng);
        child.species = self.species.clone();
        child.brain = self.brain.as_ref().map(Brain::cloned);
        child
    }

    /// Breeds with another agent, deriving a child brain per `mode`.
    ///
    /// Both parents must be initialized and share the same brain topology;
    /// a mismatch is fatal to this call only, and the caller may skip the
    /// pairing. The child carries its own freshly derived species name.
    pub fn breed_with<R: Rng>(
        &self,
        other: &Agent,
        mode: BreedingMode,
        rng: &mut R,
    ) -> Result<Self, BreedError> {
        let left = self.brain.as_ref().expect("left parent not initialized");
        let right = other.brain.as_ref().expect("right parent not initialized");

        let brain = left.breed(right, mode, rng)?;
        let mut child = Agent::new(rng);
        child.brain = Some(brain);
        Ok(child)
    }

    /// Mutates the brain in place. No-op on an uninitialized agent.
    pub fn mutate<R: Rng>(&mut self, mutation_rate: f64, rng: &mut R) {
        if let Some(brain) = self.brain.as_mut() {
            brain.mutate(mutation_rate, rng);
        }
    }
}

/// Eight random alphanumeric characters, the same coarse tag the whole
/// clone lineage shares.
fn species_name<R: Rng>(rng: &mut R) -> String {
    const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    (0..8)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
