//! Player controllers: the seam between a running episode and whatever is
//! steering the snake, be it keyboard input or an evolved agent.

use rand::Rng;

use super::agent::Agent;
use super::game::{Direction, GameSim};

/// Who steers the snake for an episode.
#[derive(Debug, Clone)]
pub enum PlayerController {
    /// A human player; the most recently requested direction is buffered
    /// and applied on the next tick if legal.
    Human {
        /// Last direction the player asked for.
        requested: Direction,
    },
    /// An evolved agent deciding every tick from its vision encoding.
    Evolved(Agent),
}

impl PlayerController {
    /// A human controller initially steering in the given direction.
    pub fn human(requested: Direction) -> Self {
        Self::Human { requested }
    }

    /// Whether this controller is driven by human input.
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human { .. })
    }

    /// Buffers a direction request. Ignored for evolved controllers.
    pub fn request_direction(&mut self, direction: Direction) {
        if let Self::Human { requested } = self {
            *requested = direction;
        }
    }

    /// Ensures an evolved controller has a brain and is anchored to the
    /// episode's starting heading. No-op for human controllers.
    pub fn initialize<R: Rng>(&mut self, game: &GameSim, rng: &mut R) {
        if let Self::Evolved(agent) = self {
            agent.initialize(rng);
            agent.align_heading(game.heading);
        }
    }

    /// Produces the next absolute movement for the current tick.
    ///
    /// A human request that would reverse the snake is dropped and the
    /// current heading kept instead.
    pub fn next_move<R: Rng>(&mut self, game: &GameSim, rng: &mut R) -> Direction {
        match self {
            Self::Human { requested } => {
                if game.is_legal_move(*requested) {
                    *requested
                } else {
                    game.heading
                }
            }
            Self::Evolved(agent) => agent.decide(game, rng),
        }
    }

    /// The evolved agent behind this controller, if any.
    pub fn agent(&self) -> Option<&Agent> {
        match self {
            Self::Evolved(agent) => Some(agent),
            Self::Human { .. } => None,
        }
    }
}
