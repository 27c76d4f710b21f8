//! Deterministic snake episode state machine.
//!
//! A [`GameSim`] is one self-contained episode: a snake on a bounded grid,
//! one apple, and a stall cap. It knows nothing about agents or brains; it
//! only consumes absolute movement directions and exposes the ray-cast
//! vision encoding that policies feed on.

use std::collections::VecDeque;

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of vision rays cast from the snake's head.
///
/// Forward, both forward diagonals, left, right, and both rear diagonals.
/// Straight behind is deliberately omitted: the snake cannot see directly
/// behind its own head.
pub const VISION_RAYS: usize = 7;

/// Features recorded per ray: apple, snake body, wall.
pub const FEATURES_PER_RAY: usize = 3;

/// Total length of the vision encoding.
pub const VISION_SIZE: usize = VISION_RAYS * FEATURES_PER_RAY;

/// A grid cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column index, increasing rightward.
    pub x: i32,
    /// Row index, increasing downward.
    pub y: i32,
}

impl Cell {
    /// Creates a cell at the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the cell offset by a unit step vector.
    pub fn step(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Absolute movement direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Negative y.
    Up,
    /// Positive y.
    Down,
    /// Negative x.
    Left,
    /// Positive x.
    Right,
}

impl Direction {
    /// Unit step vector for this direction (y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The direction 90 degrees counter-clockwise (screen coordinates).
    pub fn turn_left(self) -> Self {
        match self {
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
        }
    }

    /// The direction 90 degrees clockwise (screen coordinates).
    pub fn turn_right(self) -> Self {
        match self {
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Right => Direction::Down,
            Direction::Up => Direction::Right,
        }
    }

    /// The exact 180 degree reversal.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Classification of a grid cell from the snake's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    /// The apple cell.
    Apple,
    /// An unoccupied in-bounds cell.
    Empty,
    /// A cell occupied by the snake body.
    Snake,
    /// Out of bounds.
    Void,
}

/// Immutable episode rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    /// Field width in cells.
    pub field_width: i32,
    /// Field height in cells.
    pub field_height: i32,
    /// Body length the snake starts each episode with.
    pub snake_start_length: usize,
    /// Target-length increase per apple eaten.
    pub snake_grow_length: usize,
    /// Turns without eating before the episode times out.
    pub max_ai_turns: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            field_width: 21,
            field_height: 21,
            snake_start_length: 10,
            snake_grow_length: 5,
            max_ai_turns: 21 * 21,
        }
    }
}

/// A single snake episode.
///
/// The body is a FIFO queue, oldest cell first: growth enqueues the new head
/// and shrinking dequeues from the tail until the body is back at its target
/// length, so the oldest segments always vacate first.
#[derive(Debug, Clone)]
pub struct GameSim {
    /// Episode rules.
    pub rules: Rules,
    /// Snake body cells, oldest first. The last element is the head.
    pub body: VecDeque<Cell>,
    /// Current head cell.
    pub head: Cell,
    /// Current apple cell.
    pub apple: Cell,
    /// Current heading.
    pub heading: Direction,
    /// Body length the snake is growing (or shrinking) towards.
    pub target_length: usize,
    /// False once the snake has collided with a wall or itself.
    pub alive: bool,
    /// Apples eaten this episode; the episode's fitness signal.
    pub apples_eaten: u32,
    /// Total moves made this episode.
    pub total_turns: u32,
    /// Moves since the last apple; drives the stall timeout.
    pub turns_since_eating: u32,
}

impl GameSim {
    /// Creates a fresh episode and resets it to its start state.
    pub fn new<R: Rng>(rules: Rules, rng: &mut R) -> Self {
        let mut sim = Self {
            rules,
            body: VecDeque::new(),
            head: Cell::new(0, 0),
            apple: Cell::new(0, 0),
            heading: Direction::Right,
            target_length: 0,
            alive: true,
            apples_eaten: 0,
            total_turns: 0,
            turns_since_eating: 0,
        };
        sim.reset(rng);
        sim
    }

    /// Resets the episode: full-length snake centered in the field with the
    /// tail extending left of the head, heading right, a freshly placed
    /// apple, and zeroed counters.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        let cx = self.rules.field_width / 2;
        let cy = self.rules.field_height / 2;
        let start = self.rules.snake_start_length;

        self.body.clear();
        for i in (0..start as i32).rev() {
            self.body.push_back(Cell::new(cx - i, cy));
        }
        self.head = Cell::new(cx, cy);
        self.heading = Direction::Right;
        self.target_length = start;
        self.alive = true;
        self.apples_eaten = 0;
        self.total_turns = 0;
        self.turns_since_eating = 0;
        self.apple = self.random_free_cell(rng, self.head);
    }

    /// Classifies a cell. The apple takes precedence over everything else.
    pub fn tile(&self, cell: Cell) -> Tile {
        if cell == self.apple {
            return Tile::Apple;
        }
        if !self.is_in_bounds(cell) {
            return Tile::Void;
        }
        if self.body.contains(&cell) {
            return Tile::Snake;
        }
        Tile::Empty
    }

    /// Whether a cell lies inside the field.
    pub fn is_in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.x < self.rules.field_width
            && cell.y >= 0
            && cell.y < self.rules.field_height
    }

    /// The only illegal move is the exact reversal of the current heading.
    pub fn is_legal_move(&self, direction: Direction) -> bool {
        direction != self.heading.opposite()
    }

    /// Whether the episode has reached a terminal state (death or timeout).
    pub fn is_terminal(&self) -> bool {
        !self.alive || self.timed_out()
    }

    /// Whether the stall cap has been reached. A timeout ends the episode
    /// but is not a death.
    pub fn timed_out(&self) -> bool {
        self.turns_since_eating >= self.rules.max_ai_turns
    }

    /// Current body length.
    pub fn snake_len(&self) -> usize {
        self.body.len()
    }

    /// Advances the snake one cell in the given direction.
    ///
    /// Callers must reject illegal moves with [`GameSim::is_legal_move`]
    /// before calling; the simulation asserts the invariant rather than
    /// correcting it. Terminal episodes (dead or timed out) don't move.
    pub fn advance<R: Rng>(&mut self, direction: Direction, rng: &mut R) {
        debug_assert!(self.is_legal_move(direction));

        if self.is_terminal() {
            return;
        }

        let new_head = self.head.step(direction.delta());
        self.total_turns += 1;
        self.turns_since_eating += 1;

        match self.tile(new_head) {
            Tile::Apple => {
                self.apples_eaten += 1;
                self.target_length += self.rules.snake_grow_length;
                self.apple = self.random_free_cell(rng, new_head);
                self.turns_since_eating = 0;
            }
            Tile::Empty => {}
            Tile::Snake | Tile::Void => {
                self.alive = false;
            }
        }

        self.body.push_back(new_head);
        while self.body.len() > self.target_length {
            self.body.pop_front();
        }

        self.head = new_head;
        self.heading = direction;
    }

    /// Places the apple at an explicit cell. Intended for scripted scenarios
    /// and tests; the cell must not be occupied by the snake.
    pub fn place_apple(&mut self, cell: Cell) {
        debug_assert!(self.is_in_bounds(cell));
        debug_assert!(!self.body.contains(&cell));
        self.apple = cell;
    }

    /// Ray-cast vision encoding from the current head.
    ///
    /// Casts [`VISION_RAYS`] rays relative to the current heading, in order:
    /// forward, forward-left, left, behind-left, forward-right, right,
    /// behind-right. Each ray yields `[apple, snake, wall]` proximities of
    /// `sqrt(1/distance)` (1.0 = adjacent, 0.0 = absent); only the nearest
    /// snake segment on a ray is recorded.
    pub fn vision(&self) -> Array1<f64> {
        let forward = self.heading.delta();
        let left = (forward.1, -forward.0);
        let right = (-forward.1, forward.0);
        let behind = (-forward.0, -forward.1);

        let rays = [
            forward,
            (forward.0 + left.0, forward.1 + left.1),
            left,
            (behind.0 + left.0, behind.1 + left.1),
            (forward.0 + right.0, forward.1 + right.1),
            right,
            (behind.0 + right.0, behind.1 + right.1),
        ];

        let mut outputs = Array1::zeros(VISION_SIZE);
        for (ray_index, &ray) in rays.iter().enumerate() {
            let features = self.look(ray);
            for (feature_index, &value) in features.iter().enumerate() {
                outputs[ray_index * FEATURES_PER_RAY + feature_index] = value;
            }
        }
        outputs
    }

    /// Walks one ray outward from the head until it exits the field.
    fn look(&self, direction: (i32, i32)) -> [f64; FEATURES_PER_RAY] {
        let mut result = [0.0; FEATURES_PER_RAY];
        let mut position = self.head;
        let mut distance = 0u32;
        let mut snake_found = false;

        loop {
            position = position.step(direction);
            distance += 1;

            // sqrt flattens out the proximity curve a bit
            let proximity = (1.0 / f64::from(distance)).sqrt();

            if !self.is_in_bounds(position) {
                result[2] = proximity;
                return result;
            }
            if position == self.apple {
                result[0] = proximity;
            } else if !snake_found && self.body.contains(&position) {
                // Only the distance to the closest piece of snake matters
                result[1] = proximity;
                snake_found = true;
            }
        }
    }

    /// Draws a uniformly random in-bounds cell that is neither occupied by
    /// the snake body nor equal to `exclude`.
    fn random_free_cell<R: Rng>(&self, rng: &mut R, exclude: Cell) -> Cell {
        loop {
            let cell = Cell::new(
                rng.random_range(0..self.rules.field_width),
                rng.random_range(0..self.rules.field_height),
            );
            if cell != exclude && !self.body.contains(&cell) {
                return cell;
            }
        }
    }
}
