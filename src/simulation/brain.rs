//! Fixed-topology feed-forward neural network.
//!
//! Two linear layers with leaky ReLU activations, plus the genetic
//! operators (clone, crossover, mutate) that evolution runs on. The forward
//! pass is a pure function of the weights and the input; intermediate layer
//! values are returned as a side channel for introspection rather than
//! cached on the network.

use ndarray::{Array1, Array2, Zip};
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard deviation of the normal distribution seed weights are drawn
/// from. Seed weights may start outside [-1, 1]; mutation clamps them in.
const SEED_WEIGHT_STDDEV: f64 = 0.2;

/// How a brain's weights came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Freshly seeded from the random distribution.
    Seed,
    /// Deep copy of another brain, destined for mutation.
    MutatedClone,
    /// Elementwise mean of two parents.
    CrossoverBlend,
    /// Elementwise uniform pick from two parents.
    CrossoverMix,
}

impl Provenance {
    /// Stable integer code used by the binary record format.
    pub fn code(self) -> i32 {
        match self {
            Provenance::Seed => 0,
            Provenance::MutatedClone => 1,
            Provenance::CrossoverBlend => 2,
            Provenance::CrossoverMix => 3,
        }
    }

    /// Inverse of [`Provenance::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Provenance::Seed),
            1 => Some(Provenance::MutatedClone),
            2 => Some(Provenance::CrossoverBlend),
            3 => Some(Provenance::CrossoverMix),
            _ => None,
        }
    }
}

/// Strategy for deriving a child brain from two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreedingMode {
    /// Every element is the arithmetic mean of the parents' elements.
    Blend,
    /// Every element is copied from one parent or the other with equal
    /// probability.
    Mix,
}

/// Breeding failure.
#[derive(Debug, Error)]
pub enum BreedError {
    /// The parents do not share the same layer dimensions.
    #[error("mismatched brain topology: {left:?} vs {right:?}")]
    DimensionMismatch {
        /// (input, hidden, output) of the left parent.
        left: (usize, usize, usize),
        /// (input, hidden, output) of the right parent.
        right: (usize, usize, usize),
    },
}

/// Intermediate and final layer values from one forward pass.
///
/// Returned by value so the pass stays referentially transparent; callers
/// that only want the decision read `output`.
#[derive(Debug, Clone)]
pub struct Activations {
    /// Post-activation hidden layer values.
    pub hidden: Array1<f64>,
    /// Post-activation output layer values.
    pub output: Array1<f64>,
}

/// A two-layer feed-forward policy network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brain {
    /// Input vector length.
    pub input_size: usize,
    /// Hidden layer width.
    pub hidden_size: usize,
    /// Output vector length.
    pub output_size: usize,
    /// How these weights were derived.
    pub provenance: Provenance,
    /// First layer weights, `input_size` x `hidden_size`.
    pub w1: Array2<f64>,
    /// First layer bias, length `hidden_size`.
    pub b1: Array1<f64>,
    /// Second layer weights, `hidden_size` x `output_size`.
    pub w2: Array2<f64>,
    /// Second layer bias, length `output_size`.
    pub b2: Array1<f64>,
}

impl Brain {
    /// Creates a seed brain with weights drawn from Normal(0, 0.2).
    pub fn new_random<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        assert!(input_size > 0 && hidden_size > 0 && output_size > 0);

        let dist = Normal::new(0.0, SEED_WEIGHT_STDDEV).expect("valid stddev");
        Self {
            input_size,
            hidden_size,
            output_size,
            provenance: Provenance::Seed,
            w1: Array2::from_shape_fn((input_size, hidden_size), |_| rng.sample(dist)),
            b1: Array1::from_shape_fn(hidden_size, |_| rng.sample(dist)),
            w2: Array2::from_shape_fn((hidden_size, output_size), |_| rng.sample(dist)),
            b2: Array1::from_shape_fn(output_size, |_| rng.sample(dist)),
        }
    }

    /// Reassembles a brain from raw parts, e.g. a deserialized record.
    pub fn from_parts(
        provenance: Provenance,
        w1: Array2<f64>,
        b1: Array1<f64>,
        w2: Array2<f64>,
        b2: Array1<f64>,
    ) -> Self {
        let (input_size, hidden_size) = w1.dim();
        let output_size = b2.len();
        debug_assert_eq!(b1.len(), hidden_size);
        debug_assert_eq!(w2.dim(), (hidden_size, output_size));
        Self {
            input_size,
            hidden_size,
            output_size,
            provenance,
            w1,
            b1,
            w2,
            b2,
        }
    }

    /// Layer dimensions as (input, hidden, output).
    pub fn topology(&self) -> (usize, usize, usize) {
        (self.input_size, self.hidden_size, self.output_size)
    }

    /// Runs a forward pass.
    ///
    /// Pure: fixed weights and an identical input always yield identical
    /// output. Feeding a vector of the wrong length is a programming error.
    #[inline]
    pub fn compute(&self, input: &Array1<f64>) -> Activations {
        assert_eq!(input.len(), self.input_size, "brain input length mismatch");

        let mut hidden = input.dot(&self.w1) + &self.b1;
        leaky_relu(&mut hidden);

        let mut output = hidden.dot(&self.w2) + &self.b2;
        leaky_relu(&mut output);

        Activations { hidden, output }
    }

    /// Deep-copies the brain, tagging the copy as a mutated clone even
    /// before any mutation is applied.
    pub fn cloned(&self) -> Self {
        let mut copy = self.clone();
        copy.provenance = Provenance::MutatedClone;
        copy
    }

    /// Derives a child brain from two parents.
    ///
    /// Fails with [`BreedError::DimensionMismatch`] unless the parents share
    /// an identical topology; there is no automatic coercion.
    pub fn breed<R: Rng>(
        &self,
        other: &Brain,
        mode: BreedingMode,
        rng: &mut R,
    ) -> Result<Self, BreedError> {
        if self.topology() != other.topology() {
            return Err(BreedError::DimensionMismatch {
                left: self.topology(),
                right: other.topology(),
            });
        }

        let brain = match mode {
            BreedingMode::Blend => Self {
                input_size: self.input_size,
                hidden_size: self.hidden_size,
                output_size: self.output_size,
                provenance: Provenance::CrossoverBlend,
                w1: &self.w1 * 0.5 + &other.w1 * 0.5,
                b1: &self.b1 * 0.5 + &other.b1 * 0.5,
                w2: &self.w2 * 0.5 + &other.w2 * 0.5,
                b2: &self.b2 * 0.5 + &other.b2 * 0.5,
            },
            BreedingMode::Mix => Self {
                input_size: self.input_size,
                hidden_size: self.hidden_size,
                output_size: self.output_size,
                provenance: Provenance::CrossoverMix,
                w1: mix(&self.w1, &other.w1, rng),
                b1: mix(&self.b1, &other.b1, rng),
                w2: mix(&self.w2, &other.w2, rng),
                b2: mix(&self.b2, &other.b2, rng),
            },
        };
        Ok(brain)
    }

    /// Mutates weights and biases in place.
    ///
    /// One effective rate is drawn per call: `rng() * mutation_rate`. Each
    /// element is then independently perturbed with that probability by one
    /// of four equally likely operations, and clamped to [-1, 1]. Elements
    /// not selected are untouched.
    pub fn mutate<R: Rng>(&mut self, mutation_rate: f64, rng: &mut R) {
        let effective_rate = rng.random::<f64>() * mutation_rate;

        mutate_values(self.w1.iter_mut(), effective_rate, rng);
        mutate_values(self.b1.iter_mut(), effective_rate, rng);
        mutate_values(self.w2.iter_mut(), effective_rate, rng);
        mutate_values(self.b2.iter_mut(), effective_rate, rng);
    }
}

/// In-place leaky ReLU: negative values are muted to 1% so only the
/// strongest negatives leak through.
fn leaky_relu(values: &mut Array1<f64>) {
    values.mapv_inplace(|x| if x < 0.0 { 0.01 * x } else { x });
}

/// Elementwise uniform crossover: each element comes from one parent or the
/// other with probability 0.5, never a blended value.
fn mix<D, R>(
    left: &ndarray::Array<f64, D>,
    right: &ndarray::Array<f64, D>,
    rng: &mut R,
) -> ndarray::Array<f64, D>
where
    D: ndarray::Dimension,
    R: Rng,
{
    Zip::from(left)
        .and(right)
        .map_collect(|&a, &b| if rng.random::<f64>() < 0.5 { a } else { b })
}

fn mutate_values<'a, I, R>(values: I, effective_rate: f64, rng: &mut R)
where
    I: Iterator<Item = &'a mut f64>,
    R: Rng,
{
    for value in values {
        if rng.random::<f64>() >= effective_rate {
            continue;
        }

        match rng.random_range(0..4) {
            // tweak by up to +-0.2
            0 => *value += rng.random_range(-0.2..0.2),
            // replace with a new weight in -1.0 to 1.0
            1 => *value = rng.random_range(-1.0..1.0),
            // weaken or strengthen by up to 20%
            2 => *value *= 1.0 + rng.random_range(-0.2..0.2),
            // negate
            _ => *value = -*value,
        }

        *value = value.clamp(-1.0, 1.0);
    }
}
