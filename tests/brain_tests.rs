#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ndarray::{Array1, Array2, array};
use rand::Rng;
use serpent::simulation::brain::{Brain, BreedError, BreedingMode, Provenance};
use serpent::simulation::rng::create_rng;

fn create_test_brain(seed: u64) -> Brain {
    let mut rng = create_rng(seed);
    Brain::new_random(22, 18, 3, &mut rng)
}

#[test]
fn test_forward_pass_is_deterministic() {
    let brain = create_test_brain(1);
    let mut rng = create_rng(2);
    let input = Array1::from_shape_fn(22, |_| rng.random_range(-1.0..1.0));

    let first = brain.compute(&input);
    let second = brain.compute(&input);

    assert_eq!(first.output.len(), 3);
    assert_eq!(first.hidden.len(), 18);
    assert_eq!(first.output, second.output);
    assert_eq!(first.hidden, second.hidden);
}

#[test]
fn test_forward_pass_applies_leaky_relu() {
    // Identity first layer, summing second layer, hand-checkable values.
    let brain = Brain::from_parts(
        Provenance::Seed,
        array![[1.0, 0.0], [0.0, 1.0]],
        array![0.0, 0.0],
        array![[1.0], [1.0]],
        array![0.0],
    );

    let activations = brain.compute(&array![-1.0, 2.0]);

    assert!((activations.hidden[0] - (-0.01)).abs() < 1e-12);
    assert_eq!(activations.hidden[1], 2.0);
    assert!((activations.output[0] - 1.99).abs() < 1e-12);
}

#[test]
fn test_new_random_topology_and_provenance() {
    let brain = create_test_brain(3);

    assert_eq!(brain.topology(), (22, 18, 3));
    assert_eq!(brain.w1.dim(), (22, 18));
    assert_eq!(brain.b1.len(), 18);
    assert_eq!(brain.w2.dim(), (18, 3));
    assert_eq!(brain.b2.len(), 3);
    assert_eq!(brain.provenance, Provenance::Seed);
}

#[test]
fn test_cloned_copies_weights_and_retags() {
    let brain = create_test_brain(4);
    let copy = brain.cloned();

    assert_eq!(copy.provenance, Provenance::MutatedClone);
    assert_eq!(copy.w1, brain.w1);
    assert_eq!(copy.b1, brain.b1);
    assert_eq!(copy.w2, brain.w2);
    assert_eq!(copy.b2, brain.b2);
}

#[test]
fn test_mutation_clamps_touched_values() {
    let mut rng = create_rng(5);
    let oversized = Array2::from_elem((10, 10), 5.0);
    let mut brain = Brain::from_parts(
        Provenance::Seed,
        oversized.clone(),
        Array1::from_elem(10, 5.0),
        oversized,
        Array1::from_elem(10, 5.0),
    );

    for _ in 0..50 {
        brain.mutate(1.0, &mut rng);
    }

    let values: Vec<f64> = brain
        .w1
        .iter()
        .chain(brain.b1.iter())
        .chain(brain.w2.iter())
        .chain(brain.b2.iter())
        .copied()
        .collect();

    // Every touched value lands in [-1, 1]; untouched values stay at 5.0.
    let mutated = values.iter().filter(|&&v| v != 5.0).count();
    assert!(mutated > 0);
    for value in values {
        assert!(value == 5.0 || (-1.0..=1.0).contains(&value));
    }
}

#[test]
fn test_mutation_leaves_some_values_untouched_at_low_rate() {
    let mut rng = create_rng(6);
    let mut brain = create_test_brain(6);
    let original = brain.w1.clone();

    brain.mutate(0.1, &mut rng);

    let unchanged = brain
        .w1
        .iter()
        .zip(original.iter())
        .filter(|(a, b)| a == b)
        .count();
    assert!(unchanged > 0);
}

#[test]
fn test_blend_crossover_is_elementwise_mean() {
    let mut rng = create_rng(7);
    let left = create_test_brain(8);
    let right = create_test_brain(9);

    let child = left
        .breed(&right, BreedingMode::Blend, &mut rng)
        .expect("matching topology");

    assert_eq!(child.provenance, Provenance::CrossoverBlend);
    for ((&c, &a), &b) in child.w1.iter().zip(left.w1.iter()).zip(right.w1.iter()) {
        assert!((c - (a * 0.5 + b * 0.5)).abs() < 1e-12);
    }
    for ((&c, &a), &b) in child.b2.iter().zip(left.b2.iter()).zip(right.b2.iter()) {
        assert!((c - (a * 0.5 + b * 0.5)).abs() < 1e-12);
    }
}

#[test]
fn test_mix_crossover_takes_whole_elements() {
    let mut rng = create_rng(10);
    let left = create_test_brain(11);
    let right = create_test_brain(12);

    let child = left
        .breed(&right, BreedingMode::Mix, &mut rng)
        .expect("matching topology");

    assert_eq!(child.provenance, Provenance::CrossoverMix);
    let mut from_left = 0;
    let mut from_right = 0;
    for ((&c, &a), &b) in child.w1.iter().zip(left.w1.iter()).zip(right.w1.iter()) {
        assert!(c == a || c == b, "mixed element is not from either parent");
        if c == a {
            from_left += 1;
        } else {
            from_right += 1;
        }
    }
    // A 22x18 matrix all from one parent means the coin is broken.
    assert!(from_left > 0);
    assert!(from_right > 0);
}

#[test]
fn test_breeding_rejects_mismatched_topology() {
    let mut rng = create_rng(13);
    let left = Brain::new_random(22, 18, 3, &mut rng);
    let right = Brain::new_random(22, 10, 3, &mut rng);

    let result = left.breed(&right, BreedingMode::Blend, &mut rng);
    assert!(matches!(
        result,
        Err(BreedError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_provenance_codes_round_trip() {
    for provenance in [
        Provenance::Seed,
        Provenance::MutatedClone,
        Provenance::CrossoverBlend,
        Provenance::CrossoverMix,
    ] {
        assert_eq!(Provenance::from_code(provenance.code()), Some(provenance));
    }
    assert_eq!(Provenance::from_code(7), None);
}
