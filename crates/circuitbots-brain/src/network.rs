//! Dense feed-forward network used as the optimizer's genome.

use std::sync::Arc;

use circuitbots_core::{Controls, INPUT_SIZE, OUTPUT_SIZE, Observation, Policy};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

const INIT_WEIGHT_RANGE: f32 = 1.0;
const WEIGHT_LIMIT: f32 = 8.0;

/// Fully connected layer with row-major weights (`outputs` rows of `inputs` columns).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseLayer {
    fn random(inputs: usize, outputs: usize, rng: &mut dyn RngCore) -> Self {
        let weights = (0..inputs * outputs)
            .map(|_| rng.random_range(-INIT_WEIGHT_RANGE..INIT_WEIGHT_RANGE))
            .collect();
        let biases = (0..outputs)
            .map(|_| rng.random_range(-INIT_WEIGHT_RANGE..INIT_WEIGHT_RANGE))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            biases,
        }
    }

    #[must_use]
    pub const fn inputs(&self) -> usize {
        self.inputs
    }

    #[must_use]
    pub const fn outputs(&self) -> usize {
        self.outputs
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn forward(&self, input: &[f32], output: &mut Vec<f32>) {
        output.clear();
        for (row, bias) in self.weights.chunks_exact(self.inputs).zip(&self.biases) {
            let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
            output.push(sum + bias);
        }
    }

    fn parameters_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.weights.iter_mut().chain(self.biases.iter_mut())
    }
}

/// Feed-forward network mapping an observation to three raw control outputs.
///
/// Hidden layers use `tanh`. The pedal outputs pass through a logistic so they land in
/// `(0, 1)`; the steering output uses `tanh` so it lands in `(-1, 1)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyGenome {
    layers: Vec<DenseLayer>,
}

impl PolicyGenome {
    /// Trait identifier for this policy family.
    pub const KIND: &'static str = "feedforward.dense";

    /// Random network with the given hidden layer widths. Zero-width layers are skipped.
    #[must_use]
    pub fn random(hidden: &[usize], rng: &mut dyn RngCore) -> Self {
        let mut widths = Vec::with_capacity(hidden.len() + 2);
        widths.push(INPUT_SIZE);
        widths.extend(hidden.iter().copied().filter(|&w| w > 0));
        widths.push(OUTPUT_SIZE);
        let layers = widths
            .windows(2)
            .map(|pair| DenseLayer::random(pair[0], pair[1], &mut *rng))
            .collect();
        Self { layers }
    }

    #[must_use]
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Neuron count per layer, inputs first.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![INPUT_SIZE];
        shape.extend(self.layers.iter().map(DenseLayer::outputs));
        shape
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Evaluate the network.
    #[must_use]
    pub fn forward(&self, inputs: &[f32; INPUT_SIZE]) -> [f32; OUTPUT_SIZE] {
        let mut current = inputs.to_vec();
        let mut next = Vec::new();
        let last = self.layers.len().saturating_sub(1);
        for (index, layer) in self.layers.iter().enumerate() {
            layer.forward(&current, &mut next);
            if index != last {
                next.iter_mut().for_each(|v| *v = v.tanh());
            }
            std::mem::swap(&mut current, &mut next);
        }

        let mut outputs = [0.0; OUTPUT_SIZE];
        for (slot, value) in outputs.iter_mut().zip(&current) {
            *slot = *value;
        }
        outputs[0] = logistic(outputs[0]);
        outputs[1] = logistic(outputs[1]);
        outputs[2] = outputs[2].tanh();
        outputs
    }

    /// Perturb each parameter with probability `rate` by gaussian noise of deviation `scale`.
    pub fn mutate(&mut self, rng: &mut dyn RngCore, rate: f32, scale: f32) {
        let sigma = scale.max(1e-5);
        for layer in &mut self.layers {
            for param in layer.parameters_mut() {
                if rng.random::<f32>() < rate {
                    *param = (*param + gaussian(rng) * sigma).clamp(-WEIGHT_LIMIT, WEIGHT_LIMIT);
                }
            }
        }
    }

    /// Uniform crossover: each neuron (its weight row and bias) comes from either parent.
    /// Returns `None` when the parents have different shapes.
    #[must_use]
    pub fn crossover(&self, other: &Self, rng: &mut dyn RngCore) -> Option<Self> {
        if self.shape() != other.shape() {
            return None;
        }
        let mut child = self.clone();
        for (child_layer, other_layer) in child.layers.iter_mut().zip(&other.layers) {
            let width = child_layer.inputs;
            for neuron in 0..child_layer.outputs {
                if rng.random::<f32>() < 0.5 {
                    continue;
                }
                let row = neuron * width..(neuron + 1) * width;
                child_layer.weights[row.clone()].copy_from_slice(&other_layer.weights[row]);
                child_layer.biases[neuron] = other_layer.biases[neuron];
            }
        }
        Some(child)
    }
}

fn logistic(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

fn gaussian(rng: &mut dyn RngCore) -> f32 {
    const TWO_PI: f32 = std::f32::consts::TAU;
    let u1 = (rng.random::<f32>()).clamp(f32::MIN_POSITIVE, 1.0);
    let u2 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (TWO_PI * u2).cos()
}

/// Policy that drives with a shared, read-only genome.
#[derive(Debug, Clone)]
pub struct FeedForwardPolicy {
    genome: Arc<PolicyGenome>,
}

impl FeedForwardPolicy {
    #[must_use]
    pub fn new(genome: Arc<PolicyGenome>) -> Self {
        Self { genome }
    }
}

impl Policy for FeedForwardPolicy {
    fn kind(&self) -> &'static str {
        PolicyGenome::KIND
    }

    fn decide(&mut self, observation: &Observation) -> Controls {
        Controls::from_outputs(&self.genome.forward(&observation.to_inputs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn random_genome_has_expected_shape() {
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
        let genome = PolicyGenome::random(&[8, 0, 6], &mut rng);
        assert_eq!(genome.shape(), vec![INPUT_SIZE, 8, 6, OUTPUT_SIZE]);
        assert_eq!(
            genome.parameter_count(),
            INPUT_SIZE * 8 + 8 + 8 * 6 + 6 + 6 * OUTPUT_SIZE + OUTPUT_SIZE
        );
    }

    #[test]
    fn outputs_are_bounded() {
        let mut rng = SmallRng::seed_from_u64(11);
        let genome = PolicyGenome::random(&[5], &mut rng);
        for fill in [-3.0, 0.0, 0.5, 1.0, 10.0] {
            let outputs = genome.forward(&[fill; INPUT_SIZE]);
            assert!(outputs[..2].iter().all(|v| (0.0..=1.0).contains(v)));
            assert!((-1.0..=1.0).contains(&outputs[2]));
        }
    }

    #[test]
    fn no_hidden_layers_is_a_linear_map() {
        let mut rng = SmallRng::seed_from_u64(3);
        let genome = PolicyGenome::random(&[], &mut rng);
        assert_eq!(genome.layers().len(), 1);
        assert!(genome.forward(&[0.0; INPUT_SIZE]).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn mutate_changes_parameters() {
        let mut rng = SmallRng::seed_from_u64(456);
        let mut genome = PolicyGenome::random(&[4], &mut rng);
        let original = genome.clone();
        genome.mutate(&mut rng, 1.0, 0.5);
        assert_ne!(genome, original);
        assert_eq!(genome.shape(), original.shape());

        let mut untouched = original.clone();
        untouched.mutate(&mut rng, 0.0, 0.5);
        assert_eq!(untouched, original);
    }

    #[test]
    fn crossover_mixes_parent_neurons() {
        let mut rng = SmallRng::seed_from_u64(789);
        let a = PolicyGenome::random(&[6], &mut rng);
        let b = PolicyGenome::random(&[6], &mut rng);
        let child = a.crossover(&b, &mut rng).expect("same shape");
        for (layer, (la, lb)) in child.layers.iter().zip(a.layers.iter().zip(&b.layers)) {
            for (n, bias) in layer.biases.iter().enumerate() {
                assert!(*bias == la.biases[n] || *bias == lb.biases[n]);
            }
        }

        let other_shape = PolicyGenome::random(&[3], &mut rng);
        assert!(a.crossover(&other_shape, &mut rng).is_none());
    }

    #[test]
    fn genome_survives_json() {
        let mut rng = SmallRng::seed_from_u64(42);
        let genome = PolicyGenome::random(&[4], &mut rng);
        let json = serde_json::to_string(&genome).expect("serialize");
        let restored: PolicyGenome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, genome);
    }

    #[test]
    fn policy_decodes_network_outputs() {
        let mut rng = SmallRng::seed_from_u64(7);
        let genome = Arc::new(PolicyGenome::random(&[4], &mut rng));
        let observation = Observation {
            sensors: [1.0; circuitbots_core::SENSOR_COUNT],
            speed: 0.0,
            heading: 0.0,
        };
        let raw = genome.forward(&observation.to_inputs());
        let mut policy = FeedForwardPolicy::new(Arc::clone(&genome));
        assert_eq!(policy.kind(), PolicyGenome::KIND);
        assert_eq!(policy.decide(&observation), Controls::from_outputs(&raw));
    }
}
