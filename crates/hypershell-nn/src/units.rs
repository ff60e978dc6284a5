//! Per-depth shell units.
//!
//! A [`ShellUnit`] bundles the three learnable pieces attached to one shell:
//!
//! ```text
//! embedding ──► encoder ──► decoder ──► processed ──┬──► × ──► activation
//!                                                   └─► attention ─┘
//!
//! activations ──► Aggregation ──► aggregator ──► shell output
//! ```
//!
//! Forward calls return traces holding every intermediate tensor so the
//! matching backward call can run without recomputation.

use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::activation::{Activation, Aggregation};
use crate::dense::Dense;

/// Construction parameters for a [`ShellUnit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellUnitConfig {
    /// Width of node embeddings and of every unit output.
    pub input_dim: usize,
    /// Width of the processing unit's hidden layer.
    pub hidden_dim: usize,
    pub processor_activation: Activation,
    pub attention_activation: Activation,
    pub aggregation: Aggregation,
    /// Base seed; each unit mixes in its depth.
    pub seed: u64,
}

impl Default for ShellUnitConfig {
    fn default() -> Self {
        Self {
            input_dim: 64,
            hidden_dim: 128,
            processor_activation: Activation::Tanh,
            attention_activation: Activation::Sigmoid,
            aggregation: Aggregation::Mean,
            seed: 0,
        }
    }
}

/// Intermediate tensors of one node's forward pass.
#[derive(Debug, Clone)]
pub struct NodeTrace {
    pub embedding: Tensor,
    pub hidden: Tensor,
    pub processed: Tensor,
    /// Shape `[1]`.
    pub attention: Tensor,
    pub activation: Tensor,
}

/// Intermediate tensors of one shell's aggregation.
#[derive(Debug, Clone)]
pub struct ShellTrace {
    pub inputs: Vec<Tensor>,
    pub pooled: Tensor,
    pub output: Tensor,
}

/// Processing, attention and aggregation units for a single depth level.
#[derive(Debug, Clone)]
pub struct ShellUnit {
    depth: usize,
    encoder: Dense,
    decoder: Dense,
    attention: Dense,
    aggregator: Dense,
    aggregation: Aggregation,
}

impl ShellUnit {
    pub fn new(depth: usize, config: &ShellUnitConfig) -> Result<Self> {
        let seed = config.seed.wrapping_add(depth as u64);
        let (d, h) = (config.input_dim, config.hidden_dim);
        Ok(Self {
            depth,
            encoder: Dense::new(d, h, config.processor_activation, seed, "processor.encoder")?,
            decoder: Dense::new(h, d, config.processor_activation, seed, "processor.decoder")?,
            attention: Dense::new(d, 1, config.attention_activation, seed, "attention")?,
            aggregator: Dense::new(d, d, config.processor_activation, seed, "aggregator")?,
            aggregation: config.aggregation,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run one node embedding through the processing unit and scale the
    /// result by its attention scalar.
    pub fn forward_node(&self, embedding: &Tensor) -> Result<NodeTrace> {
        let hidden = self.encoder.forward(embedding)?;
        let processed = self.decoder.forward(&hidden)?;
        let attention = self.attention.forward(&processed)?;
        let activation = processed.broadcast_mul(&attention)?;
        Ok(NodeTrace {
            embedding: embedding.clone(),
            hidden,
            processed,
            attention,
            activation,
        })
    }

    /// Pool node activations and run the pooled vector through the
    /// aggregation unit.
    pub fn aggregate(&self, activations: Vec<Tensor>) -> Result<ShellTrace> {
        let pooled = self.aggregation.reduce(&activations)?;
        let output = self.aggregator.forward(&pooled)?;
        Ok(ShellTrace {
            inputs: activations,
            pooled,
            output,
        })
    }

    /// Backpropagate through the aggregation unit and the pooling rule.
    /// Returns one gradient per pooled activation, in input order.
    pub fn backward_shell(&mut self, trace: &ShellTrace, grad_output: &Tensor) -> Result<Vec<Tensor>> {
        let grad_pooled = self
            .aggregator
            .backward(&trace.pooled, &trace.output, grad_output)?;
        self.aggregation
            .backward(&trace.inputs, &trace.pooled, &grad_pooled)
    }

    /// Backpropagate one node's activation gradient through the attention
    /// unit and the processing unit. Returns the embedding gradient.
    pub fn backward_node(&mut self, trace: &NodeTrace, grad_activation: &Tensor) -> Result<Tensor> {
        // activation = processed · a
        let direct = grad_activation.broadcast_mul(&trace.attention)?;
        let grad_attention = grad_activation
            .mul(&trace.processed)?
            .sum_all()?
            .reshape(1)?;
        let via_attention =
            self.attention
                .backward(&trace.processed, &trace.attention, &grad_attention)?;
        let grad_processed = direct.add(&via_attention)?;

        let grad_hidden = self
            .decoder
            .backward(&trace.hidden, &trace.processed, &grad_processed)?;
        self.encoder
            .backward(&trace.embedding, &trace.hidden, &grad_hidden)
    }

    pub fn zero_grad(&mut self) -> Result<()> {
        for layer in self.layers_mut() {
            layer.zero_grad()?;
        }
        Ok(())
    }

    pub fn update(&mut self, learning_rate: f64) -> Result<()> {
        trace!(depth = self.depth, learning_rate, "Updating shell unit");
        for layer in self.layers_mut() {
            layer.update(learning_rate)?;
        }
        Ok(())
    }

    /// Combined L2 norm of every accumulated gradient in the unit.
    pub fn grad_norm(&self) -> Result<f32> {
        let mut total = 0.0f32;
        for layer in [&self.encoder, &self.decoder, &self.attention, &self.aggregator] {
            let n = layer.grad_norm()?;
            total += n * n;
        }
        Ok(total.sqrt())
    }

    fn layers_mut(&mut self) -> [&mut Dense; 4] {
        [
            &mut self.encoder,
            &mut self.decoder,
            &mut self.attention,
            &mut self.aggregator,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hashed_uniform, to_tensor, to_vec};

    fn small_config() -> ShellUnitConfig {
        ShellUnitConfig {
            input_dim: 6,
            hidden_dim: 10,
            seed: 3,
            ..Default::default()
        }
    }

    fn embedding(label: &str) -> Tensor {
        to_tensor(&hashed_uniform(1, label, 6, 0.5)).unwrap()
    }

    #[test]
    fn test_forward_node_shapes() {
        let unit = ShellUnit::new(0, &small_config()).unwrap();
        let trace = unit.forward_node(&embedding("a")).unwrap();
        assert_eq!(trace.hidden.dims(), &[10]);
        assert_eq!(trace.processed.dims(), &[6]);
        assert_eq!(trace.attention.dims(), &[1]);
        assert_eq!(trace.activation.dims(), &[6]);
    }

    #[test]
    fn test_activation_is_processed_scaled_by_attention() {
        let unit = ShellUnit::new(1, &small_config()).unwrap();
        let trace = unit.forward_node(&embedding("b")).unwrap();
        let a = to_vec(&trace.attention).unwrap()[0];
        assert!(a > 0.0 && a < 1.0, "sigmoid attention must be in (0, 1)");
        let processed = to_vec(&trace.processed).unwrap();
        let activation = to_vec(&trace.activation).unwrap();
        for (p, act) in processed.iter().zip(&activation) {
            assert!((p * a - act).abs() < 1e-6);
        }
    }

    #[test]
    fn test_units_differ_per_depth() {
        let u0 = ShellUnit::new(0, &small_config()).unwrap();
        let u1 = ShellUnit::new(1, &small_config()).unwrap();
        let e = embedding("c");
        let a0 = to_vec(&u0.forward_node(&e).unwrap().activation).unwrap();
        let a1 = to_vec(&u1.forward_node(&e).unwrap().activation).unwrap();
        assert_ne!(a0, a1);
    }

    #[test]
    fn test_aggregate_and_backward_accumulate_gradients() {
        let mut unit = ShellUnit::new(0, &small_config()).unwrap();
        let traces: Vec<NodeTrace> = ["x", "y", "z"]
            .iter()
            .map(|l| unit.forward_node(&embedding(l)).unwrap())
            .collect();
        let shell = unit
            .aggregate(traces.iter().map(|t| t.activation.clone()).collect())
            .unwrap();
        assert_eq!(shell.output.dims(), &[6]);

        let grad = to_tensor(&[1.0; 6]).unwrap();
        let node_grads = unit.backward_shell(&shell, &grad).unwrap();
        assert_eq!(node_grads.len(), 3);
        for (trace, g) in traces.iter().zip(&node_grads) {
            let grad_emb = unit.backward_node(trace, g).unwrap();
            assert_eq!(grad_emb.dims(), &[6]);
        }
        assert!(unit.grad_norm().unwrap() > 0.0);

        unit.zero_grad().unwrap();
        assert_eq!(unit.grad_norm().unwrap(), 0.0);
    }

    #[test]
    fn test_update_changes_output() {
        let mut unit = ShellUnit::new(0, &small_config()).unwrap();
        let e = embedding("w");
        let trace = unit.forward_node(&e).unwrap();
        let shell = unit.aggregate(vec![trace.activation.clone()]).unwrap();
        let before = to_vec(&shell.output).unwrap();

        let grads = unit
            .backward_shell(&shell, &to_tensor(&[1.0; 6]).unwrap())
            .unwrap();
        unit.backward_node(&trace, &grads[0]).unwrap();
        unit.update(0.01).unwrap();

        let trace = unit.forward_node(&e).unwrap();
        let after = to_vec(&unit.aggregate(vec![trace.activation]).unwrap().output).unwrap();
        assert_ne!(before, after);
        // Descending on sum(output) must lower it.
        assert!(after.iter().sum::<f32>() < before.iter().sum::<f32>());
    }
}
