//! Configuration for the rooted hypershell orchestrator.
//!
//! All parameters have defaults; the YAML loader in [`crate::config`] fills
//! this struct from the `hypershell` section.

use hypershell_nn::{Activation, Aggregation, ShellUnitConfig};
use serde::{Deserialize, Serialize};

use crate::shell::ShellOptions;

/// Options for [`super::RootedHypershell`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypershellOptions {
    /// Width of node embeddings and of the forward output.
    pub embedding_dim: usize,

    /// Width of each processing unit's hidden layer.
    pub hidden_dim: usize,

    /// Maximum number of shells beyond the root.
    /// The actual depth may be smaller when the graph runs out of atoms.
    pub num_shells: usize,

    /// Per-depth decay used by `spread_attention`.
    /// STI at depth d = root STI × attenuation_factor^d.
    pub attenuation_factor: f64,

    /// Maximum number of atoms admitted into one shell.
    pub max_nodes_per_shell: usize,

    /// Seed for parameter initialization and base embeddings.
    pub seed: u64,

    pub processor_activation: Activation,

    pub attention_activation: Activation,

    /// Pooling of node activations into a shell vector.
    pub shell_aggregation: Aggregation,
}

impl Default for HypershellOptions {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            hidden_dim: 128,
            num_shells: 5,
            attenuation_factor: 0.8,
            max_nodes_per_shell: 50,
            seed: 0,
            processor_activation: Activation::Tanh,
            attention_activation: Activation::Sigmoid,
            shell_aggregation: Aggregation::Mean,
        }
    }
}

impl HypershellOptions {
    /// Shell-builder caps derived from these options.
    pub fn shell_options(&self) -> ShellOptions {
        ShellOptions {
            max_shells: self.num_shells,
            max_nodes_per_shell: self.max_nodes_per_shell,
        }
    }

    /// Unit construction parameters derived from these options.
    pub fn unit_config(&self) -> ShellUnitConfig {
        ShellUnitConfig {
            input_dim: self.embedding_dim,
            hidden_dim: self.hidden_dim,
            processor_activation: self.processor_activation,
            attention_activation: self.attention_activation,
            aggregation: self.shell_aggregation,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = HypershellOptions::default();
        assert_eq!(o.embedding_dim, 64);
        assert_eq!(o.hidden_dim, 128);
        assert_eq!(o.num_shells, 5);
        assert_eq!(o.attenuation_factor, 0.8);
        assert_eq!(o.max_nodes_per_shell, 50);
    }

    #[test]
    fn test_derived_options() {
        let o = HypershellOptions {
            num_shells: 3,
            max_nodes_per_shell: 7,
            embedding_dim: 16,
            ..Default::default()
        };
        assert_eq!(
            o.shell_options(),
            ShellOptions {
                max_shells: 3,
                max_nodes_per_shell: 7
            }
        );
        assert_eq!(o.unit_config().input_dim, 16);
        assert_eq!(o.unit_config().aggregation, Aggregation::Mean);
    }

    #[test]
    fn test_partial_deserialize() {
        let o: HypershellOptions =
            serde_json::from_str(r#"{"hidden_dim": 8, "shell_aggregation": "max"}"#).unwrap();
        assert_eq!(o.hidden_dim, 8);
        assert_eq!(o.shell_aggregation, Aggregation::Max);
        assert_eq!(o.embedding_dim, 64);
    }
}
