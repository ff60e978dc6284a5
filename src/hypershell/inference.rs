//! Queries over the activations of the last forward pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::orchestrator::RootedHypershell;
use crate::atomspace::Handle;
use crate::error::{HypershellError, Result};

// ============================================================================
// Result types
// ============================================================================

/// One scored atom of a shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceCandidate {
    pub handle: Handle,
    /// Dot product of the query and the atom's activation.
    pub similarity: f64,
    pub depth: usize,
}

/// An atom ranked by attention-weighted similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantNode {
    pub handle: Handle,
    /// similarity × (STI, or 1.0 when absent) / 100
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: usize,
    pub root_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellStats {
    pub max_depth: usize,
    pub total_nodes: usize,
    pub shell_sizes: Vec<usize>,
    pub average_shell_size: f64,
}

/// Summary of a [`RootedHypershell`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypershellStats {
    pub tree: TreeStats,
    pub shell: ShellStats,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}

// ============================================================================
// Queries
// ============================================================================

impl RootedHypershell {
    fn check_query(&self, query: &[f32]) -> Result<()> {
        let expected = self.options.embedding_dim;
        if query.len() != expected {
            return Err(HypershellError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
        Ok(())
    }

    /// Score every activated atom against `query`, grouped by shell depth.
    ///
    /// Candidates keep shell discovery order; depths without activations are
    /// omitted.
    pub fn hierarchical_inference(
        &self,
        query: &[f32],
    ) -> Result<BTreeMap<usize, Vec<InferenceCandidate>>> {
        self.check_query(query)?;

        let mut results = BTreeMap::new();
        for depth in 0..=self.shells.max_depth() {
            let candidates: Vec<InferenceCandidate> = self
                .shells
                .shell(depth)
                .iter()
                .filter_map(|&handle| {
                    self.activations.get(&handle).map(|act| InferenceCandidate {
                        handle,
                        similarity: dot(query, act),
                        depth,
                    })
                })
                .collect();
            if !candidates.is_empty() {
                results.insert(depth, candidates);
            }
        }
        Ok(results)
    }

    /// Rank all activated atoms by `similarity × sti / 100` (STI defaults to
    /// 1.0), best first, keeping at most `top_k`.
    pub fn get_relevant_nodes(&self, query: &[f32], top_k: usize) -> Result<Vec<RelevantNode>> {
        self.check_query(query)?;

        let mut ranked: Vec<RelevantNode> = self
            .shells
            .all_nodes()
            .into_iter()
            .filter_map(|handle| {
                let act = self.activations.get(&handle)?;
                let sti = self
                    .store
                    .attention_value(handle)
                    .map_or(1.0, |av| av.sti);
                Some(RelevantNode {
                    handle,
                    relevance: dot(query, act) * sti / 100.0,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.handle.cmp(&b.handle))
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }

    pub fn get_stats(&self) -> HypershellStats {
        HypershellStats {
            tree: TreeStats {
                node_count: self.tree.node_count(),
                max_depth: self.tree.max_depth(),
                root_value: self.shells.root().to_string(),
            },
            shell: ShellStats {
                max_depth: self.shells.max_depth(),
                total_nodes: self.shells.total_nodes(),
                shell_sizes: self.shells.shell_sizes(),
                average_shell_size: self.shells.average_shell_size(),
            },
            embedding_dim: self.options.embedding_dim,
            hidden_dim: self.options.hidden_dim,
        }
    }
}
