//! Rooted hypershell: shells, their tree mirror, and one set of neural
//! units per depth.
//!
//! Construction:
//! 1. Build a [`ShellBuilder`] around the root with the configured caps
//! 2. Mirror the shells into a [`RootedTree`] (each atom becomes a child of
//!    its BFS parent's tree node)
//! 3. Instantiate one [`ShellUnit`] per depth `0..=max_depth`
//!
//! Forward walks shells depth-ascending, backward walks them
//! depth-descending. Embeddings and activations are scratch caches; truth
//! and attention values stay in the store.

use std::collections::HashMap;
use std::sync::Arc;

use hypershell_nn::{
    hashed_uniform, to_tensor, to_vec, Aggregation, NodeTrace, ShellTrace, ShellUnit,
};
use tracing::{debug, info, warn};

use super::options::HypershellOptions;
use crate::atomspace::{AtomStore, Handle};
use crate::error::{HypershellError, Result};
use crate::shell::ShellBuilder;
use crate::tree::{NodeId, RootedTree};

/// Bound of the seeded base embedding values.
const EMBEDDING_BOUND: f32 = 1.0;

/// Orchestrates forward/backward passes over a shell decomposition.
pub struct RootedHypershell {
    pub(super) store: Arc<dyn AtomStore>,
    pub(super) options: HypershellOptions,
    pub(super) shells: ShellBuilder,
    pub(super) tree: RootedTree<Handle>,
    tree_nodes: HashMap<Handle, NodeId>,
    units: Vec<ShellUnit>,
    embeddings: HashMap<Handle, Vec<f32>>,
    pub(super) activations: HashMap<Handle, Vec<f32>>,
    node_traces: HashMap<Handle, NodeTrace>,
    shell_traces: Vec<ShellTrace>,
    last_output: Option<Vec<f32>>,
}

impl RootedHypershell {
    /// Build shells around `root`, mirror them into a tree and create the
    /// per-depth units.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `root` is not in `store`; `Neural` if a unit
    /// cannot be initialized.
    pub fn new(store: Arc<dyn AtomStore>, root: Handle, options: HypershellOptions) -> Result<Self> {
        let shells = ShellBuilder::new(store.clone(), root, options.shell_options())?;
        let (tree, tree_nodes) = mirror_tree(&shells)?;

        let unit_config = options.unit_config();
        let units = (0..=shells.max_depth())
            .map(|depth| ShellUnit::new(depth, &unit_config))
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!(
            "Rooted hypershell at {}: {} atoms in {} shells, embedding_dim={}, hidden_dim={}",
            root,
            shells.total_nodes(),
            shells.max_depth() + 1,
            options.embedding_dim,
            options.hidden_dim
        );

        Ok(Self {
            store,
            options,
            shells,
            tree,
            tree_nodes,
            units,
            embeddings: HashMap::new(),
            activations: HashMap::new(),
            node_traces: HashMap::new(),
            shell_traces: Vec::new(),
            last_output: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn options(&self) -> &HypershellOptions {
        &self.options
    }

    pub fn shells(&self) -> &ShellBuilder {
        &self.shells
    }

    pub fn tree(&self) -> &RootedTree<Handle> {
        &self.tree
    }

    /// Tree node mirroring `handle`, if it was discovered.
    pub fn tree_node(&self, handle: Handle) -> Option<NodeId> {
        self.tree_nodes.get(&handle).copied()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn max_depth(&self) -> usize {
        self.shells.max_depth()
    }

    /// Activation of `handle` from the last forward pass.
    pub fn activation(&self, handle: Handle) -> Option<&[f32]> {
        self.activations.get(&handle).map(Vec::as_slice)
    }

    /// Output of the last forward pass.
    pub fn last_output(&self) -> Option<&[f32]> {
        self.last_output.as_deref()
    }

    // ========================================================================
    // Embeddings
    // ========================================================================

    /// Embedding of `handle`, computed once and cached.
    ///
    /// The base vector is seeded by the handle; slots 0-3 are overwritten
    /// with truth strength, truth confidence, `min(sti/100, 1)` and
    /// `min(lti/100, 1)` when the store has those values. Later store updates
    /// are not seen until [`clear_embedding_cache`](Self::clear_embedding_cache).
    pub fn embedding_of(&mut self, handle: Handle) -> Vec<f32> {
        if let Some(cached) = self.embeddings.get(&handle) {
            return cached.clone();
        }

        let dim = self.options.embedding_dim;
        let mut embedding = hashed_uniform(
            self.options.seed,
            &format!("embedding{}", handle),
            dim,
            EMBEDDING_BOUND,
        );

        let mut overrides: Vec<(usize, f64)> = Vec::with_capacity(4);
        if let Some(tv) = self.store.truth_value(handle) {
            overrides.push((0, tv.strength));
            overrides.push((1, tv.confidence));
        }
        if let Some(av) = self.store.attention_value(handle) {
            overrides.push((2, (av.sti / 100.0).min(1.0)));
            overrides.push((3, (av.lti / 100.0).min(1.0)));
        }
        for (slot, value) in overrides {
            if let Some(v) = embedding.get_mut(slot) {
                *v = value as f32;
            }
        }

        self.embeddings.insert(handle, embedding.clone());
        embedding
    }

    pub fn clear_embedding_cache(&mut self) {
        debug!("Clearing {} cached embeddings", self.embeddings.len());
        self.embeddings.clear();
    }

    /// Drop activations and traces of the last forward pass.
    pub fn clear_activations(&mut self) {
        self.activations.clear();
        self.node_traces.clear();
        self.shell_traces.clear();
        self.last_output = None;
    }

    // ========================================================================
    // Forward / backward
    // ========================================================================

    /// Run every shell through its units and return the mean shell output.
    ///
    /// `input` is accepted for interface symmetry and ignored: the pass
    /// always covers the whole structure from the constructed root. The
    /// result has `embedding_dim` entries.
    pub fn forward(&mut self, input: Option<&[f32]>) -> Result<Vec<f32>> {
        if input.is_some() {
            debug!("Forward input ignored; processing from root {}", self.shells.root());
        }
        self.clear_activations();

        let mut outputs = Vec::with_capacity(self.units.len());
        for depth in 0..=self.shells.max_depth() {
            let handles = self.shells.shell(depth).to_vec();
            let embeddings: Vec<Vec<f32>> =
                handles.iter().map(|&h| self.embedding_of(h)).collect();

            let unit = &self.units[depth];
            let mut shell_activations = Vec::with_capacity(handles.len());
            for (&handle, embedding) in handles.iter().zip(&embeddings) {
                let trace = unit.forward_node(&to_tensor(embedding)?)?;
                self.activations.insert(handle, to_vec(&trace.activation)?);
                shell_activations.push(trace.activation.clone());
                self.node_traces.insert(handle, trace);
            }

            let shell_trace = unit.aggregate(shell_activations)?;
            outputs.push(shell_trace.output.clone());
            self.shell_traces.push(shell_trace);
        }

        // Equal weight per shell regardless of population.
        let output = to_vec(&Aggregation::Mean.reduce(&outputs)?)?;
        debug!(
            "Forward pass over {} shells, {} activations",
            outputs.len(),
            self.activations.len()
        );
        self.last_output = Some(output.clone());
        Ok(output)
    }

    /// Accumulate parameter gradients for `grad_output` from the last
    /// forward pass.
    ///
    /// The gradient is split equally across shells, then pushed deepest
    /// shell first through the aggregation unit and each node's attention
    /// and processing units. Returns a zero gradient shaped like `input`
    /// (or `embedding_dim` when `input` is `None`).
    pub fn backward(&mut self, input: Option<&[f32]>, grad_output: &[f32]) -> Result<Vec<f32>> {
        let dim = self.options.embedding_dim;
        if grad_output.len() != dim {
            return Err(HypershellError::DimensionMismatch {
                expected: dim,
                actual: grad_output.len(),
            });
        }
        let zeros = vec![0.0; input.map_or(dim, <[f32]>::len)];

        let shell_count = self.shell_traces.len();
        if shell_count == 0 {
            warn!("Backward called without a forward pass; no gradients accumulated");
            return Ok(zeros);
        }

        let scaled: Vec<f32> = grad_output
            .iter()
            .map(|g| g / shell_count as f32)
            .collect();
        let grad_per_shell = to_tensor(&scaled)?;

        for depth in (0..shell_count).rev() {
            let unit = &mut self.units[depth];
            let node_grads = unit.backward_shell(&self.shell_traces[depth], &grad_per_shell)?;
            for (handle, grad) in self.shells.shell(depth).iter().zip(&node_grads) {
                if let Some(trace) = self.node_traces.get(handle) {
                    unit.backward_node(trace, grad)?;
                }
            }
        }

        debug!("Backward pass over {} shells", shell_count);
        Ok(zeros)
    }

    /// Reset accumulated gradients in every unit.
    pub fn zero_grad_parameters(&mut self) -> Result<()> {
        for unit in &mut self.units {
            unit.zero_grad()?;
        }
        Ok(())
    }

    /// Apply one gradient-descent step to every unit.
    pub fn update_parameters(&mut self, learning_rate: f64) -> Result<()> {
        for unit in &mut self.units {
            unit.update(learning_rate)?;
        }
        debug!("Updated {} shell units (lr={})", self.units.len(), learning_rate);
        Ok(())
    }

    /// Combined L2 norm of all accumulated gradients.
    pub fn grad_norm(&self) -> Result<f32> {
        let mut total = 0.0f32;
        for unit in &self.units {
            let n = unit.grad_norm()?;
            total += n * n;
        }
        Ok(total.sqrt())
    }

    // ========================================================================
    // Attention
    // ========================================================================

    /// Spread root STI through the shells `iterations` times with the
    /// configured attenuation factor.
    ///
    /// Each round recomputes from the current root STI, so repeated rounds
    /// give the same values unless the root changes in between. Returns the
    /// map of the last round (empty when `iterations` is 0).
    pub fn spread_attention(&self, iterations: usize) -> Result<HashMap<Handle, f64>> {
        let mut last = HashMap::new();
        for _ in 0..iterations {
            last = self.shells.spread_attention(self.options.attenuation_factor)?;
        }
        Ok(last)
    }
}

impl std::fmt::Debug for RootedHypershell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootedHypershell")
            .field("shells", &self.shells)
            .field("tree_nodes", &self.tree.node_count())
            .field("units", &self.units.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Mirror the BFS shells into a rooted tree of handles.
fn mirror_tree(shells: &ShellBuilder) -> Result<(RootedTree<Handle>, HashMap<Handle, NodeId>)> {
    let mut tree = RootedTree::new(shells.root());
    let mut nodes = HashMap::from([(shells.root(), tree.root())]);

    for depth in 1..=shells.max_depth() {
        for &handle in shells.shell(depth) {
            let parent = shells
                .node_parent(handle)
                .and_then(|p| nodes.get(&p).copied())
                .ok_or(HypershellError::InvalidHandle(handle))?;
            let node = tree.add_child(parent, handle)?;
            nodes.insert(handle, node);
        }
    }
    Ok((tree, nodes))
}
