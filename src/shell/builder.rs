//! Breadth-first shell decomposition.
//!
//! Shell 0 holds the root; shell `d + 1` holds every atom first discovered
//! from an atom of shell `d`, in discovery order. First discovery wins: an
//! atom is assigned exactly one depth and one BFS parent, so cycles in the
//! hypergraph terminate naturally.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::adjacency::AdjacencyIndex;
use crate::atomspace::{AtomStore, Handle};
use crate::error::{HypershellError, Result};

// ============================================================================
// Options
// ============================================================================

/// Caps applied while building shells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    /// Maximum number of shells beyond the root.
    pub max_shells: usize,
    /// Maximum number of atoms admitted into a single shell.
    pub max_nodes_per_shell: usize,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            max_shells: 10,
            max_nodes_per_shell: 100,
        }
    }
}

/// Strategy for [`find_optimal_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelection {
    /// Atom with the most direct neighbors.
    Degree,
    /// Atom with the highest short-term importance.
    Central,
    /// First atom in store order.
    #[default]
    First,
}

impl std::fmt::Display for RootSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degree => write!(f, "degree"),
            Self::Central => write!(f, "central"),
            Self::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for RootSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "degree" => Ok(Self::Degree),
            "central" => Ok(Self::Central),
            "first" | "default" => Ok(Self::First),
            _ => Err(format!("Unknown root selection: {}", s)),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Concentric BFS shells around a root atom.
///
/// Built eagerly at construction and immutable afterwards; rebuild by
/// constructing a new instance.
pub struct ShellBuilder {
    pub(super) store: Arc<dyn AtomStore>,
    pub(super) adjacency: Arc<AdjacencyIndex>,
    options: ShellOptions,
    root: Handle,
    shells: Vec<Vec<Handle>>,
    node_depth: HashMap<Handle, usize>,
    node_parent: HashMap<Handle, Handle>,
}

impl ShellBuilder {
    /// Build shells around `root`, indexing the store first.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `root` is not registered in `store`.
    pub fn new(store: Arc<dyn AtomStore>, root: Handle, options: ShellOptions) -> Result<Self> {
        let adjacency = Arc::new(AdjacencyIndex::build(store.as_ref()));
        Self::with_adjacency(store, adjacency, root, options)
    }

    /// Build shells reusing an existing adjacency index of the same store.
    pub fn with_adjacency(
        store: Arc<dyn AtomStore>,
        adjacency: Arc<AdjacencyIndex>,
        root: Handle,
        options: ShellOptions,
    ) -> Result<Self> {
        if !store.contains(root) {
            return Err(HypershellError::InvalidHandle(root));
        }

        let mut builder = Self {
            store,
            adjacency,
            options,
            root,
            shells: vec![vec![root]],
            node_depth: HashMap::from([(root, 0)]),
            node_parent: HashMap::new(),
        };
        builder.build();
        Ok(builder)
    }

    fn build(&mut self) {
        let cap = self.options.max_nodes_per_shell;
        let mut visited: HashSet<Handle> = HashSet::from([self.root]);

        let mut depth = 0;
        while depth < self.options.max_shells {
            let mut next_shell = Vec::new();
            let mut capped = false;

            'shell: for &handle in &self.shells[depth] {
                for &neighbor in self.adjacency.neighbors(handle) {
                    if next_shell.len() >= cap {
                        capped = true;
                        break 'shell;
                    }
                    if visited.insert(neighbor) {
                        next_shell.push(neighbor);
                        self.node_depth.insert(neighbor, depth + 1);
                        self.node_parent.insert(neighbor, handle);
                    }
                }
            }

            if capped {
                warn!(
                    "Shell {} around {} truncated at {} atoms",
                    depth + 1,
                    self.root,
                    cap
                );
            }
            if next_shell.is_empty() {
                break;
            }
            self.shells.push(next_shell);
            depth += 1;
        }

        debug!(
            "Built {} shells around {}: sizes {:?}",
            self.shells.len(),
            self.root,
            self.shell_sizes()
        );
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn root(&self) -> Handle {
        self.root
    }

    pub fn options(&self) -> ShellOptions {
        self.options
    }

    pub fn store(&self) -> &Arc<dyn AtomStore> {
        &self.store
    }

    pub fn adjacency(&self) -> &Arc<AdjacencyIndex> {
        &self.adjacency
    }

    /// Atoms at `depth` in discovery order; empty if that shell was never built.
    pub fn shell(&self, depth: usize) -> &[Handle] {
        self.shells.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_depth(&self, handle: Handle) -> Option<usize> {
        self.node_depth.get(&handle).copied()
    }

    /// BFS parent of `handle`; `None` for the root and undiscovered atoms.
    pub fn node_parent(&self, handle: Handle) -> Option<Handle> {
        self.node_parent.get(&handle).copied()
    }

    /// Last depth with a non-empty shell.
    pub fn max_depth(&self) -> usize {
        self.shells.len() - 1
    }

    /// All discovered atoms, shells concatenated depth-ascending.
    pub fn all_nodes(&self) -> Vec<Handle> {
        self.shells.iter().flatten().copied().collect()
    }

    pub fn shell_sizes(&self) -> Vec<usize> {
        self.shells.iter().map(Vec::len).collect()
    }

    pub fn total_nodes(&self) -> usize {
        self.node_depth.len()
    }

    pub fn average_shell_size(&self) -> f64 {
        self.total_nodes() as f64 / self.shells.len() as f64
    }

    /// Neighbors of `handle` in the underlying hypergraph.
    pub fn neighbors(&self, handle: Handle) -> &[Handle] {
        self.adjacency.neighbors(handle)
    }
}

impl std::fmt::Debug for ShellBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellBuilder")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("shell_sizes", &self.shell_sizes())
            .finish()
    }
}

// ============================================================================
// Root selection
// ============================================================================

/// Pick a root atom for a shell decomposition.
///
/// Returns `Ok(None)` for an empty store. Ties resolve to the earliest atom
/// in store order.
pub fn find_optimal_root(
    store: Arc<dyn AtomStore>,
    method: RootSelection,
) -> Result<Option<Handle>> {
    let candidates = store.all_atoms();
    let Some(&first) = candidates.first() else {
        return Ok(None);
    };

    let chosen = match method {
        RootSelection::First => first,
        RootSelection::Degree => {
            let adjacency = Arc::new(AdjacencyIndex::build(store.as_ref()));
            let options = ShellOptions {
                max_shells: 1,
                ..ShellOptions::default()
            };
            let mut best = (first, 0usize);
            for &candidate in &candidates {
                let shells = ShellBuilder::with_adjacency(
                    store.clone(),
                    adjacency.clone(),
                    candidate,
                    options,
                )?;
                let reach = shells.shell(1).len();
                if reach > best.1 {
                    best = (candidate, reach);
                }
            }
            best.0
        }
        RootSelection::Central => {
            let mut best: Option<(Handle, f64)> = None;
            for &candidate in &candidates {
                let Some(av) = store.attention_value(candidate) else {
                    continue;
                };
                if best.map_or(true, |(_, sti)| av.sti > sti) {
                    best = Some((candidate, av.sti));
                }
            }
            best.map_or(first, |(handle, _)| handle)
        }
    };

    debug!("Selected root {} by {}", chosen, method);
    Ok(Some(chosen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::{AtomSpace, AtomType, AttentionValue};

    fn chain() -> (Arc<AtomSpace>, [Handle; 5]) {
        // A ─L1─ B ─L2─ C
        let space = Arc::new(AtomSpace::new());
        let a = space.add_node(AtomType::ConceptNode, "A");
        let b = space.add_node(AtomType::ConceptNode, "B");
        let c = space.add_node(AtomType::ConceptNode, "C");
        let l1 = space.add_link(AtomType::InheritanceLink, vec![a, b]).unwrap();
        let l2 = space.add_link(AtomType::InheritanceLink, vec![b, c]).unwrap();
        (space, [a, b, c, l1, l2])
    }

    #[test]
    fn test_isolated_root() {
        let space = Arc::new(AtomSpace::new());
        let a = space.add_node(AtomType::ConceptNode, "alone");
        let shells = ShellBuilder::new(space, a, ShellOptions::default()).unwrap();
        assert_eq!(shells.shell(0), &[a]);
        assert_eq!(shells.max_depth(), 0);
        assert!(shells.shell(1).is_empty());
        assert_eq!(shells.node_parent(a), None);
        assert_eq!(shells.average_shell_size(), 1.0);
    }

    #[test]
    fn test_unknown_root_rejected() {
        let space = Arc::new(AtomSpace::new());
        let err = ShellBuilder::new(space, Handle(3), ShellOptions::default()).unwrap_err();
        assert!(matches!(err, HypershellError::InvalidHandle(Handle(3))));
    }

    #[test]
    fn test_chain_depths_and_parents() {
        let (space, [a, b, c, l1, l2]) = chain();
        let shells = ShellBuilder::new(space, a, ShellOptions::default()).unwrap();

        assert_eq!(shells.node_depth(a), Some(0));
        // A's only link brings in the link and B together.
        assert_eq!(shells.shell(1), &[l1, b]);
        assert_eq!(shells.node_parent(b), Some(a));
        // B is a member of L2, so L2 and C are both one step past B.
        assert_eq!(shells.shell(2), &[l2, c]);
        assert_eq!(shells.node_parent(l2), Some(b));
        assert_eq!(shells.node_parent(c), Some(b));
        assert_eq!(shells.max_depth(), 2);
        assert!(shells.shell(3).is_empty());
        assert_eq!(shells.total_nodes(), 5);
        assert_eq!(shells.all_nodes(), vec![a, l1, b, l2, c]);
        assert_eq!(shells.shell_sizes(), vec![1, 2, 2]);
    }

    #[test]
    fn test_max_shells_cap() {
        let (space, [a, ..]) = chain();
        let options = ShellOptions {
            max_shells: 1,
            ..Default::default()
        };
        let shells = ShellBuilder::new(space, a, options).unwrap();
        assert_eq!(shells.max_depth(), 1);
        assert!(shells.shell(2).is_empty());
    }

    #[test]
    fn test_max_nodes_per_shell_cap() {
        let space = Arc::new(AtomSpace::new());
        let hub = space.add_node(AtomType::ConceptNode, "hub");
        let spokes: Vec<Handle> = (0..6)
            .map(|i| space.add_node(AtomType::ConceptNode, format!("s{}", i)))
            .collect();
        let mut members = vec![hub];
        members.extend(&spokes);
        space.add_link(AtomType::ListLink, members).unwrap();

        let options = ShellOptions {
            max_shells: 5,
            max_nodes_per_shell: 3,
        };
        let shells = ShellBuilder::new(space, hub, options).unwrap();
        assert_eq!(shells.shell(1).len(), 3);
        for &h in shells.shell(1) {
            assert_eq!(shells.node_parent(h), Some(hub));
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let space = Arc::new(AtomSpace::new());
        let a = space.add_node(AtomType::ConceptNode, "a");
        let b = space.add_node(AtomType::ConceptNode, "b");
        space.add_link(AtomType::InheritanceLink, vec![a, b]).unwrap();
        space.add_link(AtomType::InheritanceLink, vec![b, a]).unwrap();

        let shells = ShellBuilder::new(space.clone(), a, ShellOptions::default()).unwrap();
        assert_eq!(shells.total_nodes(), space.len());
        let mut all = shells.all_nodes();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), shells.total_nodes());
    }

    #[test]
    fn test_find_optimal_root() {
        let (space, [a, b, _, l1, _]) = chain();
        let store: Arc<dyn AtomStore> = space.clone();

        assert_eq!(find_optimal_root(store.clone(), RootSelection::First).unwrap(), Some(a));
        // B sits in both links: l1, a, l2, c.
        assert_eq!(find_optimal_root(store.clone(), RootSelection::Degree).unwrap(), Some(b));

        // No attention recorded: falls back to the first atom.
        assert_eq!(find_optimal_root(store.clone(), RootSelection::Central).unwrap(), Some(a));
        space
            .set_attention_value(l1, AttentionValue::new(50.0, 0.0, false))
            .unwrap();
        assert_eq!(find_optimal_root(store, RootSelection::Central).unwrap(), Some(l1));
    }

    #[test]
    fn test_find_optimal_root_empty_store() {
        let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
        assert_eq!(find_optimal_root(store, RootSelection::Degree).unwrap(), None);
    }

    #[test]
    fn test_root_selection_parse() {
        assert_eq!("degree".parse::<RootSelection>().unwrap(), RootSelection::Degree);
        assert_eq!("default".parse::<RootSelection>().unwrap(), RootSelection::First);
        assert!("random".parse::<RootSelection>().is_err());
        assert_eq!(RootSelection::Central.to_string(), "central");
    }
}
