//! AtomSpace Hypershell
//!
//! Hierarchical shell decomposition of a symbolic hypergraph with small
//! neural units reading and writing its atoms:
//! - Breadth-first "shell" decomposition around a root atom, with caps
//! - A rooted tree mirroring the decomposition
//! - Outward/inward value propagation and attention spreading
//! - One processing/attention/aggregation unit per shell depth
//! - Unlabeled rooted tree counts (OEIS A000081) for reference statistics
//!
//! ## Architecture
//!
//! ```text
//! AtomStore (trait) ◄── AtomSpace (in-memory)
//!      │
//!      ▼
//! ShellBuilder ──► RootedTree<Handle> mirror
//!      │                 │
//!      ▼                 ▼
//! propagation     RootedHypershell ──► hypershell-nn (ShellUnit per depth)
//! ```
//!
//! ## Modules
//!
//! - [`atomspace`]: handles, atoms, truth/attention values, store trait
//! - [`tree`]: rooted tree container and A000081 enumerator
//! - [`shell`]: adjacency index, shell builder, propagation engine
//! - [`hypershell`]: orchestrator and similarity queries
//! - [`config`]: YAML + env configuration
//! - [`error`]: error taxonomy

pub mod atomspace;
pub mod config;
pub mod error;
pub mod hypershell;
pub mod shell;
pub mod tree;

pub use atomspace::{
    Atom, AtomSpace, AtomSpaceSnapshot, AtomStore, AtomType, AttentionValue, Handle, TruthValue,
};
pub use config::HypershellConfig;
pub use error::{HypershellError, Result};
pub use hypershell::{
    HypershellOptions, HypershellStats, InferenceCandidate, RelevantNode, RootedHypershell,
};
pub use shell::{find_optimal_root, AdjacencyIndex, Blend, RootSelection, ShellBuilder, ShellOptions};
pub use tree::{NodeId, RootedTree, RootedTreeEnumerator};

pub use hypershell_nn::{Activation, Aggregation};
