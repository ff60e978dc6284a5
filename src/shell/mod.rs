//! Shell decomposition of the hypergraph.
//!
//! ## Architecture
//!
//! ```text
//! AtomStore ──► AdjacencyIndex ──► ShellBuilder ──► propagate_outward / propagate_inward
//!                  (one scan)      (BFS + caps)      spread_attention (writes STI back)
//! ```
//!
//! ## Modules
//!
//! - [`adjacency`]: precomputed neighbor lists
//! - [`builder`]: BFS shells, depth/parent maps, root selection
//! - [`propagation`]: outward/inward propagation and attention spreading

pub mod adjacency;
pub mod builder;
pub mod propagation;

pub use adjacency::AdjacencyIndex;
pub use builder::{find_optimal_root, RootSelection, ShellBuilder, ShellOptions};
pub use propagation::Blend;
