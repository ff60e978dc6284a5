//! Rooted hypershell orchestrator.
//!
//! Ties a [`ShellBuilder`](crate::shell::ShellBuilder), its
//! [`RootedTree`](crate::tree::RootedTree) mirror and the per-depth units of
//! `hypershell-nn` together, and answers similarity queries over the
//! activations of the last forward pass.
//!
//! ## Modules
//!
//! - [`options`]: `HypershellOptions`
//! - [`orchestrator`]: construction, embeddings, forward/backward, attention
//! - [`inference`]: hierarchical inference, relevance ranking, stats

pub mod inference;
pub mod options;
pub mod orchestrator;

pub use inference::{HypershellStats, InferenceCandidate, RelevantNode, ShellStats, TreeStats};
pub use options::HypershellOptions;
pub use orchestrator::RootedHypershell;
