//! AtomSpace collaborator.
//!
//! The hypershell core only reads the hypergraph and reads/writes two scalar
//! annotations per atom. Architecture follows the project pattern (trait + impl):
//! - [`AtomStore`] trait: the narrow accessor the core consumes
//! - [`AtomSpace`]: in-memory implementation with serde snapshots
//! - [`models`]: handles, atom types, truth and attention values

pub mod memory;
pub mod models;
pub mod traits;

pub use memory::{AtomSpace, AtomSpaceSnapshot};
pub use models::{Atom, AtomType, AttentionValue, Handle, TruthValue};
pub use traits::AtomStore;
