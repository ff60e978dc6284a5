//! AtomStore trait definition
//!
//! Defines the narrow accessor the hypershell core consumes. Hypergraph
//! CRUD stays with the implementation; the core only reads structure and
//! reads/writes truth and attention values.

use super::models::{Atom, AttentionValue, Handle, TruthValue};
use crate::error::Result;

/// Read access to the hypergraph plus attention write-back.
///
/// Implementations must be thread-safe (`Send + Sync`) to be shared as
/// `Arc<dyn AtomStore>`. Mutating the store while a shell build or a
/// forward pass is running is not supported.
pub trait AtomStore: Send + Sync {
    /// Get an atom by handle, or `None` if it is not registered.
    fn get_atom(&self, handle: Handle) -> Option<Atom>;

    /// All handles, in creation order.
    fn all_atoms(&self) -> Vec<Handle>;

    /// Truth value of an atom, if one was recorded.
    fn truth_value(&self, handle: Handle) -> Option<TruthValue>;

    /// Attention value of an atom, if one was recorded.
    fn attention_value(&self, handle: Handle) -> Option<AttentionValue>;

    /// Overwrite the attention value of an atom.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the atom does not exist.
    fn set_attention_value(&self, handle: Handle, value: AttentionValue) -> Result<()>;

    /// Whether `handle` names a registered atom.
    fn contains(&self, handle: Handle) -> bool {
        self.get_atom(handle).is_some()
    }
}
