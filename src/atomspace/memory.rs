//! In-memory AtomSpace.
//!
//! Stores atoms behind a single `std::sync::RwLock`, keeps the incoming
//! sets in sync on link creation, and deduplicates nodes by `(type, name)`
//! and links by `(type, outgoing)`. Named atoms are indexed by name and
//! unnamed ones by outgoing set, whatever their type says.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::models::{Atom, AtomType, AttentionValue, Handle, TruthValue};
use super::traits::AtomStore;
use crate::error::{HypershellError, Result};

#[derive(Debug, Default)]
struct Inner {
    atoms: HashMap<Handle, Atom>,
    order: Vec<Handle>,
    truth: HashMap<Handle, TruthValue>,
    attention: HashMap<Handle, AttentionValue>,
    nodes_by_name: HashMap<(AtomType, String), Handle>,
    links_by_outgoing: HashMap<(AtomType, Vec<Handle>), Handle>,
    next_handle: u64,
}

impl Inner {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        Handle(self.next_handle)
    }

    fn insert(&mut self, atom: Atom) {
        let handle = atom.handle;
        match &atom.name {
            Some(name) => {
                self.nodes_by_name
                    .insert((atom.atom_type, name.clone()), handle);
            }
            None => {
                self.links_by_outgoing
                    .insert((atom.atom_type, atom.outgoing.clone()), handle);
            }
        }
        self.order.push(handle);
        self.atoms.insert(handle, atom);
    }
}

/// Serializable image of an [`AtomSpace`]. Handles are preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtomSpaceSnapshot {
    /// Atoms in creation order
    pub atoms: Vec<Atom>,
    pub truth_values: Vec<(Handle, TruthValue)>,
    pub attention_values: Vec<(Handle, AttentionValue)>,
}

/// In-memory hypergraph store.
#[derive(Debug, Default)]
pub struct AtomSpace {
    inner: RwLock<Inner>,
}

impl AtomSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a node, or return the existing handle for `(atom_type, name)`.
    pub fn add_node(&self, atom_type: AtomType, name: impl Into<String>) -> Handle {
        let name = name.into();
        let mut inner = self.write();
        if let Some(&existing) = inner.nodes_by_name.get(&(atom_type, name.clone())) {
            return existing;
        }
        let handle = inner.allocate();
        inner.insert(Atom {
            handle,
            atom_type,
            name: Some(name),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        handle
    }

    /// Add a link over `outgoing`, or return the existing handle for
    /// `(atom_type, outgoing)`.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if any member is not registered.
    pub fn add_link(&self, atom_type: AtomType, outgoing: Vec<Handle>) -> Result<Handle> {
        let mut inner = self.write();
        if let Some(missing) = outgoing.iter().find(|h| !inner.atoms.contains_key(*h)) {
            return Err(HypershellError::InvalidHandle(*missing));
        }
        if let Some(&existing) = inner.links_by_outgoing.get(&(atom_type, outgoing.clone())) {
            return Ok(existing);
        }

        let handle = inner.allocate();
        let mut seen = Vec::with_capacity(outgoing.len());
        for member in &outgoing {
            if seen.contains(member) {
                continue;
            }
            seen.push(*member);
            if let Some(atom) = inner.atoms.get_mut(member) {
                atom.incoming.push(handle);
            }
        }
        inner.insert(Atom {
            handle,
            atom_type,
            name: None,
            outgoing,
            incoming: Vec::new(),
        });
        Ok(handle)
    }

    pub fn set_truth_value(&self, handle: Handle, value: TruthValue) -> Result<()> {
        let mut inner = self.write();
        if !inner.atoms.contains_key(&handle) {
            return Err(HypershellError::InvalidHandle(handle));
        }
        inner.truth.insert(handle, value);
        Ok(())
    }

    /// Look up a node by type and name.
    pub fn find_node(&self, atom_type: AtomType, name: &str) -> Option<Handle> {
        self.read()
            .nodes_by_name
            .get(&(atom_type, name.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> AtomSpaceSnapshot {
        let inner = self.read();
        let atoms: Vec<Atom> = inner
            .order
            .iter()
            .filter_map(|h| inner.atoms.get(h).cloned())
            .collect();
        let truth_values = inner
            .order
            .iter()
            .filter_map(|h| inner.truth.get(h).map(|tv| (*h, *tv)))
            .collect();
        let attention_values = inner
            .order
            .iter()
            .filter_map(|h| inner.attention.get(h).map(|av| (*h, *av)))
            .collect();
        AtomSpaceSnapshot {
            atoms,
            truth_values,
            attention_values,
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if a handle appears twice, a link refers to an atom
    /// that is not part of the snapshot, or an annotation targets an
    /// unknown atom.
    pub fn from_snapshot(snapshot: AtomSpaceSnapshot) -> Result<Self> {
        let mut inner = Inner::default();
        for atom in &snapshot.atoms {
            inner.next_handle = inner.next_handle.max(atom.handle.0);
        }
        let mut known = HashSet::with_capacity(snapshot.atoms.len());
        for atom in &snapshot.atoms {
            if !known.insert(atom.handle) {
                return Err(HypershellError::InvalidHandle(atom.handle));
            }
        }

        for atom in snapshot.atoms {
            if let Some(missing) = atom.outgoing.iter().find(|h| !known.contains(*h)) {
                return Err(HypershellError::InvalidHandle(*missing));
            }
            inner.insert(atom);
        }
        for (handle, tv) in snapshot.truth_values {
            if !known.contains(&handle) {
                return Err(HypershellError::InvalidHandle(handle));
            }
            inner.truth.insert(handle, tv);
        }
        for (handle, av) in snapshot.attention_values {
            if !known.contains(&handle) {
                return Err(HypershellError::InvalidHandle(handle));
            }
            inner.attention.insert(handle, av);
        }

        debug!("Restored atomspace with {} atoms", inner.order.len());
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}

impl AtomSpace {
    /// Encode the current contents as a JSON snapshot.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Rebuild a store from [`to_json`](Self::to_json) output.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }
}

impl AtomStore for AtomSpace {
    fn get_atom(&self, handle: Handle) -> Option<Atom> {
        self.read().atoms.get(&handle).cloned()
    }

    fn all_atoms(&self) -> Vec<Handle> {
        self.read().order.clone()
    }

    fn truth_value(&self, handle: Handle) -> Option<TruthValue> {
        self.read().truth.get(&handle).copied()
    }

    fn attention_value(&self, handle: Handle) -> Option<AttentionValue> {
        self.read().attention.get(&handle).copied()
    }

    fn set_attention_value(&self, handle: Handle, value: AttentionValue) -> Result<()> {
        let mut inner = self.write();
        if !inner.atoms.contains_key(&handle) {
            return Err(HypershellError::InvalidHandle(handle));
        }
        inner.attention.insert(handle, value);
        Ok(())
    }

    fn contains(&self, handle: Handle) -> bool {
        self.read().atoms.contains_key(&handle)
    }
}
