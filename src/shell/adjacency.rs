//! Precomputed neighbor lists.
//!
//! `neighbors(h)` is the union of
//! 1. `h`'s own outgoing set (when `h` is a link), and
//! 2. every link `e` whose outgoing set contains `h`, followed by every other
//!    member of `e`'s outgoing set (co-participants).
//!
//! The index is built in a single scan over the store instead of rescanning
//! all atoms per lookup. Order is own outgoing first, then co-participants
//! in store scan order; duplicates and `h` itself are dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::atomspace::{AtomStore, Handle};

/// Handle → ordered, deduplicated neighbor list for one store snapshot.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    neighbors: HashMap<Handle, Vec<Handle>>,
}

impl AdjacencyIndex {
    pub fn build(store: &dyn AtomStore) -> Self {
        let handles = store.all_atoms();

        let mut own: HashMap<Handle, Vec<Handle>> = HashMap::with_capacity(handles.len());
        let mut shared: HashMap<Handle, Vec<Handle>> = HashMap::new();

        for &handle in &handles {
            let Some(atom) = store.get_atom(handle) else {
                continue;
            };
            if atom.outgoing.is_empty() {
                continue;
            }
            own.insert(handle, atom.outgoing.clone());

            // Each member sees the link, then the link's other members.
            let mut members_seen = HashSet::new();
            for &member in &atom.outgoing {
                if !members_seen.insert(member) {
                    continue;
                }
                let entry = shared.entry(member).or_default();
                entry.push(handle);
                entry.extend(atom.outgoing.iter().copied().filter(|&m| m != member));
            }
        }

        let mut neighbors = HashMap::with_capacity(handles.len());
        let mut edges = 0usize;
        for &handle in &handles {
            let mut seen = HashSet::new();
            seen.insert(handle);
            let list: Vec<Handle> = own
                .get(&handle)
                .into_iter()
                .flatten()
                .chain(shared.get(&handle).into_iter().flatten())
                .copied()
                .filter(|h| seen.insert(*h))
                .collect();
            edges += list.len();
            neighbors.insert(handle, list);
        }

        debug!(
            "Adjacency index built: {} atoms, {} directed neighbor entries",
            handles.len(),
            edges
        );
        Self { neighbors }
    }

    /// Neighbors of `handle`; empty for unknown or isolated handles.
    pub fn neighbors(&self, handle: Handle) -> &[Handle] {
        self.neighbors
            .get(&handle)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct neighbors of `handle`.
    pub fn degree(&self, handle: Handle) -> usize {
        self.neighbors(handle).len()
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::{AtomSpace, AtomType};

    #[test]
    fn test_isolated_node_has_no_neighbors() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a");
        let index = AdjacencyIndex::build(&space);
        assert!(index.neighbors(a).is_empty());
        assert!(index.neighbors(Handle(999)).is_empty());
    }

    #[test]
    fn test_link_and_co_participants() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a");
        let b = space.add_node(AtomType::ConceptNode, "b");
        let c = space.add_node(AtomType::ConceptNode, "c");
        let l = space.add_link(AtomType::ListLink, vec![a, b, c]).unwrap();

        let index = AdjacencyIndex::build(&space);
        assert_eq!(index.neighbors(l), &[a, b, c]);
        assert_eq!(index.neighbors(a), &[l, b, c]);
        assert_eq!(index.neighbors(b), &[l, a, c]);
        assert_eq!(index.degree(c), 3);
    }

    #[test]
    fn test_nested_links_and_dedup() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a");
        let b = space.add_node(AtomType::ConceptNode, "b");
        let l1 = space.add_link(AtomType::InheritanceLink, vec![a, b]).unwrap();
        let l2 = space.add_link(AtomType::SimilarityLink, vec![a, b]).unwrap();
        let outer = space.add_link(AtomType::ListLink, vec![l1, a]).unwrap();

        let index = AdjacencyIndex::build(&space);
        // b appears through both links but only once.
        assert_eq!(index.neighbors(a), &[l1, b, l2, outer]);
        // l1: own members first, then the link containing it and co-members.
        assert_eq!(index.neighbors(l1), &[a, b, outer]);
    }

    #[test]
    fn test_repeated_member_does_not_list_self() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a");
        let l = space.add_link(AtomType::ListLink, vec![a, a]).unwrap();
        let index = AdjacencyIndex::build(&space);
        assert_eq!(index.neighbors(a), &[l]);
        assert_eq!(index.neighbors(l), &[a]);
    }
}
