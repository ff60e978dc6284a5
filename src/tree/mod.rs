//! Rooted trees and their enumeration.
//!
//! - [`RootedTree`]: arena-backed rooted tree with depth buckets,
//!   traversals and parenthesis notation
//! - [`RootedTreeEnumerator`]: memoized count of unlabeled rooted trees

pub mod enumerator;
pub mod rooted;

pub use enumerator::{RootedTreeEnumerator, INTEGRALITY_TOLERANCE};
pub use rooted::{NodeId, RootedTree};
