//! AtomSpace data models.
//!
//! ## Identity
//! - [`Handle`]: opaque atom identifier assigned by the store
//!
//! ## Structure
//! - [`AtomType`] / [`Atom`]: nodes and links (hyperedges) with their
//!   outgoing set and the derived incoming set
//!
//! ## Annotations
//! - [`TruthValue`]: (strength, confidence) in [0, 1]²
//! - [`AttentionValue`]: STI, LTI and the sticky VLTI flag

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Handle
// ============================================================================

/// Unique identifier for an atom, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for Handle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Handle)
            .map_err(|e| format!("Invalid handle '{}': {}", s, e))
    }
}

// ============================================================================
// Atom types
// ============================================================================

/// Type tag of an atom. Node types carry a name; link types carry an
/// outgoing set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    ConceptNode,
    PredicateNode,
    NumberNode,
    VariableNode,
    ListLink,
    EvaluationLink,
    InheritanceLink,
    SimilarityLink,
    MemberLink,
    ImplicationLink,
    AndLink,
    OrLink,
}

impl AtomType {
    pub fn is_link(&self) -> bool {
        !self.is_node()
    }

    pub fn is_node(&self) -> bool {
        matches!(
            self,
            Self::ConceptNode | Self::PredicateNode | Self::NumberNode | Self::VariableNode
        )
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConceptNode => "ConceptNode",
            Self::PredicateNode => "PredicateNode",
            Self::NumberNode => "NumberNode",
            Self::VariableNode => "VariableNode",
            Self::ListLink => "ListLink",
            Self::EvaluationLink => "EvaluationLink",
            Self::InheritanceLink => "InheritanceLink",
            Self::SimilarityLink => "SimilarityLink",
            Self::MemberLink => "MemberLink",
            Self::ImplicationLink => "ImplicationLink",
            Self::AndLink => "AndLink",
            Self::OrLink => "OrLink",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for AtomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ConceptNode" => Ok(Self::ConceptNode),
            "PredicateNode" => Ok(Self::PredicateNode),
            "NumberNode" => Ok(Self::NumberNode),
            "VariableNode" => Ok(Self::VariableNode),
            "ListLink" => Ok(Self::ListLink),
            "EvaluationLink" => Ok(Self::EvaluationLink),
            "InheritanceLink" => Ok(Self::InheritanceLink),
            "SimilarityLink" => Ok(Self::SimilarityLink),
            "MemberLink" => Ok(Self::MemberLink),
            "ImplicationLink" => Ok(Self::ImplicationLink),
            "AndLink" => Ok(Self::AndLink),
            "OrLink" => Ok(Self::OrLink),
            _ => Err(format!("Unknown atom type: {}", s)),
        }
    }
}

// ============================================================================
// Atom
// ============================================================================

/// A hypergraph element as seen through the accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub handle: Handle,
    pub atom_type: AtomType,
    /// Present for nodes, absent for links
    pub name: Option<String>,
    /// Ordered members (empty for nodes)
    pub outgoing: Vec<Handle>,
    /// Links whose outgoing set contains this atom, in creation order
    pub incoming: Vec<Handle>,
}

impl Atom {
    pub fn is_link(&self) -> bool {
        self.atom_type.is_link()
    }

    pub fn arity(&self) -> usize {
        self.outgoing.len()
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// Epistemic status of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    pub strength: f64,
    pub confidence: f64,
}

impl TruthValue {
    /// Both components are clamped to [0, 1].
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Attention-economy annotation of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttentionValue {
    /// Short-term importance
    pub sti: f64,
    /// Long-term importance
    pub lti: f64,
    /// Very-long-term (sticky) flag
    pub vlti: bool,
}

impl AttentionValue {
    pub fn new(sti: f64, lti: f64, vlti: bool) -> Self {
        Self { sti, lti, vlti }
    }
}
