//! General-purpose rooted tree.
//!
//! Nodes live in an arena owned by the tree and are addressed by [`NodeId`].
//! Every id carries the identity of the tree that issued it, so passing a
//! node from one tree into another is rejected with `ForeignNode` instead of
//! silently addressing an unrelated slot.
//!
//! ## Notation
//!
//! `Display` renders parenthesis notation, `(value(child)(child(grandchild)))`;
//! leaves render as `(value)`. [`RootedTree::parse`] is the inverse for
//! string-valued trees: a value is everything up to the next `(` or `)`.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{HypershellError, Result};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node inside one specific [`RootedTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

impl NodeId {
    /// Position of the node in its tree's creation order (root = 0).
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct TreeNode<V> {
    value: V,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
}

/// Rooted tree with depth-indexed node buckets.
///
/// Invariants: `nodes_at_depth(d)` holds exactly the nodes whose depth is
/// `d`, in insertion order; node count is `1 + Σ children` transitively.
/// Nodes are never removed.
///
/// A clone is a new tree: it gets its own identity, so ids issued by the
/// copy are foreign to the original and vice versa.
#[derive(Debug)]
pub struct RootedTree<V> {
    id: u64,
    nodes: Vec<TreeNode<V>>,
    depth_index: Vec<Vec<usize>>,
}

impl<V: Clone> Clone for RootedTree<V> {
    fn clone(&self) -> Self {
        Self {
            id: next_tree_id(),
            nodes: self.nodes.clone(),
            depth_index: self.depth_index.clone(),
        }
    }
}

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

impl<V> RootedTree<V> {
    /// Create a tree holding only its root, at depth 0.
    pub fn new(root_value: V) -> Self {
        Self {
            id: next_tree_id(),
            nodes: vec![TreeNode {
                value: root_value,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
            depth_index: vec![vec![0]],
        }
    }

    pub fn root(&self) -> NodeId {
        self.id_of(0)
    }

    fn id_of(&self, index: usize) -> NodeId {
        NodeId {
            tree: self.id,
            index,
        }
    }

    fn check(&self, node: NodeId) -> Result<usize> {
        if node.tree != self.id || node.index >= self.nodes.len() {
            return Err(HypershellError::ForeignNode);
        }
        Ok(node.index)
    }

    /// Append a new last child under `parent`.
    ///
    /// # Errors
    ///
    /// `ForeignNode` if `parent` was issued by another tree.
    pub fn add_child(&mut self, parent: NodeId, value: V) -> Result<NodeId> {
        let parent_index = self.check(parent)?;
        let depth = self.nodes[parent_index].depth + 1;
        let index = self.nodes.len();

        self.nodes.push(TreeNode {
            value,
            parent: Some(parent_index),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent_index].children.push(index);
        if self.depth_index.len() <= depth {
            self.depth_index.push(Vec::new());
        }
        self.depth_index[depth].push(index);

        Ok(self.id_of(index))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest populated level (0 for a lone root).
    pub fn max_depth(&self) -> usize {
        self.depth_index.len() - 1
    }

    pub fn value(&self, node: NodeId) -> Result<&V> {
        Ok(&self.nodes[self.check(node)?].value)
    }

    pub fn depth(&self, node: NodeId) -> Result<usize> {
        Ok(self.nodes[self.check(node)?].depth)
    }

    /// Parent of `node`, `None` for the root.
    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        let index = self.check(node)?;
        Ok(self.nodes[index].parent.map(|p| self.id_of(p)))
    }

    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let index = self.check(node)?;
        Ok(self.nodes[index]
            .children
            .iter()
            .map(|&c| self.id_of(c))
            .collect())
    }

    /// Nodes at depth `d` in insertion order; empty when `d` is out of range.
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeId> {
        self.depth_index
            .get(depth)
            .map(|bucket| bucket.iter().map(|&i| self.id_of(i)).collect())
            .unwrap_or_default()
    }

    /// Pre-order depth-first traversal from the root.
    pub fn traverse_dfs<F>(&self, visit: F)
    where
        F: FnMut(NodeId, &V),
    {
        self.dfs_indices(0, visit);
    }

    /// Pre-order depth-first traversal of the subtree rooted at `start`.
    pub fn traverse_dfs_from<F>(&self, start: NodeId, visit: F) -> Result<()>
    where
        F: FnMut(NodeId, &V),
    {
        let start = self.check(start)?;
        self.dfs_indices(start, visit);
        Ok(())
    }

    fn dfs_indices<F>(&self, start: usize, mut visit: F)
    where
        F: FnMut(NodeId, &V),
    {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            visit(self.id_of(index), &self.nodes[index].value);
            // Reverse so the first child is popped first.
            stack.extend(self.nodes[index].children.iter().rev());
        }
    }

    /// Level-order traversal from the root.
    pub fn traverse_bfs<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &V),
    {
        let mut frontier = VecDeque::from([0usize]);
        while let Some(index) = frontier.pop_front() {
            visit(self.id_of(index), &self.nodes[index].value);
            frontier.extend(self.nodes[index].children.iter().copied());
        }
    }

    /// Nodes without children, in DFS pre-order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.traverse_dfs(|id, _| {
            if self.nodes[id.index].children.is_empty() {
                leaves.push(id);
            }
        });
        leaves
    }

    /// Path from the root down to `node`, both inclusive.
    pub fn path_to_root(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut index = Some(self.check(node)?);
        let mut path = Vec::new();
        while let Some(i) = index {
            path.push(self.id_of(i));
            index = self.nodes[i].parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Number of nodes in the subtree rooted at `node` (itself included).
    pub fn subtree_size(&self, node: NodeId) -> Result<usize> {
        let start = self.check(node)?;
        let mut size = 0;
        self.dfs_indices(start, |_, _| size += 1);
        Ok(size)
    }

    /// Height of the subtree rooted at `node`; a leaf has height 0.
    pub fn subtree_height(&self, node: NodeId) -> Result<usize> {
        let start = self.check(node)?;
        let base = self.nodes[start].depth;
        let mut deepest = base;
        self.dfs_indices(start, |id, _| {
            deepest = deepest.max(self.nodes[id.index].depth);
        });
        Ok(deepest - base)
    }

    /// Number of nodes at each depth, shallowest first.
    pub fn depth_profile(&self) -> Vec<usize> {
        self.depth_index.iter().map(Vec::len).collect()
    }
}

impl<V: fmt::Display> RootedTree<V> {
    /// Parenthesis notation of the subtree rooted at `node`.
    pub fn render(&self, node: NodeId) -> Result<String> {
        let index = self.check(node)?;
        let mut out = String::new();
        self.render_into(index, &mut out);
        Ok(out)
    }

    fn render_into(&self, start: usize, out: &mut String) {
        enum Step {
            Open(usize),
            Close,
        }

        let mut stack = vec![Step::Open(start)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(index) => {
                    out.push('(');
                    out.push_str(&self.nodes[index].value.to_string());
                    stack.push(Step::Close);
                    let children = self.nodes[index].children.iter().rev();
                    stack.extend(children.map(|&c| Step::Open(c)));
                }
                Step::Close => out.push(')'),
            }
        }
    }
}

impl<V: fmt::Display> fmt::Display for RootedTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(0, &mut out);
        f.write_str(&out)
    }
}

// ============================================================================
// Parsing
// ============================================================================

impl RootedTree<String> {
    /// Parse parenthesis notation back into a tree.
    ///
    /// # Errors
    ///
    /// `Parse` on unbalanced parentheses, a missing root, or trailing input.
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let err = |position: usize, message: &str| HypershellError::Parse {
            position,
            message: message.to_string(),
        };

        if bytes.first() != Some(&b'(') {
            return Err(err(0, "expected '('"));
        }
        let (root_value, mut pos) = scan_value(s, 1);
        let mut tree = RootedTree::new(root_value);
        let mut open: Vec<NodeId> = vec![tree.root()];

        while pos < bytes.len() {
            match bytes[pos] {
                b'(' => {
                    let parent = *open
                        .last()
                        .ok_or_else(|| err(pos, "content after the root closed"))?;
                    let (value, next) = scan_value(s, pos + 1);
                    let child = tree.add_child(parent, value)?;
                    open.push(child);
                    pos = next;
                }
                b')' => {
                    if open.pop().is_none() {
                        return Err(err(pos, "unbalanced ')'"));
                    }
                    pos += 1;
                    if open.is_empty() && pos < bytes.len() {
                        return Err(err(pos, "trailing input after root"));
                    }
                }
                _ => return Err(err(pos, "unexpected text between nodes")),
            }
        }

        if !open.is_empty() {
            return Err(err(bytes.len(), "unclosed '('"));
        }
        Ok(tree)
    }
}

/// Read a node value starting at `start` up to the next `(` or `)`.
fn scan_value(s: &str, start: usize) -> (String, usize) {
    let end = s[start..]
        .find(['(', ')'])
        .map(|offset| start + offset)
        .unwrap_or(s.len());
    (s[start..end].to_string(), end)
}

impl FromStr for RootedTree<String> {
    type Err = HypershellError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
