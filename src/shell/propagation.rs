//! Value propagation across shells.
//!
//! Outward propagation walks shells root-first along BFS shell edges
//! (`depth → depth + 1` only); inward propagation walks leaves-first along
//! BFS parent links. When a slot already holds a value, the incoming value
//! is blended pairwise with it ([`Blend`]), so a node reached from several
//! parents ends up with an order-dependent mean rather than a running
//! average.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::info;

use super::builder::ShellBuilder;
use crate::atomspace::{AttentionValue, Handle};
use crate::error::Result;

/// Pairwise aggregation used when two propagated values meet in one slot.
pub trait Blend: Clone {
    fn blend(&self, other: &Self) -> Self;
}

impl Blend for f64 {
    fn blend(&self, other: &Self) -> Self {
        (self + other) / 2.0
    }
}

impl Blend for f32 {
    fn blend(&self, other: &Self) -> Self {
        (self + other) / 2.0
    }
}

/// Elementwise mean; the tail of the longer vector is kept as is.
impl Blend for Vec<f64> {
    fn blend(&self, other: &Self) -> Self {
        blend_slices(self, other, |a, b| (a + b) / 2.0)
    }
}

/// Elementwise mean; the tail of the longer vector is kept as is.
impl Blend for Vec<f32> {
    fn blend(&self, other: &Self) -> Self {
        blend_slices(self, other, |a, b| (a + b) / 2.0)
    }
}

fn blend_slices<T: Copy>(a: &[T], b: &[T], mean: impl Fn(T, T) -> T) -> Vec<T> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    long.iter()
        .enumerate()
        .map(|(i, &x)| match short.get(i) {
            Some(&y) => mean(x, y),
            None => x,
        })
        .collect()
}

fn blend_into<V: Blend>(values: &mut HashMap<Handle, V>, target: Handle, value: V) {
    match values.entry(target) {
        Entry::Occupied(mut slot) => {
            let blended = slot.get().blend(&value);
            slot.insert(blended);
        }
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
    }
}

impl ShellBuilder {
    /// Push a value from the root out to the deepest shell.
    ///
    /// `combine(value, from, to, depth)` maps the value held by `from` (at
    /// `depth`) to the contribution it sends to `to` (at `depth + 1`).
    /// Atoms that are never reached are absent from the result.
    pub fn propagate_outward<V, F>(&self, initial: V, mut combine: F) -> HashMap<Handle, V>
    where
        V: Blend,
        F: FnMut(&V, Handle, Handle, usize) -> V,
    {
        let mut values = HashMap::from([(self.root(), initial)]);

        for depth in 0..=self.max_depth() {
            for &handle in self.shell(depth) {
                let Some(current) = values.get(&handle).cloned() else {
                    continue;
                };
                for &neighbor in self.neighbors(handle) {
                    if self.node_depth(neighbor) != Some(depth + 1) {
                        continue;
                    }
                    let next = combine(&current, handle, neighbor, depth);
                    blend_into(&mut values, neighbor, next);
                }
            }
        }
        values
    }

    /// Pull values from the given atoms back toward the root.
    ///
    /// `combine(value, child, parent, depth)` maps the value held by `child`
    /// (at `depth`) to the contribution it sends to its BFS parent.
    pub fn propagate_inward<V, F>(
        &self,
        leaf_values: HashMap<Handle, V>,
        mut combine: F,
    ) -> HashMap<Handle, V>
    where
        V: Blend,
        F: FnMut(&V, Handle, Handle, usize) -> V,
    {
        let mut values = leaf_values;

        for depth in (0..=self.max_depth()).rev() {
            for &handle in self.shell(depth) {
                let Some(parent) = self.node_parent(handle) else {
                    continue;
                };
                let Some(current) = values.get(&handle).cloned() else {
                    continue;
                };
                let next = combine(&current, handle, parent, depth);
                blend_into(&mut values, parent, next);
            }
        }
        values
    }

    /// Spread the root's short-term importance outward with exponential
    /// attenuation and write the result back to the store.
    ///
    /// An atom at shell depth `d` receives `root_sti × factor^d`, independent
    /// of the STI it held before. The root's own value is left untouched;
    /// every other atom keeps its LTI and VLTI flag. A missing root STI
    /// reads as `0.0`.
    pub fn spread_attention(&self, attenuation_factor: f64) -> Result<HashMap<Handle, f64>> {
        let root = self.root();
        let root_sti = self
            .store
            .attention_value(root)
            .map(|av| av.sti)
            .unwrap_or(0.0);

        let values = self.propagate_outward(root_sti, |_, _, _, depth| {
            root_sti * attenuation_factor.powi(depth as i32 + 1)
        });

        let mut written = 0usize;
        for handle in self.all_nodes() {
            if handle == root {
                continue;
            }
            let Some(&sti) = values.get(&handle) else {
                continue;
            };
            let previous = self.store.attention_value(handle).unwrap_or_default();
            self.store.set_attention_value(
                handle,
                AttentionValue::new(sti, previous.lti, previous.vlti),
            )?;
            written += 1;
        }

        info!(
            "Spread attention from {} (sti {:.3}, factor {}) to {} atoms",
            root, root_sti, attenuation_factor, written
        );
        Ok(values)
    }
}
