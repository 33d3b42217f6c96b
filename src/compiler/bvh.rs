//! Generic BVH builder.
//!
//! Builds a binary spatial hierarchy over anything that exposes a
//! bounding box and a centroid, emitting a linear node array. The
//! builder never inspects the concrete item type; leaf payloads are
//! written by a caller-supplied callback that receives the statically
//! typed sub-list of items landing in each leaf.
//!
//! The subtree root is always the FIRST node of the returned array
//! (its slot is reserved before recursing), so a caller appending the
//! array at `offset` can address the subtree by `offset` alone.
//!
//! Child indices in the returned array are local to this build. Callers
//! merging several arrays into one must rebase every node by the
//! destination length before appending
//! ([`BvhNode::offset_child_nodes`]).

use std::cmp::Ordering;

use crate::math::{Aabb, Vec3};
use crate::scene::BvhNode;

/// Anything the builder can partition: a bounding box and a centroid.
pub trait Bounded {
    fn bounds(&self) -> Aabb;
    fn centroid(&self) -> Vec3;
}

/// Build a BVH over `items` with at least `min_items_per_leaf` items in
/// every leaf, threading an accumulator through the leaf callbacks.
///
/// A subset is split only when both halves can still hold the minimum,
/// so leaves span between `min_items_per_leaf` and
/// `2 * min_items_per_leaf - 1` items; the sole exception is an input
/// smaller than the minimum, which becomes one undersized leaf.
///
/// `on_leaf` is invoked exactly once per created leaf with the node,
/// the items it spans and the current accumulator, in left-to-right
/// build order; the callback owns writing the leaf payload
/// ([`BvhNode::set_primitives`] or [`BvhNode::set_instance`]) and
/// returns the advanced accumulator, which comes back to the caller
/// with the node array. Callers without running state pass `()`.
///
/// Splits are deterministic: longest axis of the subset bounds, stable
/// sort by centroid along that axis (ties keep input order), cut at the
/// median. Identical input produces a bit-identical array.
pub fn build_bvh<T, A, F>(
    mut items: Vec<T>,
    min_items_per_leaf: usize,
    acc: A,
    mut on_leaf: F,
) -> (Vec<BvhNode>, A)
where
    T: Bounded,
    F: FnMut(&mut BvhNode, &[T], A) -> A,
{
    let mut nodes = Vec::new();
    if items.is_empty() {
        return (nodes, acc);
    }
    let (_, acc) = build_node(&mut nodes, &mut items, min_items_per_leaf, acc, &mut on_leaf);
    (nodes, acc)
}

/// Recursively partition `items`, returning the index of the subtree
/// root inside `nodes` plus the threaded accumulator.
fn build_node<T, A, F>(
    nodes: &mut Vec<BvhNode>,
    items: &mut [T],
    min_items_per_leaf: usize,
    acc: A,
    on_leaf: &mut F,
) -> (u32, A)
where
    T: Bounded,
    F: FnMut(&mut BvhNode, &[T], A) -> A,
{
    let mut bounds = Aabb::EMPTY;
    for item in items.iter() {
        bounds.expand_by_box(&item.bounds());
    }

    // Splitting a subset smaller than twice the minimum would produce
    // an undersized half, so it terminates here.
    if items.len() < min_items_per_leaf.max(1) * 2 {
        let mut node = BvhNode::new(bounds);
        let acc = on_leaf(&mut node, items, acc);
        nodes.push(node);
        return ((nodes.len() - 1) as u32, acc);
    }

    // Reserve the parent slot up front so the subtree root lands at the
    // lowest index, before either child sub-array.
    let index = nodes.len();
    nodes.push(BvhNode::new(bounds));

    // Stable sort keeps input order for equal centroids, which pins the
    // split down for reproducible output.
    let axis = bounds.longest_axis();
    items.sort_by(|a, b| {
        a.centroid()[axis]
            .partial_cmp(&b.centroid()[axis])
            .unwrap_or(Ordering::Equal)
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);
    let (left, acc) = build_node(nodes, left_items, min_items_per_leaf, acc, on_leaf);
    let (right, acc) = build_node(nodes, right_items, min_items_per_leaf, acc, on_leaf);

    nodes[index].set_child_nodes(left, right);
    (index as u32, acc)
}
