//! Reachability over implicit graphs.

use std::collections::HashSet;
use std::hash::Hash;

/// A graph given by its successor function.
pub trait Successors<N> {
    fn successors(&self, node: &N) -> Vec<N>;
}

impl<N, F> Successors<N> for F
where
    F: Fn(&N) -> Vec<N>,
{
    fn successors(&self, node: &N) -> Vec<N> {
        self(node)
    }
}

/// Whether `target` can be reached from `start` (a node reaches itself).
pub fn is_reachable<N, G>(graph: &G, start: N, target: &N) -> bool
where
    N: Clone + Eq + Hash,
    G: Successors<N> + ?Sized,
{
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(node) = stack.pop() {
        if &node == target {
            return true;
        }
        if visited.insert(node.clone()) {
            stack.extend(graph.successors(&node));
        }
    }

    false
}

/// All nodes reachable from `roots`, roots included.
pub fn descendants<N, G>(graph: &G, roots: impl IntoIterator<Item = N>) -> HashSet<N>
where
    N: Clone + Eq + Hash,
    G: Successors<N> + ?Sized,
{
    let mut visited = HashSet::new();
    let mut stack: Vec<N> = roots.into_iter().collect();

    while let Some(node) = stack.pop() {
        if visited.insert(node.clone()) {
            stack.extend(graph.successors(&node));
        }
    }

    visited
}
