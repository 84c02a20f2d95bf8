use std::collections::{HashMap, HashSet};
use crate::utils::*;

// ---------- Likelihood Tree ----------
/// A node of the shared tree over action paths
#[derive(Debug, Clone)]
pub struct LikelihoodNode {
    value: usize,  // Largest branching factor any hypergame has seen leaving this node
    children: HashSet<PathHash>,
}

impl LikelihoodNode {
    /// Nothing has been sampled out of a fresh node, so it counts as a single choice
    fn new() -> Self { Self { value: 1, children: HashSet::new() } }

    pub fn value(&self) -> usize { self.value }

    pub fn children(&self) -> &HashSet<PathHash> { &self.children }

    pub fn set_value_max(&mut self, branching: usize) {
        self.value = self.value.max(branching);
    }
}

/// Records how many joint moves were available at every node any hypergame has passed through.
/// A single model can undercount a node (moves claimed by other models at the time are hidden from it),
/// so weights are taken from here instead.
/// Stored as an arena keyed by path hash; a node's children are the keys one move further down.
#[derive(Debug, Clone)]
pub struct LikelihoodTree {
    root: PathHash,
    nodes: HashMap<PathHash, LikelihoodNode>,
}

impl LikelihoodTree {
    pub fn new(root: PathHash) -> Self {
        Self { root, nodes: HashMap::from([(root, LikelihoodNode::new())]) }
    }

    pub fn root(&self) -> PathHash { self.root }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Walk from the root along `path` (the prefix hashes of a model, root first), creating what is missing
    pub fn get_or_create_node(&mut self, path: &[PathHash]) -> &mut LikelihoodNode {
        debug_assert!(path.first().map_or(true, |&h| h == self.root), "path does not start at the root");
        let mut key = self.root;
        for &child in path.iter().skip(1) {
            self.nodes.entry(key).or_insert_with(LikelihoodNode::new).children.insert(child);
            key = child;
        }
        self.nodes.entry(key).or_insert_with(LikelihoodNode::new)
    }

    pub fn node(&self, path: &[PathHash]) -> Option<&LikelihoodNode> {
        let mut key = self.root;
        for &child in path.iter().skip(1) {
            if !self.nodes.get(&key)?.children.contains(&child) { return None; }
            key = child;
        }
        self.nodes.get(&key)
    }

    /// Product of the recorded values along the path. Nodes never visited count as 1
    pub fn choice_factor(&self, path: &[PathHash]) -> ChoiceFactor {
        let root = self.nodes.get(&self.root).map_or(1, |n| n.value);
        path.iter().skip(1)
            .map(|h| self.nodes.get(h).map_or(1, |n| n.value))
            .fold(root as ChoiceFactor, |acc, v| acc * v as ChoiceFactor)
    }
}
