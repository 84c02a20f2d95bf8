use std::collections::{HashMap, HashSet};
use crate::joint_move::JointMove;
use crate::utils::*;

// ---------- Move Registry ----------
/// Per-node sets of joint moves, keyed by the action-path hash of the node they leave.
/// Used twice: once for moves known to fail (grows for the whole match) and once for
/// edges currently claimed by a live hypergame.
pub struct MoveRegistry<G: Game> {
    edges: HashMap<PathHash, HashSet<JointMove<G>>>,
}

impl<G: Game> MoveRegistry<G> {
    pub fn new() -> Self { Self { edges: HashMap::new() } }

    /// True if the move was not already there
    pub fn insert(&mut self, node: PathHash, joint: JointMove<G>) -> bool {
        self.edges.entry(node).or_default().insert(joint)
    }

    pub fn remove(&mut self, node: PathHash, joint: &JointMove<G>) -> bool {
        let Some(set) = self.edges.get_mut(&node) else { return false; };
        let removed = set.remove(joint);
        if set.is_empty() {
            self.edges.remove(&node);
        }
        removed
    }

    pub fn contains(&self, node: PathHash, joint: &JointMove<G>) -> bool {
        self.edges.get(&node).is_some_and(|set| set.contains(joint))
    }

    /// Drop every candidate registered at `node`. Returns how many were dropped
    pub fn filter(&self, node: PathHash, candidates: &mut Vec<JointMove<G>>) -> usize {
        let Some(set) = self.edges.get(&node) else { return 0; };
        let before = candidates.len();
        candidates.retain(|j| !set.contains(j));
        before - candidates.len()
    }

    pub fn moves_at(&self, node: PathHash) -> usize {
        self.edges.get(&node).map_or(0, |set| set.len())
    }

    /// Total number of registered edges
    pub fn len(&self) -> usize {
        self.edges.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool { self.edges.is_empty() }

    pub fn clear(&mut self) { self.edges.clear(); }
}

impl<G: Game> Default for MoveRegistry<G> {
    fn default() -> Self { Self::new() }
}
