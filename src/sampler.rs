use std::collections::HashMap;
use log::trace;
use rand::Rng;
use rand::seq::IndexedRandom;
use crate::error::{HyperPlayError, Result};
use crate::joint_move::{joint_moves_with, JointMove};
use crate::likelihood::LikelihoodTree;
use crate::model::Model;
use crate::registry::MoveRegistry;
use crate::utils::*;

// ---------- Sampler ----------
/// Everything the agent has learnt during the match, shared by every hypergame:
/// what it played, what it saw, which edges are dead or taken, and the likelihood tree.
/// Moves hypergames forward one step at a time, backtracking when they contradict what was seen.
pub struct Sampler<G: Game> {
    role: G::Role,
    actions: HashMap<Step, G::Move>,  // own move actually played at each step
    percepts: HashMap<Step, Percepts<G>>,  // percepts actually seen at each step
    bad_moves: MoveRegistry<G>,
    in_use: MoveRegistry<G>,
    tree: LikelihoodTree,
    forwards: usize,
}

impl<G: Game> Sampler<G> {
    pub fn new(role: G::Role, root: PathHash) -> Self {
        Self {
            role,
            actions: HashMap::new(),
            percepts: HashMap::new(),
            bad_moves: MoveRegistry::new(),
            in_use: MoveRegistry::new(),
            tree: LikelihoodTree::new(root),
            forwards: 0,
        }
    }

    // ---------- Trackers --------- //
    pub fn record_percepts(&mut self, step: Step, percepts: Percepts<G>) {
        self.percepts.insert(step, percepts);
    }

    pub fn record_action(&mut self, step: Step, action: G::Move) {
        self.actions.insert(step, action);
    }

    pub fn percepts_at(&self, step: Step) -> Result<&Percepts<G>> {
        self.percepts.get(&step).ok_or(HyperPlayError::MissingPercepts { step })
    }

    pub fn action_at(&self, step: Step) -> Result<&G::Move> {
        self.actions.get(&step).ok_or(HyperPlayError::MissingAction { step })
    }

    pub fn role(&self) -> &G::Role { &self.role }

    pub fn tree(&self) -> &LikelihoodTree { &self.tree }

    pub fn bad_moves(&self) -> &MoveRegistry<G> { &self.bad_moves }

    pub fn in_use(&self) -> &MoveRegistry<G> { &self.in_use }

    /// Forward calls since the last reset
    pub fn forwards(&self) -> usize { self.forwards }

    pub fn reset_forwards(&mut self) { self.forwards = 0; }

    // ---------- Sampling --------- //
    /// Try to extend `model` (currently `step` long) by one joint move that agrees with what was played and seen.
    /// Returns `step + 1` on success, `step` if the move tried contradicted the percepts (try again),
    /// or `step - 1` after backtracking out of an exhausted node. The root is never popped; exhausting it returns 0.
    pub fn forward<R: Rng>(&mut self, game: &G, model: &mut Model<G>, step: Step, rng: &mut R) -> Result<Step> {
        debug_assert!(step >= 1 && step == model.len(), "forwarding step {} of a model of length {}", step, model.len());
        self.forwards += 1;
        let state = model.current_state().clone();
        let own = self.action_at(step - 1)?.clone();
        let observed = self.percepts_at(step)?.clone();
        let node = model.action_path_hash();

        // Our own move has to have been legal in this world for it to be the real one
        let mut candidates = if game.legal_moves(&state, &self.role).contains(&own) {
            joint_moves_with(game, &state, &self.role, &own)
        } else {
            vec![]
        };
        let branching = candidates.len();
        self.bad_moves.filter(node, &mut candidates);
        self.tree.get_or_create_node(model.prefix_path()).set_value_max(branching);
        let claimed = self.in_use.filter(node, &mut candidates);

        let Some(joint) = candidates.choose(rng).cloned() else {
            return Ok(self.backtrack(model, step, claimed == 0));
        };
        model.push(game, step, None, Some(joint.clone()), &state, &self.role, branching);

        if model.latest_percepts() != &observed {
            trace!("step {}: {:?} contradicts percepts", step, joint);
            model.pop();
            self.bad_moves.insert(node, joint);
            return Ok(step);
        }
        self.tree.get_or_create_node(model.prefix_path());
        Ok(step + 1)
    }

    /// Step back out of a node with nothing left to try.
    /// Only condemn the edge into it when the node is exhausted, not when live hypergames hold the remaining edges
    fn backtrack(&mut self, model: &mut Model<G>, step: Step, exhausted: bool) -> Step {
        if model.len() <= 1 {
            return 0;
        }
        let last = model.last_action().cloned();
        model.pop();
        if let (true, Some(last)) = (exhausted, last) {
            trace!("step {}: condemning {:?}", step, last);
            self.bad_moves.insert(model.action_path_hash(), last);
        }
        step - 1
    }

    /// Forward until the model is `target` long. Gives up (false) as soon as it would have to
    /// backtrack past where it started, or reaches the root
    pub fn forward_to<R: Rng>(&mut self, game: &G, model: &mut Model<G>, target: usize, rng: &mut R) -> Result<bool> {
        let floor = model.len();
        let mut step = floor;
        while step < target {
            step = self.forward(game, model, step, rng)?;
            if step < floor || step == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Mark an edge as dead for every future hypergame
    pub fn condemn(&mut self, node: PathHash, joint: JointMove<G>) {
        self.bad_moves.insert(node, joint);
    }

    // ---------- In-use claims --------- //
    /// Claim the edge a model arrived by so no other hypergame duplicates it
    pub fn claim(&mut self, model: &Model<G>) {
        if let Some(joint) = model.last_action() {
            self.in_use.insert(model.previous_action_path_hash(), joint.clone());
        }
    }

    pub fn release(&mut self, node: PathHash, joint: Option<&JointMove<G>>) {
        if let Some(joint) = joint {
            self.in_use.remove(node, joint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rps::{Rps, RpsMove, RpsPercept, RpsRole};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn setup(rounds: u8) -> (Rps, Sampler<Rps>, Model<Rps>) {
        let game = Rps::new(rounds);
        let model = Model::from_initial(&game, &RpsRole::Left, BTreeSet::new());
        let mut sampler = Sampler::new(RpsRole::Left, model.action_path_hash());
        sampler.record_percepts(0, BTreeSet::new());
        (game, sampler, model)
    }

    #[test]
    fn forward_consistent_with_percepts() {
        let (game, mut sampler, mut model) = setup(3);
        let mut rng = StdRng::seed_from_u64(3);
        sampler.record_action(0, RpsMove::Rock);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Won { round: 0 }]));
        let mut step = 1;
        while step < 2 {
            step = sampler.forward(&game, &mut model, step, &mut rng).unwrap();
            assert!(step >= 1);
        }
        let last = model.last_action().unwrap();
        assert_eq!(last.get(&RpsRole::Left), Some(&RpsMove::Rock));
        assert_eq!(last.get(&RpsRole::Right), Some(&RpsMove::Scissors));
        assert_eq!(model.branching_factors(), &[1, 3]);
        assert_eq!(sampler.tree().choice_factor(model.prefix_path()), model.choice_factor());
    }

    #[test]
    fn contradiction_is_recorded_and_retried() {
        let (game, mut sampler, mut model) = setup(3);
        let mut rng = StdRng::seed_from_u64(5);
        sampler.record_action(0, RpsMove::Rock);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Drew { round: 0 }]));
        let root = model.action_path_hash();
        let mut retries = 0;
        let mut step = 1;
        while step < 2 {
            step = sampler.forward(&game, &mut model, step, &mut rng).unwrap();
            if step == 1 { retries += 1; }
        }
        assert!(retries <= 2);
        assert_eq!(sampler.bad_moves().moves_at(root), retries);
        assert_eq!(model.last_action().unwrap().get(&RpsRole::Right), Some(&RpsMove::Rock));
    }

    #[test]
    fn bad_moves_are_never_selected() {
        let (game, mut sampler, model) = setup(3);
        let root = model.action_path_hash();
        sampler.record_action(0, RpsMove::Paper);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Won { round: 0 }, RpsPercept::Lost { round: 0 }]));
        let rock = JointMove::new(vec![(RpsRole::Left, RpsMove::Paper), (RpsRole::Right, RpsMove::Rock)]);
        let paper = JointMove::new(vec![(RpsRole::Left, RpsMove::Paper), (RpsRole::Right, RpsMove::Paper)]);
        sampler.condemn(root, rock.clone());
        sampler.condemn(root, paper.clone());
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = model.clone();
        // Percepts can never match, so the one live edge is tried and condemned
        assert_eq!(sampler.forward(&game, &mut m, 1, &mut rng).unwrap(), 1);
        assert_eq!(m.len(), 1);
        assert_eq!(sampler.bad_moves().moves_at(root), 3);
        // Nothing left at the root, which is never popped
        assert_eq!(sampler.forward(&game, &mut m, 1, &mut rng).unwrap(), 0);
        assert_eq!(m.len(), 1);
        assert!(sampler.bad_moves().contains(root, &rock));
        assert_eq!(sampler.bad_moves().moves_at(root), 3);
    }

    #[test]
    fn exhausted_node_backtracks_one_step() {
        let (game, mut sampler, mut model) = setup(3);
        let mut rng = StdRng::seed_from_u64(9);
        sampler.record_action(0, RpsMove::Rock);
        sampler.record_action(1, RpsMove::Rock);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Drew { round: 0 }]));
        sampler.record_percepts(2, BTreeSet::from([RpsPercept::Won { round: 1 }]));
        assert!(sampler.forward_to(&game, &mut model, 2, &mut rng).unwrap());
        let parent = model.previous_action_path_hash();
        let edge = model.last_action().cloned().unwrap();
        // Kill every edge out of the current node
        let node = model.action_path_hash();
        for right in [RpsMove::Rock, RpsMove::Paper, RpsMove::Scissors] {
            sampler.condemn(node, JointMove::new(vec![(RpsRole::Left, RpsMove::Rock), (RpsRole::Right, right)]));
        }
        let before = model.clone();
        assert_eq!(sampler.forward(&game, &mut model, 2, &mut rng).unwrap(), 1);
        assert_eq!(model.len(), 1);
        assert_eq!(model.actions(), &before.actions()[..1]);
        assert!(sampler.bad_moves().contains(parent, &edge));
    }

    #[test]
    fn claimed_edges_are_skipped_but_not_condemned() {
        let (game, mut sampler, model) = setup(3);
        let mut rng = StdRng::seed_from_u64(1);
        sampler.record_action(0, RpsMove::Rock);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Drew { round: 0 }]));
        let mut first = model.clone();
        assert!(sampler.forward_to(&game, &mut first, 2, &mut rng).unwrap());
        sampler.claim(&first);
        // The only consistent edge is taken, so a second hypergame cannot follow it
        let mut second = model.clone();
        assert!(!sampler.forward_to(&game, &mut second, 2, &mut rng).unwrap());
        assert_eq!(second.len(), 1);
        assert!(!sampler.bad_moves().contains(model.action_path_hash(), first.last_action().unwrap()));
    }

    #[test]
    fn terminal_state_dead_ends() {
        let (game, mut sampler, mut model) = setup(1);
        let mut rng = StdRng::seed_from_u64(2);
        sampler.record_action(0, RpsMove::Rock);
        sampler.record_action(1, RpsMove::Rock);
        sampler.record_percepts(1, BTreeSet::from([RpsPercept::Drew { round: 0 }]));
        sampler.record_percepts(2, BTreeSet::new());
        assert!(sampler.forward_to(&game, &mut model, 2, &mut rng).unwrap());
        // Game is over, so nothing can follow
        assert!(!sampler.forward_to(&game, &mut model, 3, &mut rng).unwrap());
    }

    #[test]
    fn missing_percepts_is_an_error() {
        let (game, mut sampler, mut model) = setup(3);
        let mut rng = StdRng::seed_from_u64(2);
        sampler.record_action(0, RpsMove::Rock);
        assert!(matches!(sampler.forward(&game, &mut model, 1, &mut rng), Err(HyperPlayError::MissingPercepts { step: 1 })));
    }
}
