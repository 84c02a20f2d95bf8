use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use crate::joint_move::JointMove;
use crate::utils::*;

/// Hash of the action path before anything has been played
pub const EMPTY_PATH: PathHash = 0xcbf2_9ce4_8422_2325;

/// Chain one more joint move onto a path hash. Folding this over a path gives its hash,
/// so the hash of a path depends on nothing but the moves in it
pub fn extend_hash<G: Game>(prev: PathHash, joint: &Option<JointMove<G>>) -> PathHash {
    let mut hasher = DefaultHasher::new();
    prev.hash(&mut hasher);
    joint.hash(&mut hasher);
    hasher.finish()
}

pub fn path_hash<G: Game>(actions: &[Option<JointMove<G>>]) -> PathHash {
    actions.iter().fold(EMPTY_PATH, |h, j| extend_hash(h, j))
}

// ---------- Model ----------
/// A single hypergame: one perfect-information history the agent believes could be the real one.
/// Entry k holds the joint move played at step k (none at step 0), the state it produced,
/// what the agent would have seen, and how many joint moves were on offer at the time.
pub struct Model<G: Game> {
    actions: Vec<Option<JointMove<G>>>,
    states: Vec<Rc<G::State>>,
    percepts: Vec<Rc<Percepts<G>>>,
    branching: Vec<usize>,
    hashes: Vec<PathHash>,  // hashes[k] = hash(actions[..=k])
}

impl<G: Game> Model<G> {
    pub fn new() -> Self {
        Self { actions: vec![], states: vec![], percepts: vec![], branching: vec![], hashes: vec![] }
    }

    /// Start a hypergame at the initial state with the percepts the agent was given
    pub fn from_initial(game: &G, role: &G::Role, initial_percepts: Percepts<G>) -> Self {
        let mut model = Self::new();
        let state = Rc::new(game.initial_state());
        model.push(game, 0, Some(initial_percepts), None, &state, role, 1);
        model
    }

    /// Apply a joint move (or nothing at step 0) and record what the agent would see
    pub fn push(&mut self, game: &G, step: Step, initial_percepts: Option<Percepts<G>>,
                joint: Option<JointMove<G>>, state_before: &Rc<G::State>, role: &G::Role, branching: usize) {
        assert_eq!(step, self.len(), "pushing step {} onto a model of length {}", step, self.len());
        let (state, percepts) = match &joint {
            Some(j) => (Rc::new(game.successor(state_before, j)), game.sees(state_before, role, j)),
            None => (state_before.clone(), initial_percepts.unwrap_or_default()),
        };
        let hash = extend_hash(self.action_path_hash(), &joint);
        self.actions.push(joint);
        self.states.push(state);
        self.percepts.push(Rc::new(percepts));
        self.branching.push(branching);
        self.hashes.push(hash);
    }

    /// Undo the latest step
    pub fn pop(&mut self) {
        assert!(!self.is_empty(), "cannot pop an empty model");
        self.actions.pop();
        self.states.pop();
        self.percepts.pop();
        self.branching.pop();
        self.hashes.pop();
    }

    // ---------- Getters --------- //
    pub fn len(&self) -> usize { self.actions.len() }

    pub fn is_empty(&self) -> bool { self.actions.is_empty() }

    /// Hash of the whole action path; the key of the node this model sits on
    pub fn action_path_hash(&self) -> PathHash {
        self.hashes.last().copied().unwrap_or(EMPTY_PATH)
    }

    /// Hash of the action path minus its last move; the parent node
    pub fn previous_action_path_hash(&self) -> PathHash {
        match self.hashes.len() {
            0 | 1 => EMPTY_PATH,
            n => self.hashes[n - 2],
        }
    }

    /// Path from the likelihood tree root to this model's node
    pub fn prefix_path(&self) -> &[PathHash] { &self.hashes }

    pub fn current_state(&self) -> &Rc<G::State> {
        self.states.last().expect("empty model has no state")
    }

    pub fn latest_percepts(&self) -> &Percepts<G> {
        self.percepts.last().expect("empty model has no percepts")
    }

    /// The joint move that led to the current state. None at the root
    pub fn last_action(&self) -> Option<&JointMove<G>> {
        self.actions.last().and_then(|j| j.as_ref())
    }

    pub fn actions(&self) -> &[Option<JointMove<G>>] { &self.actions }

    pub fn states(&self) -> &[Rc<G::State>] { &self.states }

    pub fn percepts(&self) -> &[Rc<Percepts<G>>] { &self.percepts }

    pub fn branching_factors(&self) -> &[usize] { &self.branching }

    /// Product of the branching factors along the path
    pub fn choice_factor(&self) -> ChoiceFactor {
        self.branching.iter().fold(1.0, |acc, &b| acc * b as ChoiceFactor)
    }

    /// What the agent could play if this hypergame were the truth
    pub fn legal_moves(&self, game: &G, role: &G::Role) -> Vec<G::Move> {
        game.legal_moves(self.current_state(), role)
    }
}

impl<G: Game> Default for Model<G> {
    fn default() -> Self { Self::new() }
}

impl<G: Game> Clone for Model<G> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            states: self.states.clone(),
            percepts: self.percepts.clone(),
            branching: self.branching.clone(),
            hashes: self.hashes.clone(),
        }
    }
}

impl<G: Game> Debug for Model<G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model({:x}, len={}, bf={:?}, actions={:?})",
               self.action_path_hash(), self.len(), self.branching, self.actions)
    }
}
