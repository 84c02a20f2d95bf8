use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use crate::joint_move::JointMove;

// ---------- Tune-ables ---------- //
pub const MAX_NUM_PROBES: usize = 16;  // Rollout passes over the bag per move
pub const CHEAT_MAX_NUM_PROBES: usize = 256;  // Fully resourced cheat player
pub const NUM_HYPERGAMES: usize = 10;  // Max bag size
pub const NUM_BRANCHES: usize = 20;  // Branches attempted per seed each turn
pub const PREFERRED_PLAY_BUFFER_MS: u64 = 1000;  // Kept back from the playclock to submit the move

// ---------- Basic types (renamed for pretty) ---------- //
pub type Reward = f64;
pub type Probability = f64;
pub type Goal = i32;  // Oracle goal value, usually 0-100
pub type Step = usize;
pub type PathHash = u64;  // Hash of an action path, the key of a likelihood node
pub type ChoiceFactor = f64;  // Product of branching factors, kept as float so long games don't overflow
pub type Percepts<G> = BTreeSet<<G as Game>::Percept>;

// ---------- Traits the game must provide ----------
/// Properties we want all moves, roles and states to have
pub trait ActionI: Clone + Eq + Hash + Debug {}
impl<T: Clone + Eq + Hash + Debug> ActionI for T {}
/// Percepts are additionally ordered so a set of them compares by value
pub trait PerceptI: ActionI + Ord {}
impl<T: ActionI + Ord> PerceptI for T {}

/// The game engine. Only ever asked about concrete (perfect-information) states;
/// the agent is responsible for guessing which of those it is in.
pub trait Game: Sized + Clone {
    /// A full world state. Treated as an immutable value
    type State: ActionI;
    /// What a single role can do
    type Move: ActionI;
    /// Who can act. Every role moves at every step (noop moves for turn-taking games)
    type Role: ActionI;
    /// A single private observation
    type Percept: PerceptI;

    /// Short name used in logs and telemetry
    fn name(&self) -> String;
    fn initial_state(&self) -> Self::State;
    /// Roles in the fixed order joint moves are laid out in
    fn roles(&self) -> Vec<Self::Role>;
    fn legal_moves(&self, state: &Self::State, role: &Self::Role) -> Vec<Self::Move>;
    /// Create the state after every role has played their part of the joint move
    fn successor(&self, state: &Self::State, joint: &JointMove<Self>) -> Self::State;
    /// What `role` privately observes when `joint` is played from `state`
    fn sees(&self, state: &Self::State, role: &Self::Role, joint: &JointMove<Self>) -> Percepts<Self>;
    fn is_terminal(&self, state: &Self::State) -> bool;
    /// Must be implemented at terminal states
    fn goal(&self, state: &Self::State, role: &Self::Role) -> Goal;
    /// What every role is told before the first move
    fn initial_percepts(&self, _role: &Self::Role) -> Percepts<Self> {
        BTreeSet::new()
    }
}
