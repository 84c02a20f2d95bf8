//! # Rock-Paper-Scissors
//!
//! Demo game. Both roles throw simultaneously for a fixed number of rounds and only learn
//! whether they won, lost or drew the round, never the opponent's throw.

use std::collections::BTreeSet;
use crate::joint_move::JointMove;
use crate::utils::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum RpsMove { Rock, Paper, Scissors }

impl RpsMove {
    pub fn beats(self, other: RpsMove) -> bool {
        matches!((self, other),
            (RpsMove::Rock, RpsMove::Scissors) |
            (RpsMove::Scissors, RpsMove::Paper) |
            (RpsMove::Paper, RpsMove::Rock))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum RpsRole { Left, Right }

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum RpsPercept {
    Won { round: u8 },
    Lost { round: u8 },
    Drew { round: u8 },
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct RpsState {
    pub round: u8,
    pub left_wins: u8,
    pub right_wins: u8,
}

#[derive(Clone, Debug)]
pub struct Rps {
    rounds: u8,
}

impl Rps {
    pub fn new(rounds: u8) -> Self { Self { rounds } }

    fn throws(joint: &JointMove<Self>) -> (RpsMove, RpsMove) {
        let left = joint.get(&RpsRole::Left).copied().unwrap_or(RpsMove::Rock);
        let right = joint.get(&RpsRole::Right).copied().unwrap_or(RpsMove::Rock);
        (left, right)
    }
}

impl Default for Rps {
    fn default() -> Self { Self::new(3) }
}

impl Game for Rps {
    type State = RpsState;
    type Move = RpsMove;
    type Role = RpsRole;
    type Percept = RpsPercept;

    fn name(&self) -> String { format!("rps{}", self.rounds) }

    fn initial_state(&self) -> Self::State { RpsState::default() }

    fn roles(&self) -> Vec<Self::Role> { vec![RpsRole::Left, RpsRole::Right] }

    fn legal_moves(&self, state: &Self::State, _role: &Self::Role) -> Vec<Self::Move> {
        if self.is_terminal(state) { return vec![]; }
        vec![RpsMove::Rock, RpsMove::Paper, RpsMove::Scissors]
    }

    fn successor(&self, state: &Self::State, joint: &JointMove<Self>) -> Self::State {
        let (left, right) = Self::throws(joint);
        let mut s = state.clone();
        s.round += 1;
        if left.beats(right) { s.left_wins += 1; }
        if right.beats(left) { s.right_wins += 1; }
        s
    }

    fn sees(&self, state: &Self::State, role: &Self::Role, joint: &JointMove<Self>) -> Percepts<Self> {
        let (left, right) = Self::throws(joint);
        let (mine, theirs) = match role {
            RpsRole::Left => (left, right),
            RpsRole::Right => (right, left),
        };
        let round = state.round;
        let percept = if mine.beats(theirs) {
            RpsPercept::Won { round }
        } else if theirs.beats(mine) {
            RpsPercept::Lost { round }
        } else {
            RpsPercept::Drew { round }
        };
        BTreeSet::from([percept])
    }

    fn is_terminal(&self, state: &Self::State) -> bool { state.round >= self.rounds }

    fn goal(&self, state: &Self::State, role: &Self::Role) -> Goal {
        let (mine, theirs) = match role {
            RpsRole::Left => (state.left_wins, state.right_wins),
            RpsRole::Right => (state.right_wins, state.left_wins),
        };
        match mine.cmp(&theirs) {
            std::cmp::Ordering::Greater => 100,
            std::cmp::Ordering::Equal => 50,
            std::cmp::Ordering::Less => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &Rps, state: &RpsState, left: RpsMove, right: RpsMove) -> RpsState {
        let joint = JointMove::new(vec![(RpsRole::Left, left), (RpsRole::Right, right)]);
        game.successor(state, &joint)
    }

    #[test]
    fn rps_new_game() {
        let game = Rps::new(2);
        let s = game.initial_state();
        assert!(!game.is_terminal(&s));
        assert_eq!(game.legal_moves(&s, &RpsRole::Left).len(), 3);
        assert_eq!(game.goal(&s, &RpsRole::Left), 50);
    }

    #[test]
    fn rps_percepts_hide_opponent_throw() {
        let game = Rps::new(1);
        let s = game.initial_state();
        let a = JointMove::new(vec![(RpsRole::Left, RpsMove::Rock), (RpsRole::Right, RpsMove::Scissors)]);
        let b = JointMove::new(vec![(RpsRole::Left, RpsMove::Paper), (RpsRole::Right, RpsMove::Rock)]);
        // Different throws, same view for the winner
        assert_eq!(game.sees(&s, &RpsRole::Left, &a), game.sees(&s, &RpsRole::Left, &b));
        assert_eq!(game.sees(&s, &RpsRole::Right, &a), BTreeSet::from([RpsPercept::Lost { round: 0 }]));
    }

    #[test]
    fn rps_goals_after_rounds() {
        let game = Rps::new(2);
        let s = game.initial_state();
        let s = play(&game, &s, RpsMove::Rock, RpsMove::Scissors);
        let s = play(&game, &s, RpsMove::Rock, RpsMove::Rock);
        assert!(game.is_terminal(&s));
        assert_eq!(game.goal(&s, &RpsRole::Left), 100);
        assert_eq!(game.goal(&s, &RpsRole::Right), 0);
        assert!(game.legal_moves(&s, &RpsRole::Left).is_empty());
    }
}
