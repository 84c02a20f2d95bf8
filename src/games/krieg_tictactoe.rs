//! # Krieg Tic-Tac-Toe
//!
//! Blind tic-tac-toe. Neither side sees the other's marks. Trying to mark a cell the
//! opponent already holds fails, reveals that cell and keeps the turn.

use std::collections::BTreeSet;
use crate::joint_move::JointMove;
use crate::utils::*;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], [3, 4, 5], [6, 7, 8],
    [0, 3, 6], [1, 4, 7], [2, 5, 8],
    [0, 4, 8], [2, 4, 6],
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum KriegRole { X, O }

impl KriegRole {
    pub fn other(self) -> Self {
        match self {
            KriegRole::X => KriegRole::O,
            KriegRole::O => KriegRole::X,
        }
    }

    fn index(self) -> usize {
        match self {
            KriegRole::X => 0,
            KriegRole::O => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum KriegMove {
    Mark(u8),
    Noop,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum KriegPercept {
    Placed { cell: u8 },
    Blocked { cell: u8 },
    OpponentPlaced,
    OpponentBlocked,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct KriegState {
    pub board: [Option<KriegRole>; 9],
    pub to_move: KriegRole,
    /// Opponent cells each role has bumped into, indexed by role
    pub revealed: [[bool; 9]; 2],
}

impl Default for KriegState {
    fn default() -> Self {
        Self { board: [None; 9], to_move: KriegRole::X, revealed: [[false; 9]; 2] }
    }
}

impl KriegState {
    pub fn winner(&self) -> Option<KriegRole> {
        LINES.iter().find_map(|&[a, b, c]| match self.board[a] {
            Some(p) if self.board[b] == Some(p) && self.board[c] == Some(p) => Some(p),
            _ => None,
        })
    }

    fn is_full(&self) -> bool { self.board.iter().all(|c| c.is_some()) }
}

#[derive(Clone, Debug, Default)]
pub struct KriegTicTacToe;

impl KriegTicTacToe {
    fn mover_cell(state: &KriegState, joint: &JointMove<Self>) -> Option<usize> {
        match joint.get(&state.to_move) {
            Some(KriegMove::Mark(cell)) => Some(*cell as usize),
            _ => None,
        }
    }
}

impl Game for KriegTicTacToe {
    type State = KriegState;
    type Move = KriegMove;
    type Role = KriegRole;
    type Percept = KriegPercept;

    fn name(&self) -> String { "krieg_tictactoe".to_string() }

    fn initial_state(&self) -> Self::State { KriegState::default() }

    fn roles(&self) -> Vec<Self::Role> { vec![KriegRole::X, KriegRole::O] }

    /// The mover may try any cell it does not hold and has not found the opponent on
    fn legal_moves(&self, state: &Self::State, role: &Self::Role) -> Vec<Self::Move> {
        if self.is_terminal(state) { return vec![]; }
        if *role != state.to_move { return vec![KriegMove::Noop]; }
        let revealed = &state.revealed[role.index()];
        (0..9)
            .filter(|&c| state.board[c] != Some(*role) && !revealed[c])
            .map(|c| KriegMove::Mark(c as u8))
            .collect()
    }

    fn successor(&self, state: &Self::State, joint: &JointMove<Self>) -> Self::State {
        let mut s = state.clone();
        let mover = state.to_move;
        let Some(cell) = Self::mover_cell(state, joint) else { return s; };
        match state.board[cell] {
            None => {
                s.board[cell] = Some(mover);
                s.to_move = mover.other();
            }
            Some(_) => s.revealed[mover.index()][cell] = true,
        }
        s
    }

    fn sees(&self, state: &Self::State, role: &Self::Role, joint: &JointMove<Self>) -> Percepts<Self> {
        let Some(cell) = Self::mover_cell(state, joint) else { return BTreeSet::new(); };
        let placed = state.board[cell].is_none();
        let percept = match (*role == state.to_move, placed) {
            (true, true) => KriegPercept::Placed { cell: cell as u8 },
            (true, false) => KriegPercept::Blocked { cell: cell as u8 },
            (false, true) => KriegPercept::OpponentPlaced,
            (false, false) => KriegPercept::OpponentBlocked,
        };
        BTreeSet::from([percept])
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner().is_some() || state.is_full()
    }

    fn goal(&self, state: &Self::State, role: &Self::Role) -> Goal {
        match state.winner() {
            Some(w) if w == *role => 100,
            Some(_) => 0,
            None => 50,
        }
    }
}
