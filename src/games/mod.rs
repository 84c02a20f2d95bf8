//! # Game Implementations
//!
//! Demo games for the agent, both with hidden information:
//! - **Rock-Paper-Scissors**: simultaneous throws, only the round outcome is seen
//! - **Krieg Tic-Tac-Toe**: blind placement, only your own successes and failures are seen

pub mod rps;
pub mod krieg_tictactoe;
