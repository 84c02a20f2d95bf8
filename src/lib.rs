//! # HyperPlay
//!
//! An agent for imperfect-information general games. It keeps a bag of hypergames, each a
//! perfect-information history that agrees with everything the agent has seen, and picks the
//! move with the best rollout score across them, weighted by how likely each history is.

pub mod games;
pub mod utils;
pub mod error;
pub mod config;
pub mod joint_move;
pub mod model;
pub mod registry;
pub mod likelihood;
pub mod sampler;
pub mod belief;
pub mod selector;
pub mod telemetry;
pub mod player;
pub mod arena;


pub use error::{HyperPlayError, Result};
