use std::time::Instant;
use log::{debug, trace};
use rand::Rng;
use rand::seq::IndexedRandom;
use crate::error::{HyperPlayError, Result};
use crate::joint_move::{random_joint_move, JointMove};
use crate::likelihood::LikelihoodTree;
use crate::model::Model;
use crate::utils::*;

/// Outcome of one move selection
#[derive(Debug, Clone)]
pub struct Selection<G: Game> {
    pub best: G::Move,
    /// Accumulated weighted goal per candidate, in candidate order
    pub scores: Vec<(G::Move, Reward)>,
    /// Full passes over every (hypergame, move) pair
    pub probes: usize,
    pub rollouts: usize,
}

impl<G: Game> Selection<G> {
    /// Score per completed pass, what the telemetry records
    pub fn average_scores(&self) -> Vec<(G::Move, Reward)> {
        let probes = self.probes.max(1) as Reward;
        self.scores.iter().map(|(m, s)| (m.clone(), s / probes)).collect()
    }
}

/// P(M) for every hypergame: the inverse of its choice factor, normalised.
/// Hypergames that needed more coincidences to happen count for less
pub fn weights<G: Game>(tree: &LikelihoodTree, bag: &[Model<G>]) -> Vec<Probability> {
    let inverse: Vec<Probability> = bag.iter()
        .map(|m| {
            let cf = tree.choice_factor(m.prefix_path());
            debug_assert_eq!(cf, m.choice_factor(), "choice factor mismatch at {:x}", m.action_path_hash());
            1.0 / cf
        })
        .collect();
    let total: Probability = inverse.iter().sum();
    inverse.into_iter().map(|w| w / total).collect()
}

/// Play `first` for `role` from `state`, then uniformly random joint moves until the game ends.
/// None if `first` is not legal there
pub fn rollout<G: Game, R: Rng>(game: &G, state: &G::State, role: &G::Role, first: &G::Move, rng: &mut R) -> Result<Option<Goal>> {
    if !game.legal_moves(state, role).contains(first) {
        return Ok(None);
    }
    let mut opening = Vec::new();
    for r in game.roles() {
        let mv = if &r == role {
            first.clone()
        } else {
            game.legal_moves(state, &r).choose(rng).cloned()
                .ok_or_else(|| HyperPlayError::OracleFault(format!("{:?} has no legal move in {:?}", r, state)))?
        };
        opening.push((r, mv));
    }
    let mut state = game.successor(state, &JointMove::new(opening));
    while !game.is_terminal(&state) {
        let joint = random_joint_move(game, &state, rng)
            .ok_or_else(|| HyperPlayError::OracleFault(format!("non-terminal state without joint moves: {:?}", state)))?;
        state = game.successor(&state, &joint);
    }
    Ok(Some(game.goal(&state, role)))
}

// ---------- Selector ----------
/// Anytime weighted Monte-Carlo move choice over the bag
pub struct Selector {
    max_num_probes: usize,
    deadline: Instant,
}

impl Selector {
    pub fn new(max_num_probes: usize, deadline: Instant) -> Self {
        Self { max_num_probes, deadline }
    }

    /// Rollout every candidate from every hypergame, pass after pass, until the probe cap or the deadline.
    /// A pass cut short by the deadline is thrown away and the completed ones decide.
    /// None when there is nothing to choose from
    pub fn select<G: Game, R: Rng>(&self, game: &G, role: &G::Role, bag: &[Model<G>], tree: &LikelihoodTree,
                                   legal: &[G::Move], rng: &mut R) -> Result<Option<Selection<G>>> {
        if legal.is_empty() {
            return Ok(None);
        }
        let weights = weights(tree, bag);
        let mut scores: Vec<Reward> = vec![0.0; legal.len()];
        let (mut probes, mut rollouts) = (0, 0);

        'probing: while probes < self.max_num_probes {
            // A pass only counts once every candidate has had its rollout in every hypergame
            let mut pass: Vec<Reward> = vec![0.0; legal.len()];
            for (model, &weight) in bag.iter().zip(&weights) {
                for (i, candidate) in legal.iter().enumerate() {
                    if Instant::now() >= self.deadline {
                        debug!("deadline hit after {} probes and {} rollouts", probes, rollouts);
                        break 'probing;
                    }
                    if let Some(goal) = rollout(game, model.current_state(), role, candidate, rng)? {
                        pass[i] += goal as Reward * weight;
                    }
                    rollouts += 1;
                }
            }
            for (score, gained) in scores.iter_mut().zip(pass) {
                *score += gained;
            }
            probes += 1;
            trace!("probe {}: {:?}", probes, scores);
        }

        // First maximum wins ties
        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        Ok(Some(Selection {
            best: legal[best].clone(),
            scores: legal.iter().cloned().zip(scores).collect(),
            probes,
            rollouts,
        }))
    }
}
