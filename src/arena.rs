use log::{info, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use crate::error::{HyperPlayError, Result};
use crate::joint_move::JointMove;
use crate::player::Agent;
use crate::utils::*;

/// How one match ended
#[derive(Debug, Clone)]
pub struct MatchResult<G: Game> {
    pub goals: Vec<(G::Role, Goal)>,
    pub steps: Step,
    /// Turns where an agent failed or answered with an illegal move and was played for
    pub fallbacks: usize,
}

impl<G: Game> MatchResult<G> {
    pub fn goal(&self, role: &G::Role) -> Option<Goal> {
        self.goals.iter().find(|(r, _)| r == role).map(|(_, g)| *g)
    }
}

/// Play one match with `agents[i]` taking `game.roles()[i]`.
/// Each agent sees only its own percepts and its own previous move. An agent that errors or
/// answers with an illegal move gets a random legal move played for it
pub fn play_match<G: Game, R: Rng>(game: &G, agents: &mut [Box<dyn Agent<G>>], match_id: &str, playclock_ms: u64,
                                   params: &[(String, String)], rng: &mut R) -> Result<MatchResult<G>> {
    let roles = game.roles();
    if roles.len() != agents.len() {
        return Err(HyperPlayError::Config(format!("{} roles but {} agents", roles.len(), agents.len())));
    }
    for (role, agent) in roles.iter().zip(agents.iter_mut()) {
        agent.game_start(match_id, role.clone(), playclock_ms, params)?;
    }

    let mut state = game.initial_state();
    let mut percepts: Vec<Percepts<G>> = roles.iter().map(|r| game.initial_percepts(r)).collect();
    let mut last_moves: Vec<Option<G::Move>> = vec![None; roles.len()];
    let (mut step, mut fallbacks) = (0, 0);

    // Main loop
    while !game.is_terminal(&state) {
        let mut joint = Vec::with_capacity(roles.len());
        for (i, role) in roles.iter().enumerate() {
            let legal = game.legal_moves(&state, role);
            if legal.is_empty() {
                return Err(HyperPlayError::OracleFault(format!("{:?} has no legal move at step {}", role, step)));
            }
            let answer = agents[i].game_play(percepts[i].clone(), last_moves[i].take());
            let mv = match answer {
                Ok(mv) if legal.contains(&mv) => mv,
                other => {
                    match other {
                        Ok(mv) => warn!("{}: {} played illegal {:?} at step {}", match_id, agents[i].name(), mv, step),
                        Err(e) => warn!("{}: {} failed at step {}: {}", match_id, agents[i].name(), step, e),
                    }
                    fallbacks += 1;
                    legal.choose(rng).cloned().ok_or(HyperPlayError::NoLegalMoves { step })?
                }
            };
            joint.push((role.clone(), mv));
        }
        let joint = JointMove::new(joint);
        for (i, role) in roles.iter().enumerate() {
            percepts[i] = game.sees(&state, role, &joint);
            last_moves[i] = joint.get(role).cloned();
        }
        state = game.successor(&state, &joint);
        step += 1;
    }

    for agent in agents.iter_mut() {
        agent.game_stop();
    }
    let goals: Vec<(G::Role, Goal)> = roles.iter().map(|r| (r.clone(), game.goal(&state, r))).collect();
    info!("{}: {} finished after {} steps with {:?}", match_id, game.name(), step, goals);
    Ok(MatchResult { goals, steps: step, fallbacks })
}
