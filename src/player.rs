use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use crate::belief::{union_into, BeliefState};
use crate::config::AgentConfig;
use crate::error::{HyperPlayError, Result};
use crate::joint_move::joint_moves_with;
use crate::selector::{Selection, Selector};
use crate::telemetry::{Telemetry, TurnRecord};
use crate::utils::*;

/// What a match runner drives. One instance plays one role per match
pub trait Agent<G: Game> {
    fn name(&self) -> String;

    fn game_start(&mut self, match_id: &str, role: G::Role, playclock_ms: u64, params: &[(String, String)]) -> Result<()>;

    /// `last_move` is what this agent played last turn, None on the first turn
    fn game_play(&mut self, percepts: Percepts<G>, last_move: Option<G::Move>) -> Result<G::Move>;

    fn game_stop(&mut self) {}
}

/// Everything that only lives for one match
struct Session<G: Game> {
    match_id: String,
    role: G::Role,
    playclock_ms: u64,
    belief: BeliefState<G>,
}

impl<G: Game> Session<G> {
    fn start(game: &G, match_id: &str, role: G::Role, playclock_ms: u64, config: &AgentConfig) -> Self {
        let initial = game.initial_percepts(&role);
        let belief = BeliefState::new(game, role.clone(), initial, config);
        Self { match_id: match_id.to_string(), role, playclock_ms, belief }
    }

    /// Feed in the last turn and return what we could play now.
    /// When rebuilding the bag runs out of time, falls back to the moves legal after
    /// our own move from wherever the previous hypergames stood
    fn advance(&mut self, game: &G, percepts: Percepts<G>, last_move: Option<G::Move>,
               rng: &mut StdRng, deadline: Instant) -> Result<Vec<G::Move>> {
        match last_move {
            Some(mv) => {
                let before: Vec<Rc<G::State>> = self.belief.bag().iter().map(|m| m.current_state().clone()).collect();
                match self.belief.update(game, percepts, mv.clone(), rng, deadline) {
                    Err(HyperPlayError::DeadlinePressure { step }) => {
                        let legal = moves_after(game, &self.role, &before, &mv);
                        if legal.is_empty() {
                            return Err(HyperPlayError::DeadlinePressure { step });
                        }
                        warn!("{}: out of time at step {}, guessing from {} stale hypergames", self.match_id, step, before.len());
                        Ok(legal)
                    }
                    other => other,
                }
            }
            None if self.belief.step() == 0 => {
                self.belief.observe_initial(game, percepts);
                Ok(self.belief.legal_moves(game))
            }
            None => Err(HyperPlayError::MissingAction { step: self.belief.step() }),
        }
    }
}

/// Moves `role` has one step past any of `states` once it plays `own`
fn moves_after<G: Game>(game: &G, role: &G::Role, states: &[Rc<G::State>], own: &G::Move) -> Vec<G::Move> {
    let mut legal = vec![];
    for state in states {
        for joint in joint_moves_with(game, state, role, own) {
            union_into(&mut legal, game.legal_moves(&game.successor(state, &joint), role));
        }
    }
    legal
}

fn seeded(config: &AgentConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Fixed seeds still differ from match to match
fn match_seed(seed: u64, match_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    match_id.hash(&mut hasher);
    hasher.finish()
}

fn start_session<G: Game>(game: &G, config: &mut AgentConfig, rng: &mut StdRng, match_id: &str, role: G::Role,
                          playclock_ms: u64, params: &[(String, String)]) -> Result<Session<G>> {
    for (key, value) in params {
        config.apply_option(key, value)?;
    }
    if let Some(seed) = config.seed {
        *rng = StdRng::seed_from_u64(match_seed(seed, match_id));
    }
    info!("{}: starting as {:?} with {}ms playclock", match_id, role, playclock_ms);
    Ok(Session::start(game, match_id, role, playclock_ms, config))
}

// ---------- HyperPlay ----------
/// Keeps a bag of hypergames consistent with everything it has seen and
/// picks the move with the best likelihood-weighted rollout score across them
pub struct HyperPlayer<G: Game> {
    name: String,
    game: G,
    config: AgentConfig,
    rng: StdRng,
    telemetry: Option<Telemetry>,
    session: Option<Session<G>>,
    last_selection: Option<Selection<G>>,
}

impl<G: Game> HyperPlayer<G> {
    pub fn new(game: G, config: AgentConfig) -> Self {
        Self::named("HyperPlayer", game, config)
    }

    /// Full-information variant: one hypergame, lots of probes
    pub fn cheat(game: G, config: &AgentConfig) -> Self {
        let config = AgentConfig { seed: config.seed, telemetry_dir: config.telemetry_dir.clone(), ..AgentConfig::cheat() };
        Self::named("CheatPlayer", game, config)
    }

    fn named(name: &str, game: G, config: AgentConfig) -> Self {
        let rng = seeded(&config);
        let telemetry = config.telemetry_dir.as_ref().map(Telemetry::new);
        Self { name: name.to_string(), game, config, rng, telemetry, session: None, last_selection: None }
    }

    pub fn config(&self) -> &AgentConfig { &self.config }

    pub fn belief(&self) -> Option<&BeliefState<G>> {
        self.session.as_ref().map(|s| &s.belief)
    }

    /// Scores behind the most recent move
    pub fn last_selection(&self) -> Option<&Selection<G>> { self.last_selection.as_ref() }

    fn play_turn(&mut self, session: &mut Session<G>, percepts: Percepts<G>, last_move: Option<G::Move>) -> Result<G::Move> {
        let start = Instant::now();
        let deadline = self.config.turn_deadline(start, session.playclock_ms);
        let legal = session.advance(&self.game, percepts, last_move, &mut self.rng, deadline)?;
        let update_ms = start.elapsed().as_millis();

        let selecting = Instant::now();
        let selection = Selector::new(self.config.max_num_probes, deadline)
            .select(&self.game, &session.role, session.belief.bag(), session.belief.sampler().tree(), &legal, &mut self.rng)?
            .ok_or(HyperPlayError::NoLegalMoves { step: session.belief.step() })?;
        let select_ms = selecting.elapsed().as_millis();

        info!("step {}: {} plays {:?} after {} probes over {} hypergames",
              session.belief.step(), self.name, selection.best, selection.probes, session.belief.bag().len());
        if let Err(e) = self.record(session, &selection, update_ms, select_ms) {
            warn!("could not write telemetry: {}", e);
        }
        let best = selection.best.clone();
        self.last_selection = Some(selection);
        Ok(best)
    }

    fn record(&self, session: &Session<G>, selection: &Selection<G>, update_ms: u128, select_ms: u128) -> Result<()> {
        let Some(telemetry) = &self.telemetry else { return Ok(()); };
        let step = session.belief.step();
        telemetry.append_turn(&TurnRecord {
            match_id: session.match_id.clone(),
            game: self.game.name(),
            step,
            role: format!("{:?}", session.role),
            player: self.name.clone(),
            bag_size: session.belief.bag().len(),
            probes: selection.probes,
            update_ms,
            select_ms,
            chosen: format!("{:?}", selection.best),
            rollouts: selection.rollouts,
            forwards: session.belief.sampler().forwards(),
        })?;
        let distribution: Vec<(String, Reward)> = selection.average_scores().into_iter()
            .map(|(mv, score)| (format!("{:?}", mv), score))
            .collect();
        telemetry.write_distribution(&session.match_id, step, &distribution)
    }
}

impl<G: Game> Agent<G> for HyperPlayer<G> {
    fn name(&self) -> String { self.name.clone() }

    fn game_start(&mut self, match_id: &str, role: G::Role, playclock_ms: u64, params: &[(String, String)]) -> Result<()> {
        let session = start_session(&self.game, &mut self.config, &mut self.rng, match_id, role, playclock_ms, params)?;
        self.session = Some(session);
        self.last_selection = None;
        Ok(())
    }

    fn game_play(&mut self, percepts: Percepts<G>, last_move: Option<G::Move>) -> Result<G::Move> {
        let mut session = self.session.take().ok_or(HyperPlayError::NotStarted)?;
        let result = self.play_turn(&mut session, percepts, last_move);
        self.session = Some(session);
        result
    }

    fn game_stop(&mut self) {
        if let Some(session) = self.session.take() {
            info!("{}: {} finished after {} steps", session.match_id, self.name, session.belief.step());
        }
    }
}

// ---------- Random ----------
/// Baseline: tracks a single hypergame and plays any move it allows
pub struct RandomPlayer<G: Game> {
    game: G,
    config: AgentConfig,
    rng: StdRng,
    session: Option<Session<G>>,
}

impl<G: Game> RandomPlayer<G> {
    pub fn new(game: G, config: &AgentConfig) -> Self {
        let config = AgentConfig { num_hypergames: 1, num_branches: 1, ..config.clone() };
        let rng = seeded(&config);
        Self { game, config, rng, session: None }
    }
}

impl<G: Game> Agent<G> for RandomPlayer<G> {
    fn name(&self) -> String { "RandomPlayer".to_string() }

    fn game_start(&mut self, match_id: &str, role: G::Role, playclock_ms: u64, params: &[(String, String)]) -> Result<()> {
        let session = start_session(&self.game, &mut self.config, &mut self.rng, match_id, role, playclock_ms, params)?;
        self.session = Some(session);
        Ok(())
    }

    fn game_play(&mut self, percepts: Percepts<G>, last_move: Option<G::Move>) -> Result<G::Move> {
        let start = Instant::now();
        let session = self.session.as_mut().ok_or(HyperPlayError::NotStarted)?;
        let deadline = self.config.turn_deadline(start, session.playclock_ms);
        let legal = session.advance(&self.game, percepts, last_move, &mut self.rng, deadline)?;
        legal.choose(&mut self.rng).cloned().ok_or(HyperPlayError::NoLegalMoves { step: session.belief.step() })
    }

    fn game_stop(&mut self) {
        self.session = None;
    }
}

// ---------- Factory ----------
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PlayerKind {
    HyperPlay,
    Cheat,
    Random,
}

impl Display for PlayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlayerKind::HyperPlay => "hyper-play",
            PlayerKind::Cheat => "cheat",
            PlayerKind::Random => "random",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PlayerKind {
    type Err = HyperPlayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hyperplay" | "hyper-play" => Ok(PlayerKind::HyperPlay),
            "cheat" => Ok(PlayerKind::Cheat),
            "random" => Ok(PlayerKind::Random),
            other => Err(HyperPlayError::Config(format!("unknown player kind {:?}", other))),
        }
    }
}

pub fn build_agent<G: Game + 'static>(kind: PlayerKind, game: G, config: &AgentConfig) -> Box<dyn Agent<G>> {
    match kind {
        PlayerKind::HyperPlay => Box::new(HyperPlayer::new(game, config.clone())),
        PlayerKind::Cheat => Box::new(HyperPlayer::cheat(game, config)),
        PlayerKind::Random => Box::new(RandomPlayer::new(game, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rps::{Rps, RpsMove, RpsPercept, RpsRole};
    use std::collections::BTreeSet;

    fn seeded_config() -> AgentConfig {
        AgentConfig { seed: Some(17), max_num_probes: 4, ..AgentConfig::default() }
    }

    #[test]
    fn play_before_start_fails() {
        let mut player = HyperPlayer::new(Rps::new(2), seeded_config());
        assert!(matches!(player.game_play(BTreeSet::new(), None), Err(HyperPlayError::NotStarted)));
    }

    #[test]
    fn plays_legal_moves_through_a_match() {
        let mut player = HyperPlayer::new(Rps::new(2), seeded_config());
        player.game_start("m", RpsRole::Left, 60_000, &[]).unwrap();
        let first = player.game_play(BTreeSet::new(), None).unwrap();
        let percept = if first == RpsMove::Rock { RpsPercept::Drew { round: 0 } } else { RpsPercept::Lost { round: 0 } };
        let second = player.game_play(BTreeSet::from([percept]), Some(first)).unwrap();
        assert!([RpsMove::Rock, RpsMove::Paper, RpsMove::Scissors].contains(&second));
        let belief = player.belief().unwrap();
        assert_eq!(belief.step(), 1);
        assert_eq!(belief.bag().len(), 1);
        assert_eq!(player.last_selection().unwrap().probes, 4);
        player.game_stop();
        assert!(player.belief().is_none());
    }

    #[test]
    fn params_override_config() {
        let mut player = HyperPlayer::new(Rps::new(2), seeded_config());
        let params = vec![("maxNumProbes".to_string(), "2".to_string()), ("numHypergames".to_string(), "3".to_string())];
        player.game_start("m", RpsRole::Right, 60_000, &params).unwrap();
        assert_eq!(player.config().max_num_probes, 2);
        assert_eq!(player.config().num_hypergames, 3);
        player.game_play(BTreeSet::new(), None).unwrap();
        assert_eq!(player.last_selection().unwrap().probes, 2);
    }

    #[test]
    fn missing_last_move_after_first_turn() {
        let mut player = RandomPlayer::new(Rps::new(3), &seeded_config());
        player.game_start("m", RpsRole::Left, 60_000, &[]).unwrap();
        player.game_play(BTreeSet::new(), None).unwrap();
        player.game_play(BTreeSet::from([RpsPercept::Drew { round: 0 }]), Some(RpsMove::Rock)).unwrap();
        assert!(matches!(player.game_play(BTreeSet::new(), None), Err(HyperPlayError::MissingAction { step: 1 })));
    }

    #[test]
    fn first_turn_uses_the_delivered_percepts() {
        let mut player = HyperPlayer::new(Rps::new(2), seeded_config());
        player.game_start("m", RpsRole::Left, 60_000, &[]).unwrap();
        let given = BTreeSet::from([RpsPercept::Won { round: 9 }]);
        player.game_play(given.clone(), None).unwrap();
        let belief = player.belief().unwrap();
        assert_eq!(belief.sampler().percepts_at(0).unwrap(), &given);
        assert_eq!(belief.bag().len(), 1);
        assert_eq!(belief.bag()[0].percepts()[0].as_ref(), &given);
    }

    #[test]
    fn answers_even_when_recovery_runs_out_of_time() {
        let config = AgentConfig { seed: Some(5), num_hypergames: 1, num_branches: 1, max_num_probes: 2, ..AgentConfig::default() };
        let mut player = HyperPlayer::new(Rps::new(3), config);
        // The play buffer eats the whole clock, so every deadline has already passed
        player.game_start("m", RpsRole::Left, 0, &[]).unwrap();
        player.game_play(BTreeSet::new(), None).unwrap();
        player.game_play(BTreeSet::from([RpsPercept::Won { round: 0 }]), Some(RpsMove::Rock)).unwrap();
        let mv = player.game_play(BTreeSet::from([RpsPercept::Lost { round: 7 }]), Some(RpsMove::Rock)).unwrap();
        assert!([RpsMove::Rock, RpsMove::Paper, RpsMove::Scissors].contains(&mv));
        let belief = player.belief().unwrap();
        assert_eq!(belief.step(), 2);
        assert!(belief.bag().is_empty());
    }

    #[test]
    fn moves_after_applies_our_move_first() {
        let game = Rps::new(1);
        let start = Rc::new(game.initial_state());
        assert!(moves_after(&game, &RpsRole::Left, &[start.clone()], &RpsMove::Rock).is_empty());
        let game = Rps::new(2);
        assert_eq!(moves_after(&game, &RpsRole::Left, &[start], &RpsMove::Rock).len(), 3);
    }

    #[test]
    fn fixed_seed_varies_by_match() {
        assert_eq!(match_seed(17, "rps-0"), match_seed(17, "rps-0"));
        assert_ne!(match_seed(17, "rps-0"), match_seed(17, "rps-1"));
        let play = |match_id: &str| {
            let mut player = RandomPlayer::new(Rps::new(8), &seeded_config());
            player.game_start(match_id, RpsRole::Left, 60_000, &[]).unwrap();
            let (mut percepts, mut last) = (BTreeSet::new(), None);
            let mut moves = vec![];
            for round in 0..8u8 {
                let mv = player.game_play(percepts, last).unwrap();
                moves.push(mv);
                percepts = BTreeSet::from([RpsPercept::Drew { round }]);
                last = Some(mv);
            }
            moves
        };
        assert_eq!(play("rps-0"), play("rps-0"));
    }

    #[test]
    fn factory_and_names() {
        let config = seeded_config();
        assert_eq!(build_agent(PlayerKind::HyperPlay, Rps::new(1), &config).name(), "HyperPlayer");
        assert_eq!(build_agent(PlayerKind::Cheat, Rps::new(1), &config).name(), "CheatPlayer");
        assert_eq!(build_agent(PlayerKind::Random, Rps::new(1), &config).name(), "RandomPlayer");
        let cheat = HyperPlayer::cheat(Rps::new(1), &config);
        assert_eq!(cheat.config().num_hypergames, 1);
        assert_eq!(cheat.config().seed, Some(17));
        assert_eq!("Hyper-Play".parse::<PlayerKind>().unwrap(), PlayerKind::HyperPlay);
        assert!("minimax".parse::<PlayerKind>().is_err());
    }
}
