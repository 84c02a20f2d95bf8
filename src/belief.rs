use std::time::Instant;
use log::{debug, error, info, warn};
use rand::Rng;
use crate::config::AgentConfig;
use crate::error::{HyperPlayError, Result};
use crate::model::Model;
use crate::sampler::Sampler;
use crate::utils::*;

// ---------- Belief State ----------
/// The bag of hypergames plus everything learnt about the match so far.
/// After every turn each hypergame in the bag is as long as the match and agrees with every percept seen.
pub struct BeliefState<G: Game> {
    role: G::Role,
    bag: Vec<Model<G>>,
    sampler: Sampler<G>,
    step: Step,
    num_hypergames: usize,
    num_branches: usize,
    recoveries: usize,
}

impl<G: Game> BeliefState<G> {
    /// Turn 0: a single hypergame sitting at the initial state
    pub fn new(game: &G, role: G::Role, initial_percepts: Percepts<G>, config: &AgentConfig) -> Self {
        let model = Model::from_initial(game, &role, initial_percepts.clone());
        let mut sampler = Sampler::new(role.clone(), model.action_path_hash());
        sampler.record_percepts(0, initial_percepts);
        Self {
            role,
            bag: vec![model],
            sampler,
            step: 0,
            num_hypergames: config.num_hypergames,
            num_branches: config.num_branches,
            recoveries: 0,
        }
    }

    pub fn bag(&self) -> &[Model<G>] { &self.bag }

    pub fn step(&self) -> Step { self.step }

    pub fn role(&self) -> &G::Role { &self.role }

    pub fn sampler(&self) -> &Sampler<G> { &self.sampler }

    /// Times the bag ran dry and was rebuilt from scratch
    pub fn recoveries(&self) -> usize { self.recoveries }

    /// Take the turn-0 percepts the runner actually delivered. Only meaningful before the first update
    pub fn observe_initial(&mut self, game: &G, percepts: Percepts<G>) {
        debug_assert_eq!(self.step, 0, "initial percepts after step 0");
        self.bag = vec![Model::from_initial(game, &self.role, percepts.clone())];
        self.sampler.record_percepts(0, percepts);
    }

    /// Every move the agent has in at least one hypergame, in first-seen order
    pub fn legal_moves(&self, game: &G) -> Vec<G::Move> {
        let mut legal = vec![];
        for model in &self.bag {
            union_into(&mut legal, model.legal_moves(game, &self.role));
        }
        legal
    }

    /// Bring every hypergame up to date with the move we just played and what we saw after it.
    /// Returns the moves legal in at least one surviving hypergame.
    pub fn update<R: Rng>(&mut self, game: &G, percepts: Percepts<G>, last_move: G::Move,
                          rng: &mut R, deadline: Instant) -> Result<Vec<G::Move>> {
        let step = self.step + 1;
        self.sampler.record_action(step - 1, last_move);
        self.sampler.record_percepts(step, percepts);
        self.sampler.reset_forwards();
        self.step = step;
        let target = step + 1;

        let seeds = std::mem::take(&mut self.bag);
        let total = seeds.len();
        for (i, mut model) in seeds.into_iter().enumerate() {
            let seed = model.clone();
            let (old_node, old_edge) = (model.previous_action_path_hash(), model.last_action().cloned());
            let advanced = self.sampler.forward_to(game, &mut model, target, rng)?;
            self.sampler.release(old_node, old_edge.as_ref());
            if !advanced {
                debug!("step {}: dropping hypergame {:x}", step, seed.action_path_hash());
                continue;
            }
            self.sampler.claim(&model);
            self.bag.push(model);

            // Seeds not yet visited still count towards the bag
            let pending = total - i - 1;
            for _ in 1..self.num_branches {
                if self.bag.len() + pending >= self.num_hypergames { break; }
                let mut branch = seed.clone();
                if !self.sampler.forward_to(game, &mut branch, target, rng)? { break; }
                self.sampler.claim(&branch);
                self.bag.push(branch);
            }
        }

        if self.bag.is_empty() {
            warn!("step {}: every hypergame died, rebuilding from the initial state", step);
            let model = self.recover(game, target, rng, deadline)?;
            self.sampler.claim(&model);
            self.bag.push(model);
        }
        self.check_choice_factors();
        info!("step {}: {} hypergames after {} forwards", step, self.bag.len(), self.sampler.forwards());
        Ok(self.legal_moves(game))
    }

    /// Sample brand new hypergames from step 0 until one reaches `target` or time runs out.
    /// A restart happens whenever sampling falls more than one step behind the furthest it got.
    /// With no claims left, a root with nothing to offer means no history fits at all
    fn recover<R: Rng>(&mut self, game: &G, target: usize, rng: &mut R, deadline: Instant) -> Result<Model<G>> {
        debug_assert!(self.sampler.in_use().is_empty(), "claims left over with an empty bag");
        let initial = self.sampler.percepts_at(0)?.clone();
        loop {
            if Instant::now() >= deadline {
                return Err(HyperPlayError::DeadlinePressure { step: self.step });
            }
            self.recoveries += 1;
            let mut model = Model::from_initial(game, &self.role, initial.clone());
            let (mut step, mut max_step) = (1, 1);
            while step < target {
                step = self.sampler.forward(game, &mut model, step, rng)?;
                max_step = max_step.max(step);
                if step == 0 || step + 1 < max_step || Instant::now() >= deadline { break; }
            }
            if step >= target {
                info!("recovered a hypergame after {} attempts", self.recoveries);
                return Ok(model);
            }
            if step == 0 {
                return Err(HyperPlayError::EmptyBag { step: self.step });
            }
        }
    }

    /// The shared tree and each model's own branching factors have to agree
    fn check_choice_factors(&self) {
        let tree = self.sampler.tree();
        for model in &self.bag {
            let (shared, own) = (tree.choice_factor(model.prefix_path()), model.choice_factor());
            if shared != own {
                error!("choice factor mismatch at {:x}: tree {} model {}", model.action_path_hash(), shared, own);
                debug_assert_eq!(shared, own);
            }
        }
    }
}

pub(crate) fn union_into<T: PartialEq>(acc: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !acc.contains(&item) {
            acc.push(item);
        }
    }
}
