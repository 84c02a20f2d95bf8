use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use rand::Rng;
use rand::seq::IndexedRandom;
use crate::utils::*;

// ---------- Joint Move ----------
/// One move for every role, laid out in the game's role order
pub struct JointMove<G: Game> {
    moves: Vec<(G::Role, G::Move)>,
}

impl<G: Game> JointMove<G> {
    pub fn new(moves: Vec<(G::Role, G::Move)>) -> Self { Self { moves } }

    /// The move a given role plays
    pub fn get(&self, role: &G::Role) -> Option<&G::Move> {
        self.moves.iter().find(|(r, _)| r == role).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(G::Role, G::Move)> { self.moves.iter() }

    pub fn len(&self) -> usize { self.moves.len() }

    pub fn is_empty(&self) -> bool { self.moves.is_empty() }
}

impl<G: Game> Clone for JointMove<G> {
    fn clone(&self) -> Self { Self { moves: self.moves.clone() } }
}
impl<G: Game> PartialEq for JointMove<G> {
    fn eq(&self, other: &Self) -> bool { self.moves == other.moves }
}
impl<G: Game> Eq for JointMove<G> {}
impl<G: Game> Hash for JointMove<G> {
    fn hash<H: Hasher>(&self, state: &mut H) { self.moves.hash(state) }
}
impl<G: Game> Debug for JointMove<G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.moves.iter()
            .map(|(r, m)| format!("{:?}: {:?}", r, m))
            .collect::<Vec<_>>()
            .join(", "))
    }
}

// ---------- Enumeration ----------
/// Every joint move from `state` (the unconstrained cross product of legal moves)
pub fn joint_moves<G: Game>(game: &G, state: &G::State) -> Vec<JointMove<G>> {
    let per_role = game.roles().into_iter()
        .map(|r| {
            let legal = game.legal_moves(state, &r);
            (r, legal)
        })
        .collect();
    cross_product(per_role)
}

/// Every joint move from `state` in which `fixed_role` plays `fixed_move`
pub fn joint_moves_with<G: Game>(game: &G, state: &G::State, fixed_role: &G::Role, fixed_move: &G::Move) -> Vec<JointMove<G>> {
    let per_role = game.roles().into_iter()
        .map(|r| {
            let moves = if &r == fixed_role { vec![fixed_move.clone()] } else { game.legal_moves(state, &r) };
            (r, moves)
        })
        .collect();
    cross_product(per_role)
}

/// Uniform sample over the cross product without building it. None if any role is stuck
pub fn random_joint_move<G: Game, R: Rng>(game: &G, state: &G::State, rng: &mut R) -> Option<JointMove<G>> {
    let mut moves = Vec::new();
    for r in game.roles() {
        let legal = game.legal_moves(state, &r);
        let m = legal.choose(rng)?.clone();
        moves.push((r, m));
    }
    Some(JointMove::new(moves))
}

/// First role varies slowest
fn cross_product<G: Game>(per_role: Vec<(G::Role, Vec<G::Move>)>) -> Vec<JointMove<G>> {
    let mut partials: Vec<Vec<(G::Role, G::Move)>> = vec![vec![]];
    for (role, moves) in per_role {
        let (role, moves) = (&role, &moves);
        partials = partials.into_iter()
            .flat_map(|p| moves.iter().map(move |m| {
                let mut next = p.clone();
                next.push((role.clone(), m.clone()));
                next
            }).collect::<Vec<_>>())
            .collect();
    }
    partials.into_iter().map(JointMove::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rps::{Rps, RpsMove, RpsRole};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn unconstrained_is_full_cross_product() {
        let game = Rps::new(1);
        let state = game.initial_state();
        let all = joint_moves(&game, &state);
        assert_eq!(all.len(), 9);
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn fixing_a_role_restricts_to_singleton() {
        let game = Rps::new(1);
        let state = game.initial_state();
        let fixed = joint_moves_with(&game, &state, &RpsRole::Left, &RpsMove::Paper);
        assert_eq!(fixed.len(), 3);
        assert!(fixed.iter().all(|j| j.get(&RpsRole::Left) == Some(&RpsMove::Paper)));
        // Stable role order: left first, right varies
        assert_eq!(fixed[0].get(&RpsRole::Right), Some(&RpsMove::Rock));
        assert_eq!(fixed[2].get(&RpsRole::Right), Some(&RpsMove::Scissors));
    }

    #[test]
    fn value_equality() {
        let a: JointMove<Rps> = JointMove::new(vec![(RpsRole::Left, RpsMove::Rock), (RpsRole::Right, RpsMove::Paper)]);
        let b: JointMove<Rps> = JointMove::new(vec![(RpsRole::Left, RpsMove::Rock), (RpsRole::Right, RpsMove::Paper)]);
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn random_joint_move_is_legal() {
        let game = Rps::new(1);
        let state = game.initial_state();
        let mut rng = StdRng::seed_from_u64(7);
        let all = joint_moves(&game, &state);
        for _ in 0..20 {
            let j = random_joint_move(&game, &state, &mut rng).unwrap();
            assert!(all.contains(&j));
        }
    }

    #[test]
    fn terminal_state_has_no_joint_moves() {
        let game = Rps::new(1);
        let mut state = game.initial_state();
        let j = joint_moves(&game, &state).remove(0);
        state = game.successor(&state, &j);
        assert!(game.is_terminal(&state));
        assert!(joint_moves(&game, &state).is_empty());
        let mut rng = StdRng::seed_from_u64(7);
        assert!(random_joint_move(&game, &state, &mut rng).is_none());
    }
}
