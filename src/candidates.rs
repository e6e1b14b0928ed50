//! Random candidate moves, for property tests and benchmarks.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{GameState, PlayerId, Route, TerritoryId, UnitId};
use crate::validate::MoveCandidate;

/// Longest random walk drawn.
const MAX_WALK: usize = 4;

/// Draws up to `n` candidate moves for `player`: a random subset of the
/// player's units in one territory, walked randomly through adjacent
/// territories without revisiting any. Land units walking onto a sea zone
/// are assigned to the player's transports there when one is present.
///
/// Returns fewer than `n` only when the player has no units at all.
pub fn random_candidates(state: &GameState, player: PlayerId, rng: &mut impl Rng, n: usize) -> Vec<MoveCandidate> {
    let occupied: Vec<TerritoryId> = state
        .map
        .territories()
        .filter(|t| t.units.iter().any(|&u| state.unit(u).owner == player))
        .map(|t| t.id)
        .collect();
    if occupied.is_empty() {
        return Vec::new();
    }
    (0..n)
        .filter_map(|_| {
            let &start = occupied.choose(rng)?;
            Some(random_candidate(state, player, start, rng))
        })
        .collect()
}

fn random_candidate(state: &GameState, player: PlayerId, start: TerritoryId, rng: &mut impl Rng) -> MoveCandidate {
    let own: Vec<UnitId> = state.units_in(start).filter(|&u| state.unit(u).owner == player).collect();
    let count = rng.gen_range(1..=own.len());
    let units: Vec<UnitId> = own.choose_multiple(rng, count).copied().collect();

    let mut path = vec![start];
    let length = rng.gen_range(1..=MAX_WALK);
    while path.len() <= length {
        let Some(&at) = path.last() else { break };
        let fresh: Vec<TerritoryId> = state
            .map
            .neighbors(at)
            .iter()
            .copied()
            .filter(|n| !path.contains(n))
            .collect();
        match fresh.choose(rng) {
            Some(&next) => path.push(next),
            None => break,
        }
    }
    let route = Route::new(start, path[1..].to_vec());

    let mut candidate = MoveCandidate::new(units, route);
    let end = candidate.route.end();
    if state.territory(end).is_water && !state.territory(start).is_water {
        let transports: Vec<UnitId> = state
            .units_in(end)
            .filter(|&u| state.unit(u).owner == player && state.type_of(u).is_sea_transport())
            .collect();
        let cargo: Vec<UnitId> = candidate
            .units
            .iter()
            .copied()
            .filter(|&u| state.type_of(u).can_be_transported())
            .collect();
        for unit in cargo {
            if let Some(&transport) = transports.choose(rng) {
                candidate.sea_transports.insert(unit, transport);
            }
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, UnitType};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn candidates_start_where_the_units_are() {
        let mut state = GameState::new();
        let me = state.add_player("Italians");
        let other = state.add_player("British");
        let infantry = state.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        let names = ["Rome", "Naples", "Milan", "Venice"];
        let ts: Vec<TerritoryId> = names.iter().map(|n| state.add_territory(*n, false)).collect();
        for pair in ts.windows(2) {
            state.connect(pair[0], pair[1]);
        }
        state.add_unit(infantry, me, ts[0]);
        state.add_unit(infantry, me, ts[0]);
        state.add_unit(infantry, other, ts[3]);

        let mut rng = SmallRng::seed_from_u64(7);
        let candidates = random_candidates(&state, me, &mut rng, 20);
        assert_eq!(candidates.len(), 20);
        for c in &candidates {
            assert_eq!(c.route.start(), ts[0]);
            assert!(!c.units.is_empty());
            assert!(c.units.iter().all(|&u| state.unit(u).owner == me));
            assert!(state.map.is_valid_route(&c.route));
        }
        assert!(random_candidates(&state, PlayerId(9), &mut rng, 5).is_empty());
    }
}
