//! Paratroopers riding air transports.

use std::collections::BTreeMap;

use crate::board::UnitId;
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::{available_capacity, Dependents};
use super::verdict::{Findings, MoveError, PassResult, Reason};

pub fn validate_paratroops(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    let units = &candidate.units;
    if !ctx.mover().tech.paratroopers
        || !units.iter().any(|&u| ctx.is_air_transportable(u))
        || !units.iter().any(|&u| ctx.is_air_transport(u))
    {
        return Ok(findings);
    }
    let can_move_non_combat = ctx.rules.paratroopers_can_move_during_non_combat;
    if ctx.mode.is_non_combat() && !can_move_non_combat {
        return Err(MoveError::ParatroopsInNonCombat);
    }
    if ctx.edit_mode() {
        return Ok(findings);
    }

    let paratroopers = loaded_unit_map(ctx, &candidate.air_dependents)?;
    findings.disallow_all(
        Reason::MovedThenTransportParatroops,
        candidate.air_dependents.keys().copied().filter(|&t| ctx.has_moved(t)),
    );

    let route = &candidate.route;
    let friendly_end = ctx.is_territory_friendly(route.end());
    let wrong_phase = ctx.mode.is_combat() && friendly_end && can_move_non_combat;
    let must_advance = friendly_end && !can_move_non_combat;
    for &paratrooper in paratroopers.keys() {
        if ctx.has_moved(paratrooper) {
            findings.disallow(Reason::ParatrooperAlreadyMoved, paratrooper);
        }
        if must_advance {
            findings.disallow(Reason::ParatroopsMustAdvance, paratrooper);
        }
        if wrong_phase {
            findings.disallow(Reason::ParatroopsOnlyInNonCombat, paratrooper);
        }
    }

    if !ctx.rules.paratroopers_can_attack_deep_into_enemy_territory
        && route.any_middle_step(|t| !ctx.is_water(t) && ctx.is_territory_enemy(t))
    {
        return Err(MoveError::ParatroopsMustStop);
    }
    Ok(findings)
}

/// Flips transport → cargo into cargo → transport, checking that each
/// transport has room for what it was given.
fn loaded_unit_map(ctx: &RuleContext<'_>, dependents: &Dependents) -> Result<BTreeMap<UnitId, UnitId>, MoveError> {
    let mut loaded = BTreeMap::new();
    for (&transport, cargo) in dependents {
        let mut capacity = available_capacity(ctx, transport);
        for &unit in cargo {
            let cost = ctx.transport_cost(unit);
            if capacity < cost {
                return Err(MoveError::NotAllAirTransported);
            }
            loaded.insert(unit, transport);
            capacity -= cost;
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, Movement, PlayerId, RelationshipKind, Route, TerritoryId, UnitType, UnitTypeId};
    use crate::rules::{Ruleset, ValidationMode};

    struct Drop {
        state: GameState,
        me: PlayerId,
        para: UnitTypeId,
        bomber: UnitTypeId,
        line: [TerritoryId; 3],
    }

    fn drop_zone() -> Drop {
        let mut state = GameState::new();
        let me = state.add_player("Americans");
        let enemy = state.add_player("Germans");
        state.set_relationship(me, enemy, RelationshipKind::War);
        state.player_mut(me).tech.paratroopers = true;
        let mut para = UnitType::new("infantry", Domain::Land, 1);
        para.transport_cost = Some(2);
        para.abilities.is_air_transportable = true;
        let para = state.add_unit_type(para);
        let mut bomber = UnitType::new("bomber", Domain::Air, 6);
        bomber.transport_capacity = Some(2);
        bomber.abilities.is_air_transport = true;
        let bomber = state.add_unit_type(bomber);
        let line = ["England", "Holland", "Germany"].map(|n| state.add_territory(n, false));
        state.connect(line[0], line[1]);
        state.connect(line[1], line[2]);
        state.set_owner(line[0], Some(me));
        state.set_owner(line[1], Some(enemy));
        state.set_owner(line[2], Some(enemy));
        Drop {
            state,
            me,
            para,
            bomber,
            line,
        }
    }

    fn check(d: &Drop, rules: &Ruleset, mode: ValidationMode, candidate: &MoveCandidate) -> PassResult {
        let ctx = RuleContext::new(&d.state, rules, d.me, mode);
        validate_paratroops(&ctx, candidate)
    }

    #[test]
    fn overloaded_bomber_is_fatal() {
        let mut d = drop_zone();
        let b = d.state.add_unit(d.bomber, d.me, d.line[0]);
        let p1 = d.state.add_unit(d.para, d.me, d.line[0]);
        let p2 = d.state.add_unit(d.para, d.me, d.line[0]);
        let candidate = MoveCandidate::new(vec![b, p1, p2], Route::new(d.line[0], vec![d.line[1]]))
            .with_air_dependents(b, vec![p1, p2]);
        assert_eq!(
            check(&d, &Ruleset::default(), ValidationMode::combat(), &candidate),
            Err(MoveError::NotAllAirTransported)
        );
    }

    #[test]
    fn paratroopers_stop_at_the_first_enemy_territory() {
        let mut d = drop_zone();
        let b = d.state.add_unit(d.bomber, d.me, d.line[0]);
        let p = d.state.add_unit(d.para, d.me, d.line[0]);
        let route = Route::new(d.line[0], vec![d.line[1], d.line[2]]);
        let candidate = MoveCandidate::new(vec![b, p], route).with_air_dependents(b, vec![p]);
        let mut rules = Ruleset::default();
        assert_eq!(
            check(&d, &rules, ValidationMode::combat(), &candidate),
            Err(MoveError::ParatroopsMustStop)
        );
        rules.paratroopers_can_attack_deep_into_enemy_territory = true;
        assert!(check(&d, &rules, ValidationMode::combat(), &candidate).unwrap().is_empty());
    }

    #[test]
    fn drops_into_friendly_land_depend_on_the_phase_rule() {
        let mut d = drop_zone();
        let home = d.state.add_territory("Scotland", false);
        d.state.connect(d.line[0], home);
        d.state.set_owner(home, Some(d.me));
        let b = d.state.add_unit(d.bomber, d.me, d.line[0]);
        let p = d.state.add_unit(d.para, d.me, d.line[0]);
        d.state.spend_movement(b, Movement::ONE);
        let candidate =
            MoveCandidate::new(vec![b, p], Route::new(d.line[0], vec![home])).with_air_dependents(b, vec![p]);
        let rules = Ruleset::default();
        let findings = check(&d, &rules, ValidationMode::combat(), &candidate).unwrap();
        assert_eq!(findings.records()[0].reason, Reason::MovedThenTransportParatroops);
        assert_eq!(findings.records()[1].reason, Reason::ParatroopsMustAdvance);
        assert_eq!(
            check(&d, &rules, ValidationMode::non_combat(), &candidate),
            Err(MoveError::ParatroopsInNonCombat)
        );
    }
}
