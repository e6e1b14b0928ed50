//! Enemy units standing in the way of a move.

use crate::board::{Route, TerritoryId, UnitId};
use crate::rules::{Predicate, RuleContext};

use super::candidate::MoveCandidate;
use super::cargo::non_paratroopers_present;
use super::verdict::{Findings, MoveError, PassResult};

pub fn validate_non_enemy_units_on_path(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let findings = Findings::new();
    if ctx.edit_mode() {
        return Ok(findings);
    }
    let route = &candidate.route;
    let units = &candidate.units;

    let harmless = (|u: UnitId| ctx.is_infrastructure(u))
        .or(|u: UnitId| !ctx.is_enemy_unit(u))
        .or(|u: UnitId| ctx.is_submerged(u));
    let clear = route
        .middle_steps()
        .iter()
        .all(|&t| ctx.state.units_in(t).all(|u| harmless.test(u)));
    if clear || units.iter().all(|&u| ctx.is_air(u)) {
        return Ok(findings);
    }

    let free: Vec<UnitId> = units.iter().copied().filter(|&u| !ctx.is_transported(u)).collect();
    if !free.is_empty() && free.iter().all(|&u| ctx.is_submarine(u)) {
        if enemy_destroyer_on_path(ctx, route) {
            return Err(MoveError::SubmarinesUnderDestroyers);
        }
        return Ok(findings);
    }
    if only_ignored_units_on_path(ctx, route, true) {
        return Ok(findings);
    }
    if non_paratroopers_present(ctx, units) {
        return Err(MoveError::EnemyUnitsOnPath);
    }
    Ok(findings)
}

pub fn enemy_destroyer_on_path(ctx: &RuleContext<'_>, route: &Route) -> bool {
    route.any_middle_step(|t| {
        ctx.state
            .units_in(t)
            .any(|u| ctx.is_destroyer(u) && ctx.is_enemy_unit(u))
    })
}

/// Whether every sea zone on the way holds only units a fleet may sail
/// past: submarines that can be moved through, infrastructure, non-enemy
/// units and, when transports are ignored, unescorted transports. Land
/// steps are not considered, and at least one sea zone must qualify.
pub fn only_ignored_units_on_path(ctx: &RuleContext<'_>, route: &Route, ignore_end: bool) -> bool {
    let friendly = |u: UnitId| !ctx.is_enemy_unit(u);
    let infrastructure = |u: UnitId| ctx.is_infrastructure(u);
    let transport_only = infrastructure
        .or(|u: UnitId| ctx.is_sea_transport_but_not_combat(u))
        .or(|u: UnitId| ctx.is_land(u))
        .or(friendly);
    let sub_only = infrastructure
        .or(|u: UnitId| ctx.ty(u).abilities.can_be_moved_through_by_enemies)
        .or(friendly);

    let steps: Vec<TerritoryId> = if ignore_end {
        route.middle_steps().to_vec()
    } else if route.has_no_steps() {
        vec![route.start()]
    } else {
        route.steps().to_vec()
    };
    let mut valid = false;
    for t in steps.into_iter().filter(|&t| ctx.is_water(t)) {
        let ignored_transports = ctx.rules.ignore_transport_in_movement
            && ctx
                .state
                .units_in(t)
                .all(|u| transport_only.test(u) || sub_only.test(u));
        if ignored_transports || ctx.state.units_in(t).all(|u| sub_only.test(u)) {
            valid = true;
            continue;
        }
        return false;
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, PlayerId, RelationshipKind, UnitType, UnitTypeId};
    use crate::rules::{Ruleset, ValidationMode};

    struct Sea {
        state: GameState,
        me: PlayerId,
        enemy: PlayerId,
        sub: UnitTypeId,
        destroyer: UnitTypeId,
        transport: UnitTypeId,
        zones: [TerritoryId; 3],
    }

    fn sea() -> Sea {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let enemy = state.add_player("British");
        state.set_relationship(me, enemy, RelationshipKind::War);
        let mut sub = UnitType::new("submarine", Domain::Sea, 2);
        sub.abilities.can_move_through_enemies = true;
        sub.abilities.can_be_moved_through_by_enemies = true;
        let sub = state.add_unit_type(sub);
        let mut destroyer = UnitType::new("destroyer", Domain::Sea, 2);
        destroyer.abilities.is_destroyer = true;
        let destroyer = state.add_unit_type(destroyer);
        let mut transport = UnitType::new("transport", Domain::Sea, 2);
        transport.transport_capacity = Some(2);
        let transport = state.add_unit_type(transport);
        let zones = ["sz1", "sz2", "sz3"].map(|n| state.add_territory(n, true));
        state.connect(zones[0], zones[1]);
        state.connect(zones[1], zones[2]);
        Sea {
            state,
            me,
            enemy,
            sub,
            destroyer,
            transport,
            zones,
        }
    }

    fn check(s: &Sea, rules: &Ruleset, units: Vec<UnitId>) -> PassResult {
        let ctx = RuleContext::new(&s.state, rules, s.me, ValidationMode::combat());
        let route = Route::new(s.zones[0], vec![s.zones[1], s.zones[2]]);
        validate_non_enemy_units_on_path(&ctx, &MoveCandidate::new(units, route))
    }

    #[test]
    fn destroyer_blocks_the_path() {
        let mut s = sea();
        s.state.add_unit(s.destroyer, s.enemy, s.zones[1]);
        let mine = s.state.add_unit(s.destroyer, s.me, s.zones[0]);
        let rules = Ruleset::default();
        assert_eq!(check(&s, &rules, vec![mine]), Err(MoveError::EnemyUnitsOnPath));
    }

    #[test]
    fn submarines_slip_past_anything_but_destroyers() {
        let mut s = sea();
        s.state.add_unit(s.transport, s.enemy, s.zones[1]);
        let boat = s.state.add_unit(s.sub, s.me, s.zones[0]);
        let rules = Ruleset::default();
        assert!(check(&s, &rules, vec![boat]).is_ok());
        s.state.add_unit(s.destroyer, s.enemy, s.zones[1]);
        assert_eq!(check(&s, &rules, vec![boat]), Err(MoveError::SubmarinesUnderDestroyers));
    }

    #[test]
    fn enemy_submarines_and_ignored_transports() {
        let mut s = sea();
        s.state.add_unit(s.sub, s.enemy, s.zones[1]);
        let mine = s.state.add_unit(s.destroyer, s.me, s.zones[0]);
        let mut rules = Ruleset::default();
        assert!(check(&s, &rules, vec![mine]).is_ok());
        s.state.add_unit(s.transport, s.enemy, s.zones[1]);
        assert_eq!(check(&s, &rules, vec![mine]), Err(MoveError::EnemyUnitsOnPath));
        rules.ignore_transport_in_movement = true;
        assert!(check(&s, &rules, vec![mine]).is_ok());
    }
}
