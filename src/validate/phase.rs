//! Phase rules. Exactly one of the two passes runs, picked by the
//! validation mode: combat movement governs blitzing and invasions,
//! non-combat movement keeps units away from battles.

use crate::board::{TerritoryId, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::{check_land_transports, find_non_dependent_units, non_paratroopers_present};
use super::path::{enemy_destroyer_on_path, only_ignored_units_on_path};
use super::verdict::{Findings, MoveError, PassResult, Reason};

pub fn validate_combat(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    if ctx.edit_mode() {
        return Ok(findings);
    }
    let route = &candidate.route;
    let units = &candidate.units;
    let map = &ctx.state.map;
    let start = route.start();
    let end = route.end();
    let all_air = units.iter().all(|&u| ctx.is_air(u));

    for &t in route.steps() {
        if !ctx.owner_can_move_into_during_combat(t) {
            let owner = ctx.territory(t).owner;
            return Err(MoveError::CombatEntryDenied(ctx.player_name(owner).to_string()));
        }
    }

    // Leaving a contested territory for more enemy territory.
    let enemy = |t: TerritoryId| ctx.is_territory_enemy(t);
    let heads_into_enemy =
        route.all_territories().any(enemy) && !route.all_middle_steps(|t| !ctx.is_territory_enemy(t));
    if !ctx.rules.all_units_can_attack_from_contested_territories && !ctx.is_water(start) && heads_into_enemy {
        let start_owner = ctx.territory(start).owner;
        if ctx.is_at_war_with(start_owner) {
            if !ctx.is_blitzable(start) && !all_air {
                return Err(MoveError::BlitzOutOfBattleFurther);
            }
            let grounded = units.iter().copied().filter(|&u| !ctx.can_blitz(u) && !ctx.is_air(u));
            findings.disallow_all(Reason::CannotBlitzOutOfEmptyEnemy, grounded);
        } else if !ctx.is_blitzable(start) && !all_air {
            return Err(MoveError::BlitzOutOfBattle);
        }
    }

    if !(ctx.is_water(start) && ctx.is_water(end)) {
        let aa = units
            .iter()
            .copied()
            .filter(|&u| ctx.ty(u).abilities.cannot_move_during_combat_move);
        findings.disallow_all(Reason::AaInCombatMove, aa);
    }

    if route.has_neutral_before_end(map) && !all_air && !ctx.rules.neutrals_blitzable_effective() {
        return Err(MoveError::MustStopInNeutral);
    }

    if units.iter().any(|&u| ctx.is_land(u)) && route.has_steps() {
        check_blitz(ctx, candidate, &mut findings)?;
    }

    let neutral_air_barred = !ctx.rules.neutral_flyover_allowed || ctx.rules.neutrals_impassable;
    if route.has_steps()
        && units.iter().any(|&u| ctx.is_air(u))
        && neutral_air_barred
        && (route.any_middle_step(|t| ctx.is_neutral_land(t))
            || (ctx.is_neutral_land(start) && units.iter().any(|&u| ctx.is_air(u) && ctx.has_moved(u))))
    {
        return Err(MoveError::AirOverNeutral);
    }

    let through_captured = route.any_middle_step(|t| ctx.territory(t).is_land() && ctx.territory(t).conquered_not_blitzed());
    if through_captured && !all_air {
        return Err(MoveError::ThroughNewlyCaptured);
    }

    if units.iter().any(|&u| ctx.unit(u).was_in_combat)
        && units.iter().any(|&u| ctx.unit(u).was_unloaded_this_turn)
        && ctx.is_enemy_destination(end)
        && !ctx.territory(end).units.is_empty()
    {
        return Err(MoveError::MultipleBattles);
    }

    if route.is_unload(map) && ctx.is_territory_enemy(end) {
        for &unit in units {
            let Some(transport) = ctx.unit(unit).transported_by else {
                continue;
            };
            if !ctx.can_invade_from(unit, transport) {
                findings.disallow(
                    Reason::CannotInvade {
                        unit_type: ctx.ty(unit).name.clone(),
                        transport_type: ctx.ty(transport).name.clone(),
                    },
                    unit,
                );
            }
        }
    }
    Ok(findings)
}

/// Enemy territory strictly inside the route must be blitzable, and then
/// every land unit must be able to blitz or ride a land transport.
fn check_blitz(ctx: &RuleContext<'_>, candidate: &MoveCandidate, findings: &mut Findings) -> Result<(), MoveError> {
    let route = &candidate.route;
    let units = &candidate.units;
    let mut enemy_count = 0;
    let mut all_blitzable = true;
    for &t in route.middle_steps() {
        let territory = ctx.territory(t);
        if territory.is_water {
            continue;
        }
        if ctx.is_at_war_with(territory.owner) || territory.conquered {
            enemy_count += 1;
            all_blitzable &= ctx.is_blitzable(t);
        }
    }
    if enemy_count > 0 && !all_blitzable {
        if non_paratroopers_present(ctx, units) {
            return Err(MoveError::CannotBlitzRoute);
        }
        return Ok(());
    }
    let start = route.start();
    let end = route.end();
    if ctx.is_water(start) || ctx.is_water(end) {
        return Ok(());
    }

    let present_types: Vec<_> = units.iter().map(|&u| ctx.unit(u).type_id).collect();
    let gains_blitz = |u: UnitId| {
        ctx.ty(u)
            .receives_blitz_with
            .iter()
            .any(|ty| present_types.contains(ty))
    };
    let mut non_blitzing: Vec<UnitId> = find_non_dependent_units(ctx, candidate)
        .into_iter()
        .filter(|&u| !(ctx.can_blitz(u) || ctx.is_air(u)))
        .filter(|&u| !gains_blitz(u))
        .collect();

    let start_fought_over = ctx.territory(start).conquered || ctx.territory(start).blitzed;
    let effect_territories: Vec<TerritoryId> = if start_fought_over {
        route.all_territories().collect()
    } else {
        route.steps().to_vec()
    };
    for &unit in units {
        let ty = ctx.unit(unit).type_id;
        let loses_blitz = effect_territories
            .iter()
            .any(|&t| ctx.territory(t).effects.types_lose_blitz.contains(&ty));
        if loses_blitz && !non_blitzing.contains(&unit) {
            non_blitzing.push(unit);
        }
    }

    let hostile_before_end = route
        .all_territories()
        .any(|t| t != end && !ctx.is_territory_friendly(t));
    let fought_before_end = route.all_territories().any(|t| t != end && ctx.was_fought_over(t));
    if !start_fought_over && !hostile_before_end && !fought_before_end {
        non_blitzing.retain(|&u| ctx.unit(u).was_in_combat);
    }
    if non_blitzing.is_empty() {
        return Ok(());
    }
    let potential: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|u| !non_blitzing.contains(u))
        .collect();
    findings.disallow_all(Reason::NotAllCanBlitz, check_land_transports(ctx, &potential, &non_blitzing));
    Ok(())
}

pub fn validate_non_combat(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let findings = Findings::new();
    if ctx.edit_mode() {
        return Ok(findings);
    }
    let route = &candidate.route;
    let units = &candidate.units;
    let end = route.end();

    if route.all_territories().any(|t| ctx.is_impassable(t)) {
        return Err(MoveError::Impassable);
    }
    if route.all_territories().any(|t| ctx.is_restricted(t)) {
        return Err(MoveError::Restricted);
    }

    let neutral_or_enemy = |t: TerritoryId| ctx.is_neutral_land(t) || ctx.is_enemy_destination(t);
    let naval_restricted = ctx.rules.naval_may_not_non_combat_into_controlled();
    if neutral_or_enemy(end) && (!ctx.is_water(end) || naval_restricted) {
        return Err(MoveError::AdvanceUnitsInNonCombat);
    }

    let all_subs = units.iter().all(|&u| ctx.is_submarine(u));
    if all_subs && enemy_destroyer_on_path(ctx, route) {
        return Err(MoveError::SubmarinesUnderDestroyers);
    }

    let all_air = units.iter().all(|&u| ctx.is_air(u));
    let enemy_at_end = ctx
        .state
        .units_in(end)
        .any(|u| ctx.is_enemy_unit(u) && !ctx.is_submerged(u));
    if enemy_at_end
        && !only_ignored_units_on_path(ctx, route, false)
        && !(ctx.is_water(end) && all_air)
        && !(ctx.rules.subs_can_end_non_combat_move_with_enemies && all_subs)
    {
        return Err(MoveError::AdvanceInNonCombat);
    }

    let any_sea = units.iter().any(|&u| ctx.is_sea(u));
    if all_air || (!any_sea && !non_paratroopers_present(ctx, units)) {
        let neutral_air_barred = !ctx.rules.neutral_flyover_allowed || ctx.rules.neutrals_impassable;
        if route.all_territories().any(|t| ctx.is_neutral_land(t)) && neutral_air_barred {
            return Err(MoveError::AirOverNeutralInNonCombat);
        }
    } else if any_sea || route.all_territories().any(|t| ctx.is_water(t)) {
        if naval_restricted && route.all_territories().any(neutral_or_enemy) {
            return Err(MoveError::NeutralOrEnemyInNonCombat);
        }
    } else if route.all_territories().any(neutral_or_enemy) {
        return Err(MoveError::NeutralOrEnemyInNonCombat);
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, PlayerId, RelationshipKind, Route, UnitType, UnitTypeId};
    use crate::rules::{Ruleset, ValidationMode};

    struct Front {
        state: GameState,
        me: PlayerId,
        enemy: PlayerId,
        infantry: UnitTypeId,
        tank: UnitTypeId,
        /// Germany - Poland - Belarus - Moscow, all land.
        line: [TerritoryId; 4],
    }

    fn front() -> Front {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let enemy = state.add_player("Russians");
        state.set_relationship(me, enemy, RelationshipKind::War);
        let infantry = state.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        let mut tank = UnitType::new("armour", Domain::Land, 2);
        tank.abilities.can_blitz = true;
        let tank = state.add_unit_type(tank);
        let names = ["Germany", "Poland", "Belarus", "Moscow"];
        let line = names.map(|n| state.add_territory(n, false));
        for pair in line.windows(2) {
            state.connect(pair[0], pair[1]);
        }
        state.set_owner(line[0], Some(me));
        state.set_owner(line[1], Some(me));
        state.set_owner(line[2], Some(enemy));
        state.set_owner(line[3], Some(enemy));
        Front {
            state,
            me,
            enemy,
            infantry,
            tank,
            line,
        }
    }

    fn combat(f: &Front, rules: &Ruleset, units: Vec<UnitId>, route: Route) -> PassResult {
        let ctx = RuleContext::new(&f.state, rules, f.me, ValidationMode::combat());
        validate_combat(&ctx, &MoveCandidate::new(units, route))
    }

    fn non_combat(f: &Front, rules: &Ruleset, units: Vec<UnitId>, route: Route) -> PassResult {
        let ctx = RuleContext::new(&f.state, rules, f.me, ValidationMode::non_combat());
        validate_non_combat(&ctx, &MoveCandidate::new(units, route))
    }

    #[test]
    fn blitz_through_empty_enemy_land() {
        let mut f = front();
        let tank = f.state.add_unit(f.tank, f.me, f.line[1]);
        let infantry = f.state.add_unit(f.infantry, f.me, f.line[1]);
        let rules = Ruleset::default();
        let route = Route::new(f.line[1], vec![f.line[2], f.line[3]]);
        let findings = combat(&f, &rules, vec![tank, infantry], route).unwrap();
        assert!(!findings.is_disallowed(tank));
        assert!(findings.is_disallowed(infantry));
        assert_eq!(findings.records()[0].reason, Reason::NotAllCanBlitz);
    }

    #[test]
    fn defended_territory_stops_a_blitz() {
        let mut f = front();
        f.state.add_unit(f.infantry, f.enemy, f.line[2]);
        let tank = f.state.add_unit(f.tank, f.me, f.line[1]);
        let rules = Ruleset::default();
        let route = Route::new(f.line[1], vec![f.line[2], f.line[3]]);
        assert_eq!(combat(&f, &rules, vec![tank], route), Err(MoveError::CannotBlitzRoute));
    }

    #[test]
    fn captured_territory_blocks_passage() {
        let mut f = front();
        f.state.territory_mut(f.line[1]).conquered = true;
        let tank = f.state.add_unit(f.tank, f.me, f.line[0]);
        let rules = Ruleset::default();
        let route = Route::new(f.line[0], vec![f.line[1], f.line[2]]);
        assert!(combat(&f, &rules, vec![tank], route).is_err());
    }

    #[test]
    fn contested_start_needs_blitzers() {
        let mut f = front();
        f.state.add_unit(f.infantry, f.enemy, f.line[2]);
        let tank = f.state.add_unit(f.tank, f.me, f.line[2]);
        let mut rules = Ruleset::default();
        let route = Route::new(f.line[2], vec![f.line[3]]);
        assert_eq!(
            combat(&f, &rules, vec![tank], route.clone()),
            Err(MoveError::BlitzOutOfBattleFurther)
        );
        rules.all_units_can_attack_from_contested_territories = true;
        assert!(combat(&f, &rules, vec![tank], route).is_ok());
    }

    #[test]
    fn aa_guns_stay_put_in_combat() {
        let mut f = front();
        let mut aa = UnitType::new("aaGun", Domain::Land, 1);
        aa.abilities.cannot_move_during_combat_move = true;
        let aa = f.state.add_unit_type(aa);
        let gun = f.state.add_unit(aa, f.me, f.line[0]);
        let rules = Ruleset::default();
        let findings = combat(&f, &rules, vec![gun], Route::new(f.line[0], vec![f.line[1]])).unwrap();
        assert_eq!(findings.records()[0].reason, Reason::AaInCombatMove);
    }

    #[test]
    fn no_advancing_in_non_combat() {
        let mut f = front();
        let tank = f.state.add_unit(f.tank, f.me, f.line[1]);
        let rules = Ruleset::default();
        assert_eq!(
            non_combat(&f, &rules, vec![tank], Route::new(f.line[1], vec![f.line[2]])),
            Err(MoveError::AdvanceUnitsInNonCombat)
        );
        assert!(non_combat(&f, &rules, vec![tank], Route::new(f.line[1], vec![f.line[0]])).is_ok());
    }

    #[test]
    fn impassable_blocks_non_combat() {
        let mut f = front();
        f.state.territory_mut(f.line[0]).impassable = true;
        let tank = f.state.add_unit(f.tank, f.me, f.line[1]);
        let rules = Ruleset::default();
        assert_eq!(
            non_combat(&f, &rules, vec![tank], Route::new(f.line[1], vec![f.line[0]])),
            Err(MoveError::Impassable)
        );
    }

    #[test]
    fn neutral_land_blocks_non_combat_air() {
        let mut f = front();
        let mut fighter = UnitType::new("fighter", Domain::Air, 4);
        fighter.carrier_cost = Some(1);
        let fighter = f.state.add_unit_type(fighter);
        let sweden = f.state.add_territory("Sweden", false);
        f.state.connect(f.line[0], sweden);
        let plane = f.state.add_unit(fighter, f.me, f.line[0]);
        let mut rules = Ruleset::default();
        rules.neutral_flyover_allowed = true;
        let route = Route::new(f.line[0], vec![sweden, f.line[0]]);
        assert!(non_combat(&f, &rules, vec![plane], route.clone()).is_ok());
        rules.neutral_flyover_allowed = false;
        assert_eq!(
            non_combat(&f, &rules, vec![plane], route),
            Err(MoveError::AirOverNeutralInNonCombat)
        );
    }
}
