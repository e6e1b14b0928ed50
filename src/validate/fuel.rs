//! Fuel affordability and the battle-zone exit guard.

use crate::board::{ResourceBag, Route, UnitId};
use crate::rules::RuleContext;

use super::air::what_air_can_land_on_these_carriers;
use super::candidate::MoveCandidate;
use super::cargo::dependent_units;
use super::verdict::{Findings, MoveError, PassResult};

pub fn validate_fuel(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    if ctx.edit_mode() || !ctx.rules.use_fuel_cost {
        return Ok(Findings::new());
    }
    let cost = fuel_charge(ctx, candidate);
    if ctx.mover().resources.covers(&cost) {
        Ok(Findings::new())
    } else {
        Err(MoveError::FuelShortage(cost))
    }
}

/// What the mover pays to fly or sail `candidate` along its route. Cargo,
/// carrier passengers in non-combat and units already transported ride
/// free; the flat charge is paid once per turn.
pub fn fuel_charge(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> ResourceBag {
    let mut cost = ResourceBag::default();
    if !ctx.rules.use_fuel_cost {
        return cost;
    }
    let units = &candidate.units;
    let route = &candidate.route;
    let mut free = dependent_units(ctx, candidate);
    if ctx.mode.is_non_combat() {
        let mut riders: Vec<UnitId> = units
            .iter()
            .copied()
            .filter(|&u| ctx.is_allied_not_owned(u) && ctx.can_land_on_carrier(u))
            .collect();
        riders.extend(units.iter().copied().filter(|&u| ctx.is_owned(u) && ctx.can_land_on_carrier(u)));
        let carriers: Vec<UnitId> = units.iter().copied().filter(|&u| ctx.is_carrier(u)).collect();
        let aboard = what_air_can_land_on_these_carriers(ctx, &carriers, &riders, route.start());
        free.extend(aboard.values().flatten().copied());
    }
    for &unit in units.iter().filter(|u| !free.contains(u)) {
        add_unit_charge(ctx, unit, route, &mut cost);
    }
    cost
}

fn add_unit_charge(ctx: &RuleContext<'_>, unit: UnitId, route: &Route, cost: &mut ResourceBag) {
    if ctx.is_transported(unit) {
        return;
    }
    let ty = ctx.ty(unit);
    let distance = route.movement_cost(&ctx.state.map, ctx.unit(unit).type_id).ceil_int();
    cost.add_scaled(&ty.fuel_cost, u32::try_from(distance).unwrap_or(0));
    if !ctx.unit(unit).charged_flat_fuel {
        cost.add(&ty.fuel_flat_cost);
    }
}

/// Units that moved into a territory with a pending battle stay to fight
/// it, unless they are unloading into another battle. Air may always leave.
pub fn validate_battle_zone_exit(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let route = &candidate.route;
    let units = &candidate.units;
    let start = route.start();
    if !ctx.territory(start).pending_battle || units.iter().all(|&u| ctx.is_air(u)) {
        return Ok(Findings::new());
    }
    let moved_in = units.iter().any(|&u| ctx.state.moved_into_this_turn(u, start));
    if !moved_in {
        return Ok(Findings::new());
    }
    let end = route.end();
    let attack = !ctx.is_allied_with(ctx.territory(end).owner) || ctx.territory(end).conquered;
    if route.is_unload(&ctx.state.map) && attack {
        return Ok(Findings::new());
    }
    Err(MoveError::LeaveBattleZone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, Movement, PlayerId, TerritoryId, UnitType, UnitTypeId, PUS};
    use crate::rules::{Ruleset, ValidationMode};

    struct Airfield {
        state: GameState,
        me: PlayerId,
        fighter: UnitTypeId,
        tank: UnitTypeId,
        line: [TerritoryId; 3],
    }

    fn airfield() -> Airfield {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let mut fighter = UnitType::new("fighter", Domain::Air, 4);
        fighter.fuel_cost.add(&bag("Fuel", 1));
        fighter.fuel_flat_cost.add(&bag(PUS, 2));
        let fighter = state.add_unit_type(fighter);
        let tank = state.add_unit_type(UnitType::new("armour", Domain::Land, 2));
        let line = ["Berlin", "Warsaw", "Minsk"].map(|n| state.add_territory(n, false));
        state.connect(line[0], line[1]);
        state.connect(line[1], line[2]);
        for t in line {
            state.set_owner(t, Some(me));
        }
        Airfield {
            state,
            me,
            fighter,
            tank,
            line,
        }
    }

    fn bag(name: &str, qty: u32) -> ResourceBag {
        let mut bag = ResourceBag::default();
        bag.0.insert(name.to_string(), qty);
        bag
    }

    fn fuel_rules() -> Ruleset {
        Ruleset {
            use_fuel_cost: true,
            ..Ruleset::default()
        }
    }

    #[test]
    fn charge_scales_with_distance_plus_flat_fee() {
        let mut a = airfield();
        let f = a.state.add_unit(a.fighter, a.me, a.line[0]);
        let rules = fuel_rules();
        let ctx = RuleContext::new(&a.state, &rules, a.me, ValidationMode::combat());
        let candidate = MoveCandidate::new(vec![f], Route::new(a.line[0], vec![a.line[1], a.line[2]]));
        let cost = fuel_charge(&ctx, &candidate);
        assert_eq!(cost.get("Fuel"), 2);
        assert_eq!(cost.get(PUS), 2);
        assert_eq!(validate_fuel(&ctx, &candidate), Err(MoveError::FuelShortage(cost)));
    }

    #[test]
    fn paid_flat_fee_and_stocked_tanks() {
        let mut a = airfield();
        let f = a.state.add_unit(a.fighter, a.me, a.line[0]);
        a.state.unit_mut(f).charged_flat_fuel = true;
        a.state.player_mut(a.me).resources.add(&bag("Fuel", 5));
        let rules = fuel_rules();
        let ctx = RuleContext::new(&a.state, &rules, a.me, ValidationMode::combat());
        let candidate = MoveCandidate::new(vec![f], Route::new(a.line[0], vec![a.line[1]]));
        assert_eq!(fuel_charge(&ctx, &candidate).get(PUS), 0);
        assert!(validate_fuel(&ctx, &candidate).is_ok());
    }

    #[test]
    fn units_that_moved_into_a_battle_stay() {
        let mut a = airfield();
        let t = a.state.add_unit(a.tank, a.me, a.line[1]);
        let f = a.state.add_unit(a.fighter, a.me, a.line[1]);
        a.state.territory_mut(a.line[1]).pending_battle = true;
        a.state.spend_movement(t, Movement::ONE);
        a.state.record_move(vec![t, f], Route::new(a.line[0], vec![a.line[1]]));
        let rules = Ruleset::default();
        let ctx = RuleContext::new(&a.state, &rules, a.me, ValidationMode::combat());
        let out = Route::new(a.line[1], vec![a.line[2]]);
        assert_eq!(
            validate_battle_zone_exit(&ctx, &MoveCandidate::new(vec![t], out.clone())),
            Err(MoveError::LeaveBattleZone)
        );
        assert!(validate_battle_zone_exit(&ctx, &MoveCandidate::new(vec![f], out)).is_ok());
    }
}
