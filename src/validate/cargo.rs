//! Who travels with whom: transports, carriers and paratroopers.
//!
//! Everything here packs greedily in a fixed order. The packings are not
//! optimal, but they are the packings players expect, and they make every
//! verdict reproducible.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Route, TerritoryId, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;

/// Transport or carrier to the units that must move with it.
pub type Dependents = BTreeMap<UnitId, Vec<UnitId>>;

/// Units that move on their own, not as cargo. From a sea zone only air
/// and sea units qualify, since land units there are aboard something.
pub fn find_non_dependent_units(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> Vec<UnitId> {
    let start_is_water = ctx.is_water(candidate.route.start());
    let declared: BTreeSet<UnitId> = candidate.air_dependent_units().collect();
    candidate
        .units
        .iter()
        .copied()
        .filter(|&u| !start_is_water || !ctx.is_land(u))
        .filter(|&u| !ctx.is_transported(u))
        .filter(|u| !declared.contains(u))
        .collect()
}

/// Units riding with something else in this move: already aboard a moving
/// unit, allied air forced onto a moving carrier, or declared paratroopers.
pub fn dependent_units(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> BTreeSet<UnitId> {
    let units = &candidate.units;
    let mut dependents: BTreeSet<UnitId> = units
        .iter()
        .copied()
        .filter(|&u| ctx.unit(u).transported_by.is_some_and(|t| units.contains(&t)))
        .collect();
    dependents.extend(carrier_must_move_with(ctx, units, units).into_values().flatten());
    dependents.extend(candidate.air_dependent_units());
    dependents
}

/// Everything that must travel with the moving units out of `start`.
pub fn must_move_with(
    ctx: &RuleContext<'_>,
    start: TerritoryId,
    units: &[UnitId],
    air_dependents: &Dependents,
) -> Dependents {
    let mut sorted = units.to_vec();
    sorted.sort_by(|&a, &b| ctx.unit(b).movement_left.cmp(&ctx.unit(a).movement_left));

    let mut mapping = Dependents::new();
    for &transport in sorted.iter().filter(|&&u| ctx.is_sea_transport(u)) {
        let cargo = transporting_in(ctx, transport, start);
        if !cargo.is_empty() {
            mapping.insert(transport, cargo);
        }
    }
    let start_units: Vec<UnitId> = ctx.state.units_in(start).collect();
    add_to_mapping(&mut mapping, carrier_must_move_with(ctx, &sorted, &start_units));

    let mut air = Dependents::new();
    for &transport in sorted.iter().filter(|&&u| ctx.is_air_transport(u)) {
        let mut cargo = transporting_in(ctx, transport, start);
        if cargo.is_empty() {
            cargo = air_dependents.get(&transport).cloned().unwrap_or_default();
        }
        if !cargo.is_empty() {
            air.insert(transport, cargo);
        }
    }
    add_to_mapping(&mut mapping, air);
    mapping
}

fn transporting_in(ctx: &RuleContext<'_>, transport: UnitId, t: TerritoryId) -> Vec<UnitId> {
    ctx.unit(transport)
        .transporting
        .iter()
        .copied()
        .filter(|&c| ctx.unit(c).location == t)
        .collect()
}

fn add_to_mapping(mapping: &mut Dependents, extra: Dependents) {
    for (key, units) in extra {
        mapping.entry(key).or_default().extend(units);
    }
}

/// Allied air in `start_units` that no allied carrier there can hold, forced
/// onto the mover's carriers among `units` in order.
pub fn carrier_must_move_with(ctx: &RuleContext<'_>, units: &[UnitId], start_units: &[UnitId]) -> Dependents {
    let mut allied_air: Vec<UnitId> = start_units
        .iter()
        .copied()
        .filter(|&u| ctx.is_allied_not_owned(u) && ctx.can_land_on_carrier(u))
        .collect();
    if allied_air.is_empty() {
        return Dependents::new();
    }
    for carrier in start_units
        .iter()
        .copied()
        .filter(|&u| ctx.is_carrier(u) && ctx.is_allied_not_owned(u))
    {
        let carried = can_carry(ctx, carrier, &allied_air);
        allied_air.retain(|u| !carried.contains(u));
    }
    if allied_air.is_empty() {
        return Dependents::new();
    }
    let mut mapping = Dependents::new();
    for carrier in units.iter().copied().filter(|&u| ctx.is_carrier(u) && ctx.is_owned(u)) {
        let carried = can_carry(ctx, carrier, &allied_air);
        allied_air.retain(|u| !carried.contains(u));
        mapping.insert(carrier, carried);
    }
    mapping
}

/// Planes from `select_from` that fit on `carrier`, taken in order. Our own
/// planes only count when they started alongside the carrier.
pub fn can_carry(ctx: &RuleContext<'_>, carrier: UnitId, select_from: &[UnitId]) -> Vec<UnitId> {
    let carrier_unit = ctx.unit(carrier);
    let mut available = ctx.ty(carrier).carrier_capacity.unwrap_or(0);
    let mut carried = Vec::new();
    for &plane in select_from {
        let cost = ctx.carrier_cost(plane);
        if available >= cost {
            let plane_unit = ctx.unit(plane);
            let together = carrier_unit.already_moved == plane_unit.already_moved
                || (!plane_unit.has_moved() && !carrier_unit.has_moved())
                || ctx.is_allied_not_owned(plane);
            if together {
                available -= cost;
                carried.push(plane);
            }
        }
        if available == 0 {
            break;
        }
    }
    carried
}

/// Whether the move boards transports: it leaves land over water with
/// transportable units that are not already aboard a moving transport.
pub fn is_load(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> bool {
    let route = &candidate.route;
    let loaded = must_move_with(ctx, route.start(), &candidate.units, &candidate.air_dependents);
    if route.has_no_steps() && loaded.is_empty() {
        return false;
    }
    if ctx.is_water(route.start()) || !route.has_water(&ctx.state.map) {
        return false;
    }
    let transports: Vec<UnitId> = candidate
        .units
        .iter()
        .copied()
        .filter(|&u| ctx.is_sea_transport(u) || ctx.is_air_transport(u))
        .collect();
    if !transports.iter().all(|t| loaded.contains_key(t)) {
        return true;
    }
    candidate
        .units
        .iter()
        .copied()
        .filter(|&u| ctx.ty(u).can_be_transported() || ctx.is_air_transportable(u))
        .any(|u| !transports.iter().any(|t| loaded.get(t).map_or(true, |c| c.contains(&u))))
}

/// Units in `to_carry` that land transports in `potential` cannot carry.
///
/// Needs mechanized infantry. One-to-one transports are used first; units
/// are placed heaviest first into the first capacity transport with room.
pub fn check_land_transports(ctx: &RuleContext<'_>, potential: &[UnitId], to_carry: &[UnitId]) -> Vec<UnitId> {
    let mechanized = ctx.mover().tech.mechanized_infantry;
    let owned_transports = potential
        .iter()
        .copied()
        .filter(|&u| mechanized && ctx.is_owned(u) && ctx.is_land_transport(u));
    let mut one_to_one = 0usize;
    let mut with_capacity: Vec<(UnitId, u32)> = Vec::new();
    for transport in owned_transports {
        match ctx.ty(transport).transport_capacity {
            Some(capacity) => with_capacity.push((transport, capacity)),
            None => one_to_one += 1,
        }
    }

    let mut sorted = to_carry.to_vec();
    sorted.sort_by_key(|&u| std::cmp::Reverse(ctx.transport_cost(u)));
    let mut failed = Vec::new();
    for unit in sorted {
        let mut ok = false;
        if !ctx.has_moved(unit) && ctx.is_land_transportable(unit) {
            if one_to_one > 0 {
                one_to_one -= 1;
                ok = true;
            } else {
                let cost = ctx.transport_cost(unit);
                if let Some(slot) = with_capacity.iter_mut().find(|(_, room)| cost <= *room) {
                    slot.1 -= cost;
                    ok = true;
                }
            }
        }
        if !ok {
            failed.push(unit);
        }
    }
    failed
}

// Transport history

/// Capacity left on a transport after its cargo and what it already
/// unloaded this turn.
pub fn available_capacity(ctx: &RuleContext<'_>, transport: UnitId) -> u32 {
    let Some(capacity) = ctx.ty(transport).transport_capacity else {
        return 0;
    };
    let unit = ctx.unit(transport);
    let used: u32 = unit.transporting.iter().map(|&c| ctx.transport_cost(c)).sum();
    capacity.saturating_sub(used).saturating_sub(unit.history.unloaded_cost)
}

/// Cargo came off during combat movement and it is now non-combat.
pub fn unloaded_in_previous_phase(ctx: &RuleContext<'_>, transport: UnitId) -> bool {
    ctx.mode.is_non_combat() && ctx.unit(transport).history.unloaded_in_combat_phase
}

/// This transport already unloaded somewhere other than `t` and may not
/// split its unloading.
pub fn unload_restricted_to_another_territory(ctx: &RuleContext<'_>, transport: UnitId, t: TerritoryId) -> bool {
    let Some(unloaded_to) = ctx.unit(transport).history.unloaded_to else {
        return false;
    };
    if unloaded_to == t {
        return false;
    }
    ctx.rules.ww2v2 || ctx.rules.transport_unload_restricted || ctx.mode.is_combat()
}

pub fn unload_restricted_in_non_combat(ctx: &RuleContext<'_>, transport: UnitId) -> bool {
    let unit = ctx.unit(transport);
    ctx.mode.is_non_combat() && unit.was_in_combat && unit.was_loaded_after_combat
}

pub fn load_restricted_after_combat(ctx: &RuleContext<'_>, transport: UnitId) -> bool {
    (ctx.rules.ww2v3 || ctx.rules.lhtr_carrier_production_rules)
        && ctx.mode.is_non_combat()
        && ctx.unit(transport).was_in_combat
}

/// Units aboard an ally's transport that they boarded this turn.
pub fn loaded_on_allied_transports_this_turn(ctx: &RuleContext<'_>, units: &[UnitId]) -> Vec<UnitId> {
    units
        .iter()
        .copied()
        .filter(|&u| {
            let unit = ctx.unit(u);
            unit.was_loaded_this_turn
                && unit
                    .transported_by
                    .is_some_and(|t| ctx.unit(t).owner != unit.owner)
        })
        .collect()
}

// Paratroopers

/// Assigns each paratrooper to an air transport, heaviest first, trying
/// our own transports before allied ones. `None` if one does not fit.
pub fn map_paratroopers(
    ctx: &RuleContext<'_>,
    paratroopers: &[UnitId],
    air_transports: &[UnitId],
) -> Option<BTreeMap<UnitId, UnitId>> {
    let (owned, allied): (Vec<UnitId>, Vec<UnitId>) =
        air_transports.iter().copied().partition(|&t| ctx.is_owned(t));
    let mut room: BTreeMap<UnitId, u32> = air_transports
        .iter()
        .map(|&t| (t, available_capacity(ctx, t)))
        .collect();
    let mut sorted = paratroopers.to_vec();
    sorted.sort_by_key(|&u| std::cmp::Reverse(ctx.transport_cost(u)));

    let mut mapping = BTreeMap::new();
    for unit in sorted {
        let cost = ctx.transport_cost(unit);
        let transport = owned
            .iter()
            .chain(allied.iter())
            .copied()
            .find(|t| room.get(t).is_some_and(|&r| r >= cost))?;
        if let Some(r) = room.get_mut(&transport) {
            *r -= cost;
        }
        mapping.insert(unit, transport);
    }
    Some(mapping)
}

/// Every unit is air, air transport or paratrooper, and the air transports
/// in the move can lift every paratrooper.
pub fn all_land_units_are_being_paratroopered(ctx: &RuleContext<'_>, units: &[UnitId]) -> bool {
    if units.is_empty()
        || !units
            .iter()
            .all(|&u| ctx.is_air_transportable(u) || ctx.is_air_transport(u) || ctx.is_air(u))
    {
        return false;
    }
    let paratroopers: Vec<UnitId> = units.iter().copied().filter(|&u| ctx.is_air_transportable(u)).collect();
    if paratroopers.is_empty() {
        return false;
    }
    let transports: Vec<UnitId> = units.iter().copied().filter(|&u| ctx.is_air_transport(u)).collect();
    map_paratroopers(ctx, &paratroopers, &transports).is_some()
}

/// Whether any unit is not flying in as a paratrooper, which subjects the
/// move to the ordinary land movement rules.
pub fn non_paratroopers_present(ctx: &RuleContext<'_>, units: &[UnitId]) -> bool {
    if !ctx.mover().tech.paratroopers {
        return true;
    }
    if !units.iter().all(|&u| ctx.is_air(u) || ctx.is_land(u)) {
        return true;
    }
    if units.iter().any(|&u| ctx.is_land(u) && !ctx.is_air_transportable(u)) {
        return true;
    }
    !all_land_units_are_being_paratroopered(ctx, units)
}

/// Units whose remaining movement covers `route`.
pub fn split_by_movement(ctx: &RuleContext<'_>, units: &[UnitId], route: &Route) -> (Vec<UnitId>, Vec<UnitId>) {
    units
        .iter()
        .copied()
        .partition(|&u| ctx.has_enough_movement_for_route(u, route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, Movement, PlayerId, RelationshipKind, UnitType, UnitTypeId};
    use crate::rules::{Ruleset, ValidationMode};

    struct Sea {
        state: GameState,
        me: PlayerId,
        ally: PlayerId,
        fighter: UnitTypeId,
        carrier: UnitTypeId,
        sz: TerritoryId,
    }

    fn sea() -> Sea {
        let mut state = GameState::new();
        let me = state.add_player("Americans");
        let ally = state.add_player("British");
        state.set_relationship(me, ally, RelationshipKind::Allied);
        let mut fighter = UnitType::new("fighter", Domain::Air, 4);
        fighter.carrier_cost = Some(1);
        let fighter = state.add_unit_type(fighter);
        let mut carrier = UnitType::new("carrier", Domain::Sea, 2);
        carrier.carrier_capacity = Some(2);
        let carrier = state.add_unit_type(carrier);
        let sz = state.add_territory("sz7", true);
        Sea {
            state,
            me,
            ally,
            fighter,
            carrier,
            sz,
        }
    }

    fn ctx<'a>(state: &'a GameState, rules: &'a Ruleset, player: PlayerId) -> RuleContext<'a> {
        RuleContext::new(state, rules, player, ValidationMode::combat())
    }

    #[test]
    fn allied_air_rides_owned_carriers_when_no_allied_carrier_has_room() {
        let mut s = sea();
        let c = s.state.add_unit(s.carrier, s.me, s.sz);
        let a1 = s.state.add_unit(s.fighter, s.ally, s.sz);
        let a2 = s.state.add_unit(s.fighter, s.ally, s.sz);
        let a3 = s.state.add_unit(s.fighter, s.ally, s.sz);
        let rules = Ruleset::default();
        let start_units: Vec<_> = s.state.units_in(s.sz).collect();
        let map = carrier_must_move_with(&ctx(&s.state, &rules, s.me), &[c], &start_units);
        assert_eq!(map.get(&c), Some(&vec![a1, a2]));
        assert!(!map.values().flatten().any(|&u| u == a3));
    }

    #[test]
    fn allied_carrier_absorbs_allied_air_first() {
        let mut s = sea();
        let c = s.state.add_unit(s.carrier, s.me, s.sz);
        s.state.add_unit(s.carrier, s.ally, s.sz);
        s.state.add_unit(s.fighter, s.ally, s.sz);
        s.state.add_unit(s.fighter, s.ally, s.sz);
        let rules = Ruleset::default();
        let start_units: Vec<_> = s.state.units_in(s.sz).collect();
        assert!(carrier_must_move_with(&ctx(&s.state, &rules, s.me), &[c], &start_units).is_empty());
    }

    #[test]
    fn own_plane_that_moved_separately_is_not_carried() {
        let mut s = sea();
        let c = s.state.add_unit(s.carrier, s.me, s.sz);
        let f = s.state.add_unit(s.fighter, s.me, s.sz);
        s.state.spend_movement(f, Movement::from_int(2));
        let rules = Ruleset::default();
        assert!(can_carry(&ctx(&s.state, &rules, s.me), c, &[f]).is_empty());
        s.state.spend_movement(c, Movement::from_int(2));
        assert_eq!(can_carry(&ctx(&s.state, &rules, s.me), c, &[f]), vec![f]);
    }

    #[test]
    fn land_transports_need_the_tech() {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let mut truck = UnitType::new("halftrack", Domain::Land, 2);
        truck.abilities.is_land_transport = true;
        let truck = state.add_unit_type(truck);
        let mut infantry = UnitType::new("infantry", Domain::Land, 1);
        infantry.abilities.is_land_transportable = true;
        infantry.transport_cost = Some(2);
        let infantry = state.add_unit_type(infantry);
        let t = state.add_territory("Berlin", false);
        let h = state.add_unit(truck, me, t);
        let i1 = state.add_unit(infantry, me, t);
        let i2 = state.add_unit(infantry, me, t);
        let rules = Ruleset::default();
        assert_eq!(check_land_transports(&ctx(&state, &rules, me), &[h], &[i1]), vec![i1]);
        state.player_mut(me).tech.mechanized_infantry = true;
        assert_eq!(check_land_transports(&ctx(&state, &rules, me), &[h], &[i1, i2]), vec![i2]);
    }

    #[test]
    fn capacity_land_transports_pack_heaviest_first() {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        state.player_mut(me).tech.mechanized_infantry = true;
        let mut truck = UnitType::new("truck", Domain::Land, 2);
        truck.abilities.is_land_transport = true;
        truck.transport_capacity = Some(3);
        let truck = state.add_unit_type(truck);
        let mut light = UnitType::new("infantry", Domain::Land, 1);
        light.abilities.is_land_transportable = true;
        light.transport_cost = Some(1);
        let light = state.add_unit_type(light);
        let mut heavy = UnitType::new("artillery", Domain::Land, 1);
        heavy.abilities.is_land_transportable = true;
        heavy.transport_cost = Some(2);
        let heavy = state.add_unit_type(heavy);
        let t = state.add_territory("Berlin", false);
        let tr = state.add_unit(truck, me, t);
        let l1 = state.add_unit(light, me, t);
        let l2 = state.add_unit(light, me, t);
        let h = state.add_unit(heavy, me, t);
        let rules = Ruleset::default();
        let failed = check_land_transports(&ctx(&state, &rules, me), &[tr], &[l1, l2, h]);
        assert_eq!(failed, vec![l2]);
    }

    #[test]
    fn paratroopers_need_tech_and_room() {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let mut bomber = UnitType::new("bomber", Domain::Air, 6);
        bomber.abilities.is_air_transport = true;
        bomber.transport_capacity = Some(1);
        let bomber = state.add_unit_type(bomber);
        let mut para = UnitType::new("infantry", Domain::Land, 1);
        para.abilities.is_air_transportable = true;
        para.transport_cost = Some(1);
        let para = state.add_unit_type(para);
        let t = state.add_territory("Berlin", false);
        let b = state.add_unit(bomber, me, t);
        let p1 = state.add_unit(para, me, t);
        let p2 = state.add_unit(para, me, t);
        let rules = Ruleset::default();
        assert!(non_paratroopers_present(&ctx(&state, &rules, me), &[b, p1]));
        state.player_mut(me).tech.paratroopers = true;
        assert!(!non_paratroopers_present(&ctx(&state, &rules, me), &[b, p1]));
        assert!(non_paratroopers_present(&ctx(&state, &rules, me), &[b, p1, p2]));
    }

    #[test]
    fn unload_restriction_depends_on_rules_and_phase() {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let mut transport = UnitType::new("transport", Domain::Sea, 2);
        transport.transport_capacity = Some(2);
        let transport = state.add_unit_type(transport);
        let sz = state.add_territory("sz5", true);
        let a = state.add_territory("Norway", false);
        let b = state.add_territory("Finland", false);
        let tr = state.add_unit(transport, me, sz);
        state.unit_mut(tr).history.unloaded_to = Some(a);
        state.unit_mut(tr).history.unloaded_cost = 1;
        let rules = Ruleset::default();
        let combat = ctx(&state, &rules, me);
        assert!(unload_restricted_to_another_territory(&combat, tr, b));
        assert!(!unload_restricted_to_another_territory(&combat, tr, a));
        assert_eq!(available_capacity(&combat, tr), 1);
        let non_combat = RuleContext::new(&state, &rules, me, ValidationMode::non_combat());
        assert!(!unload_restricted_to_another_territory(&non_combat, tr, b));
        let strict = Ruleset {
            transport_unload_restricted: true,
            ..Ruleset::default()
        };
        let non_combat = RuleContext::new(&state, &strict, me, ValidationMode::non_combat());
        assert!(unload_restricted_to_another_territory(&non_combat, tr, b));
    }
}
