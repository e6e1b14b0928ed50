//! Sea transport loading and unloading.

use std::collections::BTreeSet;

use crate::board::{TerritoryId, UnitId, UnitTypeId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::{
    available_capacity, load_restricted_after_combat, loaded_on_allied_transports_this_turn,
    non_paratroopers_present, unload_restricted_in_non_combat, unload_restricted_to_another_territory,
    unloaded_in_previous_phase,
};
use super::path::only_ignored_units_on_path;
use super::verdict::{Findings, MoveError, PassResult, Reason};

pub fn validate_transport(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    let route = &candidate.route;
    let units = &candidate.units;
    let map = &ctx.state.map;
    if !route.has_water(map) || units.iter().all(|&u| ctx.is_air(u)) {
        return Ok(findings);
    }
    let transports = &candidate.sea_transports;
    if !transports.is_empty() && !transports.values().any(|&t| ctx.is_sea_transport(t)) {
        return Ok(findings);
    }
    let edit = ctx.edit_mode();
    let start = route.start();
    let end = route.end();

    if !edit && route.is_unload(map) {
        if route.has_more_than_one_step() {
            return Err(MoveError::UnloadMustStop);
        }
        findings.disallow_all(
            Reason::AlliedTransportLoadedThisTurn,
            loaded_on_allied_transports_this_turn(ctx, units),
        );
        for transport in unloading_transports(ctx, units) {
            check_unload(ctx, transport, start, end, &mut findings);
        }
    }

    let land: Vec<UnitId> = units.iter().copied().filter(|&u| ctx.is_land(u)).collect();
    let land_and_air: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&u| ctx.is_land(u) || ctx.is_air(u))
        .collect();
    findings.disallow_all(
        Reason::CannotBeTransported,
        land.iter().copied().filter(|&u| !ctx.ty(u).can_be_transported()),
    );

    let start_water = ctx.is_water(start);
    let end_water = ctx.is_water(end);
    if !edit && route.has_land(map) && !(start_water || end_water) && non_paratroopers_present(ctx, &land_and_air) {
        return Err(MoveError::LandOnlyAtEnds);
    }

    if start_water && end_water {
        for &unit in units {
            let ty = ctx.ty(unit);
            if ty.can_transport() && !ctx.unit(unit).transporting.iter().all(|c| units.contains(c)) {
                findings.disallow(Reason::TransportsCannotLeaveCargo, unit);
            }
            if ty.can_be_transported() {
                if let Some(transport) = ctx.unit(unit).transported_by {
                    if !units.contains(&transport) {
                        findings.disallow(Reason::MustStayWithTransport, unit);
                    }
                }
            }
        }
    }

    if route.is_load(map) {
        check_load(ctx, candidate, &land, &land_and_air, &mut findings)?;
    }
    Ok(findings)
}

/// Distinct transports carrying any of `units`, in first-seen order.
fn unloading_transports(ctx: &RuleContext<'_>, units: &[UnitId]) -> Vec<UnitId> {
    let mut transports = Vec::new();
    for transport in units.iter().filter_map(|&u| ctx.unit(u).transported_by) {
        if !transports.contains(&transport) {
            transports.push(transport);
        }
    }
    transports
}

fn check_unload(ctx: &RuleContext<'_>, transport: UnitId, start: TerritoryId, end: TerritoryId, findings: &mut Findings) {
    let cargo = ctx.unit(transport).transporting.iter().copied();
    if ctx.mode.is_combat() {
        if ctx.has_enemy_units(end) || ctx.is_territory_enemy_not_unowned_water(end) {
            // Amphibious assault: an enemy submarine stops an unescorted landing.
            let escorted = ctx
                .state
                .units_in(start)
                .any(|u| ctx.is_owned(u) && ctx.is_sea(u) && ctx.is_not_sea_transport_but_could_be_combat(u));
            let enemy_sub = ctx
                .state
                .units_in(start)
                .any(|u| ctx.is_enemy_unit(u) && ctx.ty(u).abilities.can_be_moved_through_by_enemies);
            if ctx.rules.submarines_prevent_unescorted_amphibious_assaults && !escorted && enemy_sub {
                findings.disallow_all(Reason::SubmarinePreventsLanding, cargo.clone());
            }
        } else if !ctx.territory(end).conquered
            && (ctx.rules.scramble_rules_in_effect
                || ctx.rules.use_kamikaze_suicide_attacks
                || !ctx.is_empty_of_combat_units(start))
        {
            findings.disallow_all(Reason::UnloadBeforeCombatResolved, cargo.clone());
        }
    }

    if unloaded_in_previous_phase(ctx, transport) {
        findings.disallow_all(Reason::UnloadedInPreviousPhase, cargo);
    } else if unload_restricted_to_another_territory(ctx, transport, end) {
        if let Some(unloaded_to) = ctx.unit(transport).history.unloaded_to {
            let name = ctx.territory(unloaded_to).name.clone();
            findings.disallow_all(Reason::AlreadyUnloadedTo(name), cargo);
        }
    } else if unload_restricted_in_non_combat(ctx, transport) {
        findings.disallow_all(Reason::LoadAndUnloadAfterCombat, cargo);
    }
}

fn check_load(
    ctx: &RuleContext<'_>,
    candidate: &MoveCandidate,
    land: &[UnitId],
    land_and_air: &[UnitId],
    findings: &mut Findings,
) -> Result<(), MoveError> {
    let route = &candidate.route;
    let end = route.end();
    let edit = ctx.edit_mode();
    let paratroopers_absent = non_paratroopers_present(ctx, land_and_air);
    if !edit && !route.has_exactly_one_step() && paratroopers_absent {
        return Err(MoveError::MovedBeforeLoading);
    }

    let hostile_fleet = ctx
        .state
        .units_in(end)
        .any(|u| ctx.is_enemy_unit(u) && !ctx.is_submerged(u));
    if !ctx.rules.units_can_load_in_hostile_sea_zones
        && hostile_fleet
        && paratroopers_absent
        && !only_ignored_units_on_path(ctx, route, false)
        && !all_just_went_to_war(ctx, end)
    {
        return Err(MoveError::EnemySeaUnitsAtLoad);
    }

    let transports = &candidate.sea_transports;
    if !edit {
        for &unit in land {
            if ctx.has_moved(unit) {
                findings.disallow(Reason::MovedBeforeLoading, unit);
            }
            let Some(&transport) = transports.get(&unit) else {
                continue;
            };
            if unloaded_in_previous_phase(ctx, transport) {
                findings.disallow(Reason::UnloadedInPreviousPhase, unit);
            } else if load_restricted_after_combat(ctx, transport) {
                findings.disallow(Reason::CannotLoadAfterCombat, unit);
            } else if unload_restricted_to_another_territory(ctx, transport, end) {
                let cost = ctx.transport_cost(unit);
                let other_fits = transports.values().any(|&other| {
                    !unload_restricted_to_another_territory(ctx, other, end) && available_capacity(ctx, other) >= cost
                });
                if let (false, Some(unloaded_to)) = (other_fits, ctx.unit(transport).history.unloaded_to) {
                    let name = ctx.territory(unloaded_to).name.clone();
                    findings.disallow(Reason::AlreadyUnloadedTo(name), unit);
                }
            }
        }
    }

    let unmapped: Vec<UnitId> = land
        .iter()
        .copied()
        .filter(|u| !transports.contains_key(u))
        .collect();
    if unmapped.is_empty() {
        return Ok(());
    }
    let categories: BTreeSet<(UnitTypeId, _)> = land
        .iter()
        .map(|&u| (ctx.unit(u).type_id, ctx.unit(u).movement_left))
        .collect();
    let carried = |u: &UnitId| ctx.ty(*u).can_be_transported();
    if transports.is_empty() || categories.len() == 1 {
        findings.disallow_all(Reason::NotEnoughTransports, unmapped.into_iter().filter(carried));
    } else {
        // Several kinds of unit competed for the transports; the player
        // has to say which ones go.
        for &unit in land.iter().filter(|u| carried(u)) {
            findings.unresolve(Reason::NotEnoughTransports, unit);
        }
    }
    Ok(())
}

/// Every enemy at `t` is at war with us only since this turn.
fn all_just_went_to_war(ctx: &RuleContext<'_>, t: TerritoryId) -> bool {
    ctx.state.units_in(t).filter(|&u| ctx.is_enemy_unit(u)).all(|u| {
        ctx.state
            .war_declared_this_turn(ctx.player, ctx.unit(u).owner)
    })
}
