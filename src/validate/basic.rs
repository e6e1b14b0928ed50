//! Structural pass: the assignment maps are consistent, the units belong to
//! the mover and can make the trip, and nobody ends up somewhere their
//! terrain, territory effects or stacking limits forbid.

use crate::board::{LimitKind, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::{check_land_transports, find_non_dependent_units, split_by_movement};
use super::stacking::filter_units;
use super::verdict::{Findings, MoveError, PassResult, Reason};

pub fn validate_basic(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let route = &candidate.route;
    let units = &candidate.units;
    let map = &ctx.state.map;
    let mut findings = Findings::new();

    let end_units = &ctx.territory(route.end()).units;
    let transports: Vec<UnitId> = candidate.sea_transports.values().copied().collect();
    if !transports.iter().all(|t| end_units.contains(t)) && !transports.iter().all(|t| units.contains(t)) {
        return Err(MoveError::TransportsNotAtEnd);
    }
    let air_ok = candidate.air_dependents.keys().all(|t| units.contains(t))
        && candidate.air_dependent_units().all(|u| units.contains(&u));
    if !air_ok {
        return Err(MoveError::AirTransportsNotMoving);
    }

    if !ctx.edit_mode() {
        findings.disallow_all(
            Reason::FriendlyUnitsOnly,
            units.iter().copied().filter(|&u| ctx.is_enemy_unit(u)),
        );

        let independent = find_non_dependent_units(ctx, candidate);
        let (enough, short) = split_by_movement(ctx, &independent, route);
        findings.disallow_all(Reason::NotEnoughMovement, check_land_transports(ctx, &enough, &short));

        for &unit in independent.iter().filter(|&&u| !ctx.is_owned(u)) {
            let allied_carrier_plane = ctx.carrier_cost(unit) > 0 && ctx.is_allied_unit(unit);
            if !allied_carrier_plane {
                findings.disallow(Reason::OwnTroopsOnly, unit);
            }
        }

        if route.has_neutral_before_end(map)
            && !units.iter().all(|&u| ctx.is_air(u))
            && !ctx.rules.neutrals_blitzable_effective()
        {
            return Err(MoveError::MustStopInNeutral);
        }

        if route.steps().iter().any(|&t| !ctx.territory_effects_allow(t, units)) {
            return Err(MoveError::TerritoryEffects {
                plural: route.has_more_than_one_step(),
            });
        }

        let needing_support: &[UnitId] = if route.is_unload(map) { units } else { &independent };
        for t in route.all_territories() {
            if !ctx.all_have_required_units_to_move(needing_support, t) {
                return Err(MoveError::MissingRequiredUnits(ctx.territory(t).name.clone()));
            }
        }
    }

    if ctx.is_water(route.end()) {
        findings.disallow_all(
            Reason::CannotEndAtWater,
            units.iter().copied().filter(|&u| cannot_go_on_water(ctx, u)),
        );
    }
    if route.has_land(map) {
        findings.disallow_all(Reason::SeaUnitsOnLand, units.iter().copied().filter(|&u| ctx.is_sea(u)));
    }

    let limited: Vec<UnitId> = units.iter().copied().filter(|&u| has_stacking_limit(ctx, u)).collect();
    if !limited.is_empty() {
        for &t in route.steps() {
            let kind = if ctx.is_territory_enemy_not_unowned_water(t) || ctx.has_enemy_units(t) {
                LimitKind::Attacking
            } else {
                LimitKind::Movement
            };
            let allowed = filter_units(ctx, &limited, kind, t, &[]);
            for &unit in limited.iter().filter(|u| !allowed.contains(u)) {
                findings.disallow(Reason::StackingLimit(ctx.ty(unit).name.clone()), unit);
            }
        }
    }

    if !ctx.edit_mode() && route.all_territories().any(|t| ctx.is_impassable(t)) {
        return Err(MoveError::Impassable);
    }
    let toll = ctx.rules.neutral_charge_for(route.empty_neutrals(map).len());
    if ctx.mover().pus() < toll {
        return Err(MoveError::TooPoorToViolateNeutrality);
    }
    if ctx.rules.neutrals_impassable
        && !ctx.rules.neutrals_blitzable_effective()
        && route.steps().iter().any(|&t| ctx.is_neutral_land(t))
    {
        return Err(MoveError::CannotViolateNeutrality);
    }
    Ok(findings)
}

/// Land units that nothing could carry onto a sea zone.
fn cannot_go_on_water(ctx: &RuleContext<'_>, u: UnitId) -> bool {
    !ctx.is_sea(u) && !ctx.is_air(u) && ctx.ty(u).transport_cost.is_none()
}

/// The type carries a movement or attacking limit, or a player rule names it.
fn has_stacking_limit(ctx: &RuleContext<'_>, u: UnitId) -> bool {
    if ctx.ty(u).has_stacking_limits() {
        return true;
    }
    let type_id = ctx.unit(u).type_id;
    let owner = ctx.state.player(ctx.unit(u).owner);
    [LimitKind::Movement, LimitKind::Attacking]
        .into_iter()
        .any(|kind| owner.limits(kind).any(|rule| rule.types.contains(&type_id)))
}
