//! Airborne launches: land or sea units flown out from an airborne base
//! as a special move, outside the normal movement rules.

use crate::board::{AirborneTech, TerritoryId, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::verdict::{Findings, MoveError, PassResult, Reason};

/// Rejects every unit the mover does not own.
pub fn validate_owned_only(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    if !ctx.edit_mode() {
        findings.disallow_all(
            Reason::OwnedUnitsOnly,
            candidate.units.iter().copied().filter(|&u| !ctx.is_owned(u)),
        );
    }
    Ok(findings)
}

pub fn validate_airborne(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    let Some(tech) = &ctx.mover().tech.airborne else {
        return Err(MoveError::NoAirborneTech);
    };
    if tech.distance == 0 || tech.bases.is_empty() || tech.types.is_empty() {
        return Err(MoveError::NoAirborneForces);
    }
    let route = &candidate.route;
    let units = &candidate.units;
    if route.number_of_steps() > tech.distance as usize {
        return Err(MoveError::OutOfRange);
    }
    let start = route.start();
    let end = route.end();
    let bases = bases_at(ctx, tech, start);
    if bases == 0 {
        return Err(MoveError::NoAirborneBase);
    }
    let capacity = bases * tech.capacity_per_base as usize;
    if capacity == 0 {
        return Err(MoveError::NoLaunchCapacity);
    }
    findings.disallow_all(Reason::AirborneCapacityReached, units.iter().copied().skip(capacity));

    let mut airborne = Vec::new();
    for &unit in units {
        let reason = if !ctx.is_owned(unit) {
            Reason::MustOwnAirborneForces
        } else if !tech.types.contains(&ctx.unit(unit).type_id) {
            Reason::NotAirborneForces
        } else if ctx.is_disabled(unit) {
            Reason::AirborneDisabled
        } else if ctx.has_moved(unit) {
            Reason::AirborneAlreadyMoved
        } else if ctx.unit(unit).airborne {
            Reason::AlreadyAirborne
        } else {
            airborne.push(unit);
            continue;
        };
        findings.disallow(reason, unit);
    }
    if airborne.is_empty() {
        return Ok(findings);
    }

    let steps = route.steps();
    if steps.is_empty() || !steps.iter().all(|&t| ctx.is_passable_and_not_restricted(t)) {
        return Err(MoveError::AirborneOverImpassable);
    }
    if !steps.iter().all(|&t| ctx.allows_air_over_owned_land(t)) {
        return Err(MoveError::AirborneOverForbidden);
    }
    let some_land = airborne.iter().any(|&u| ctx.is_land(u));
    let some_sea = airborne.iter().any(|&u| ctx.is_sea(u));
    let end_water = ctx.is_water(end);
    match (some_land, some_sea) {
        (true, true) => return Err(MoveError::MixedLandAndSea),
        (true, false) if end_water => return Err(MoveError::LandToSea),
        (false, true) if !end_water => return Err(MoveError::SeaToLand),
        _ => {}
    }

    let target = ctx.territory(end);
    if ctx.rules.airborne_attacks_only_in_existing_battles {
        if !target.conquered {
            if !target.pending_battle {
                return Err(MoveError::NotUnderAssault);
            }
            let attackers = &target.attackers;
            if !end_water && some_land && !attackers.iter().any(|&u| ctx.is_land(u)) {
                return Err(MoveError::NoLandAttackers);
            }
            if end_water && some_sea && !attackers.iter().any(|&u| ctx.is_sea(u)) {
                return Err(MoveError::NoSeaAttackers);
            }
        }
    } else if ctx.rules.airborne_attacks_only_in_enemy_territories
        && !(ctx.is_territory_enemy_not_unowned_water(end) || ctx.has_enemy_units(end))
    {
        return Err(MoveError::NotEnemyDestination);
    }
    Ok(findings)
}

/// Bases at `t` able to launch this turn: ours or an ally's, working,
/// and not yet used.
fn bases_at(ctx: &RuleContext<'_>, tech: &AirborneTech, t: TerritoryId) -> usize {
    let is_base = |u: UnitId| {
        ctx.is_allied_unit(u)
            && tech.bases.contains(&ctx.unit(u).type_id)
            && !ctx.is_disabled(u)
            && !ctx.has_moved(u)
            && !ctx.unit(u).airborne
    };
    ctx.state.units_in(t).filter(|&u| is_base(u)).count()
}
