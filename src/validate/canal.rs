//! Canal passage.
//!
//! A canal joins sea zones and is flanked by land territories. Crossing it
//! requires a relationship with every flank owner that permits passage, and
//! flanks conquered this turn do not count as controlled yet.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::board::{Canal, Route, TerritoryId, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::{check_land_transports, find_non_dependent_units};
use super::verdict::{Findings, PassResult, Reason};

/// Why a canal cannot be crossed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanalBlockage {
    CombatMove(String),
    NotControlled(String),
    RecentlyConquered(String),
}

impl fmt::Display for CanalBlockage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanalBlockage::CombatMove(name) => write!(f, "Can only move through {} during non-combat move", name),
            CanalBlockage::NotControlled(name) => write!(f, "Must control {} to move through", name),
            CanalBlockage::RecentlyConquered(name) => {
                write!(f, "Must control {} for an entire turn to move through", name)
            }
        }
    }
}

/// Canals touching `t` that the route actually passes through.
fn canals_on_route<'a>(ctx: &RuleContext<'a>, t: TerritoryId, route: &Route) -> Vec<&'a Canal> {
    ctx.state
        .map
        .canals()
        .iter()
        .filter(|canal| canal.sea_zones.contains(&t))
        .filter(|canal| route.legs().any(|(a, b)| canal.connects(a, b)))
        .collect()
}

fn check_control(ctx: &RuleContext<'_>, canal: &Canal) -> Option<CanalBlockage> {
    if canal.no_combat_move && ctx.mode.is_combat() {
        return Some(CanalBlockage::CombatMove(canal.name.clone()));
    }
    for &flank in &canal.land_territories {
        let territory = ctx.territory(flank);
        if !ctx.relationship(territory.owner).can_move_through_canals {
            return Some(CanalBlockage::NotControlled(canal.name.clone()));
        }
        if territory.conquered {
            return Some(CanalBlockage::RecentlyConquered(canal.name.clone()));
        }
    }
    None
}

/// Checks one unit, or a unit of no particular type when `unit` is `None`.
fn check_unit(ctx: &RuleContext<'_>, canal: &Canal, unit: Option<UnitId>) -> Option<CanalBlockage> {
    if let Some(u) = unit {
        if canal.excluded_types.contains(&ctx.unit(u).type_id) {
            return None;
        }
    }
    check_control(ctx, canal)
}

/// Every unit that fails some canal on the route, with the last reason it
/// failed for.
///
/// Where a territory touches several canals, the rule decides whether
/// crossing one of them is enough or all must be crossable.
fn unit_failures(
    ctx: &RuleContext<'_>,
    route: &Route,
    units: &[Option<UnitId>],
) -> BTreeMap<Option<UnitId>, CanalBlockage> {
    let per_territory: Vec<Vec<&Canal>> = route
        .all_territories()
        .map(|t| canals_on_route(ctx, t, route))
        .collect();
    let mut failures = BTreeMap::new();
    if per_territory.iter().all(Vec::is_empty) {
        return failures;
    }
    let control_all = ctx.rules.control_all_canals_between_territories_to_pass;
    for &unit in units {
        for canals in &per_territory {
            let mut blockage = None;
            for canal in canals {
                blockage = check_unit(ctx, canal, unit);
                if control_all != blockage.is_none() {
                    break;
                }
            }
            if let Some(b) = blockage {
                failures.insert(unit, b);
            }
        }
    }
    failures
}

/// Whether the units can take the route's canals. With `units` absent no
/// exemption applies. A blockage is lifted when land transports can carry
/// every blocked or slow unit.
pub fn canal_blockage(
    ctx: &RuleContext<'_>,
    route: &Route,
    units: Option<&MoveCandidate>,
) -> Option<CanalBlockage> {
    let Some(candidate) = units else {
        return unit_failures(ctx, route, &[None]).into_values().last();
    };
    let movers = find_non_dependent_units(ctx, candidate);
    let as_options: Vec<Option<UnitId>> = movers.iter().copied().map(Some).collect();
    let failures = unit_failures(ctx, route, &as_options);
    let result = failures.values().last().cloned()?;
    let failed: BTreeSet<UnitId> = failures.keys().flatten().copied().collect();
    if salvaged_by_land_transports(ctx, route, &movers, &failed) {
        None
    } else {
        Some(result)
    }
}

fn salvaged_by_land_transports(
    ctx: &RuleContext<'_>,
    route: &Route,
    movers: &[UnitId],
    failed: &BTreeSet<UnitId>,
) -> bool {
    let (potential, to_carry): (Vec<UnitId>, Vec<UnitId>) = movers
        .iter()
        .copied()
        .partition(|u| !failed.contains(u) && ctx.has_enough_movement_for_route(*u, route));
    check_land_transports(ctx, &potential, &to_carry).is_empty()
}

/// Pipeline pass: rejects each unit that cannot take a canal, along with
/// the cargo it carries.
pub fn validate_canal(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let mut findings = Findings::new();
    if ctx.edit_mode() {
        return Ok(findings);
    }
    let route = &candidate.route;
    let movers = find_non_dependent_units(ctx, candidate);
    let as_options: Vec<Option<UnitId>> = movers.iter().copied().map(Some).collect();
    let failures = unit_failures(ctx, route, &as_options);
    if failures.is_empty() {
        return Ok(findings);
    }
    let failed: BTreeSet<UnitId> = failures.keys().flatten().copied().collect();
    if salvaged_by_land_transports(ctx, route, &movers, &failed) {
        return Ok(findings);
    }
    for &unit in &movers {
        let Some(blockage) = failures.get(&Some(unit)) else {
            continue;
        };
        findings.disallow(Reason::Canal(blockage.clone()), unit);
        let cargo = candidate.units.iter().copied().filter(|&c| {
            ctx.unit(c).transported_by == Some(unit)
                || candidate.air_dependents.get(&unit).is_some_and(|d| d.contains(&c))
        });
        findings.disallow_all(Reason::Canal(blockage.clone()), cargo);
    }
    Ok(findings)
}

/// Cheap check used while searching for routes: can this group take the
/// single leg `from` to `to`? One exempt unit exempts the group.
pub fn can_any_units_pass_canal(ctx: &RuleContext<'_>, from: TerritoryId, to: TerritoryId, units: &[UnitId]) -> bool {
    let control_all = ctx.rules.control_all_canals_between_territories_to_pass;
    let mut can_pass = true;
    for canal in ctx.state.map.canals().iter().filter(|c| c.connects(from, to)) {
        let exempt = units
            .iter()
            .any(|&u| canal.excluded_types.contains(&ctx.unit(u).type_id));
        can_pass = exempt || check_control(ctx, canal).is_none();
        if control_all != can_pass {
            break;
        }
    }
    can_pass
}
