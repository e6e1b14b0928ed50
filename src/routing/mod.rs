//! Route preference search.
//!
//! [`best_route`] picks the path a player most likely means when they name
//! only a start and an end: the cheapest passable route, narrowed to pure
//! land or pure water when that costs nothing extra, then steered away
//! from enemies and anti-air where a route of acceptable length exists.

pub mod preference;

use std::collections::BTreeSet;

use tracing::debug;

use crate::board::{Route, TerritoryId, UnitId, UnitTypeId};
use crate::rules::{Predicate, RuleContext};
use crate::validate::canal::can_any_units_pass_canal;
use crate::validate::cargo::dependent_units;
use crate::validate::MoveCandidate;

pub use preference::{preferences, Terrain};

/// Best route from `start` to `end` for `units`. With `force_land_or_sea`
/// the pure land (or water) route wins even when longer, as long as a land
/// (or sea) unit moves under its own power.
pub fn best_route(
    ctx: &RuleContext<'_>,
    start: TerritoryId,
    end: TerritoryId,
    units: &[UnitId],
    force_land_or_sea: bool,
) -> Option<Route> {
    let map = &ctx.state.map;
    let has_land = units.iter().any(|&u| ctx.is_land(u));
    let has_air = units.iter().any(|&u| ctx.is_air(u));
    let neutrals_impassable = ctx.rules.neutrals_impassable || (has_air && !ctx.rules.neutral_flyover_allowed);

    let passable = (|t: TerritoryId| ctx.is_passable_and_not_restricted(t))
        .and(|t: TerritoryId| ctx.territory_effects_allow(t, units))
        .and_if(has_air, |t: TerritoryId| ctx.allows_air_over_owned_land(t))
        .and_if(has_land, |t: TerritoryId| ctx.allows_land_over_owned_land(t))
        .and_if(neutrals_impassable, |t: TerritoryId| !ctx.is_neutral_land(t));
    let types: Vec<UnitTypeId> = units
        .iter()
        .map(|&u| ctx.unit(u).type_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let canals = |a: TerritoryId, b: TerritoryId| can_any_units_pass_canal(ctx, a, b, units);
    let route_for = |cond: &dyn Fn(TerritoryId) -> bool| map.route_for_units(start, end, &cond, &types, canals);

    let Some(mut default_route) = route_for(&|t: TerritoryId| passable.test(t)) else {
        // Nothing legal now; impassable is permanent but politics may change.
        let not_impassable =
            (|t: TerritoryId| !ctx.is_impassable(t)).and_if(neutrals_impassable, |t: TerritoryId| !ctx.is_neutral_land(t));
        debug!("no passable route, falling back");
        return map
            .route(start, end, &not_impassable)
            .or_else(|| map.route(start, end, &|_: TerritoryId| true));
    };

    let standing = MoveCandidate::new(units.to_vec(), Route::stationary(start));
    let dependents = dependent_units(ctx, &standing);
    let free: Vec<UnitId> = units.iter().copied().filter(|u| !dependents.contains(u)).collect();

    let mut terrain = Terrain::Any;
    let start_water = ctx.is_water(start);
    let end_water = ctx.is_water(end);
    if start_water == end_water {
        let pure = if start_water { Terrain::Water } else { Terrain::Land };
        let forced = force_land_or_sea
            && free
                .iter()
                .any(|&u| if start_water { ctx.is_sea(u) } else { ctx.is_land(u) });
        if let Some(route) = route_for(&|t: TerritoryId| pure.admits(ctx, t) && passable.test(t)) {
            if route.number_of_steps() <= default_route.number_of_steps() || forced {
                default_route = route;
                terrain = pure;
            }
        }
    }

    let max_land_moves = free
        .iter()
        .filter(|&&u| ctx.is_land(u))
        .map(|&u| usize::try_from(ctx.unit(u).movement_left.floor_int()).unwrap_or(0))
        .max()
        .unwrap_or(0);
    let max_steps = if ctx.mode.is_combat() {
        default_route.number_of_steps()
    } else {
        default_route.number_of_steps().max(max_land_moves)
    };

    for (tier, preference) in preferences(ctx, &free).iter().enumerate() {
        let cond = |t: TerritoryId| preference.test(t) && terrain.admits(ctx, t) && passable.test(t);
        if let Some(route) = route_for(&cond) {
            if route.number_of_steps() <= max_steps {
                debug!(tier, steps = route.number_of_steps(), "preferred route");
                return Some(route);
            }
        }
    }
    Some(default_route)
}
