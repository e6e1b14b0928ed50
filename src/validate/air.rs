//! Air landing resolver.
//!
//! Decides which air units can still land after a move. Units that reach
//! friendly land within their remaining movement are fine. The rest must
//! find carrier space: first on carriers at the destination, then at nearby
//! sea zones, possibly by summoning carriers from further away. The search
//! never moves anything; it only shows that a rendezvous exists.
//!
//! The carrier search is written as a reducer. [`SearchState`] carries the
//! sets that shrink as the search goes, and each step takes the state by
//! value and hands back the updated one.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::board::{Movement, Route, TerritoryId, UnitId, PUS};
use crate::error::{EngineError, Result};
use crate::rules::RuleContext;

use super::canal::can_any_units_pass_canal;
use super::candidate::MoveCandidate;
use super::cargo::{carrier_must_move_with, Dependents};
use super::verdict::{Findings, PassResult, Reason};

/// How far the resolver had to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandingPhase {
    /// Nothing to check: edit mode, no air, no steps, friendly land at the
    /// end, or kamikaze rules.
    Skipped,
    /// Every air unit found land, or could never use a carrier.
    NoCarriersNeeded,
    /// Carriers at the destination absorbed every stranded unit.
    CarriersAtEnd,
    /// The full landing-spot and carrier-origin search ran.
    CarrierSearch,
}

/// Outcome of one resolver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingReport {
    pub phase: LandingPhase,
    /// Air units that cannot land anywhere, in the order they were given up on.
    pub unlanded: Vec<UnitId>,
    /// Carriers the resolver loaded, with the air put aboard each.
    pub assignments: Dependents,
    /// Sea zones whose allied air outweighs every friendly deck there.
    pub overdrawn: Vec<TerritoryId>,
}

impl LandingReport {
    fn new(phase: LandingPhase) -> Self {
        LandingReport {
            phase,
            unlanded: Vec::new(),
            assignments: Dependents::new(),
            overdrawn: Vec::new(),
        }
    }
}

/// Pipeline pass. Moving air that cannot land is disallowed; air already at
/// the destination that this move would leave without a landing is
/// reported as stranded. Broken resolver bookkeeping is an error, not a
/// finding.
pub fn validate_air_can_land(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> Result<PassResult> {
    let report = resolve_landing(ctx, &candidate.units, &candidate.route);
    audit_landing(ctx, &report)?;
    let mut findings = Findings::new();
    for unit in report.unlanded {
        if candidate.contains(unit) {
            findings.disallow(Reason::NotAllAirCanLand, unit);
        } else {
            findings.strand(unit);
        }
    }
    Ok(Ok(findings))
}

/// Checks a resolver run against the snapshot: no carrier loaded past its
/// deck, no plane aboard two carriers, no sea zone left with allied air
/// that no carrier there can hold.
pub fn audit_landing(ctx: &RuleContext<'_>, report: &LandingReport) -> Result<()> {
    if let Some(&t) = report.overdrawn.first() {
        return Err(EngineError::Accounting(format!(
            "allied air in {} exceeds the carrier capacity there",
            ctx.territory(t).name
        )));
    }
    let mut seen: BTreeSet<UnitId> = BTreeSet::new();
    for (&carrier, air) in &report.assignments {
        let deck = u64::from(ctx.ty(carrier).carrier_capacity.unwrap_or(0));
        let load: u64 = air.iter().map(|&a| u64::from(ctx.carrier_cost(a))).sum();
        if load > deck {
            return Err(EngineError::Accounting(format!(
                "carrier {} loaded with {} of {} capacity",
                carrier.0, load, deck
            )));
        }
        if let Some(&twice) = air.iter().find(|&&a| !seen.insert(a)) {
            return Err(EngineError::Accounting(format!("unit {} assigned to two carriers", twice.0)));
        }
    }
    Ok(())
}

/// Allied air in sea zone `t` costs more than the decks of every friendly
/// carrier there.
fn allied_air_overflows(ctx: &RuleContext<'_>, t: TerritoryId) -> bool {
    if !ctx.is_water(t) {
        return false;
    }
    let deck: i64 = ctx
        .state
        .units_in(t)
        .filter(|&u| ctx.is_allied_unit(u) && ctx.is_carrier(u))
        .map(|c| i64::from(ctx.ty(c).carrier_capacity.unwrap_or(0)))
        .sum();
    let allied: Vec<UnitId> = ctx
        .state
        .units_in(t)
        .filter(|&u| ctx.is_allied_not_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u))
        .collect();
    total_cost(ctx, &allied) > deck
}

/// Runs the resolver for `units` moving along `route`.
pub fn resolve_landing(ctx: &RuleContext<'_>, units: &[UnitId], route: &Route) -> LandingReport {
    let end = route.end();
    if ctx.edit_mode()
        || !units.iter().any(|&u| ctx.is_air(u))
        || route.has_no_steps()
        || ctx.air_can_land_on_allied_non_conquered_land(end)
        || ctx.rules.kamikaze_airplanes
    {
        return LandingReport::new(LandingPhase::Skipped);
    }

    let mut report = LandingReport::new(LandingPhase::NoCarriersNeeded);
    let mut owned_must_land = Vec::new();
    for air in air_units_to_validate(ctx, units, route) {
        if can_find_land(ctx, air, end, movement_after_route(ctx, air, route)) {
            continue;
        }
        if ctx.can_land_on_carrier(air) {
            owned_must_land.push(air);
        } else {
            report.unlanded.push(air);
        }
    }
    if owned_must_land.is_empty() {
        debug!(unlanded = report.unlanded.len(), "air found land");
        return report;
    }

    // Allied air cannot move away, so it is counted before our own.
    let mut must_land: Vec<UnitId> = Vec::new();
    let allied_air = |u: UnitId| ctx.is_allied_not_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u);
    for u in ctx.state.units_in(end).chain(units.iter().copied()).filter(|&u| allied_air(u)) {
        push_unique(&mut must_land, u);
    }
    let moving_carriers: Vec<UnitId> = units.iter().copied().filter(|&u| ctx.is_carrier(u)).collect();
    if !moving_carriers.is_empty() {
        let start_units: Vec<UnitId> = ctx.state.units_in(route.start()).collect();
        for u in carrier_must_move_with(ctx, units, &start_units).into_values().flatten() {
            push_unique(&mut must_land, u);
        }
    }
    for u in owned_must_land {
        push_unique(&mut must_land, u);
    }
    must_land.sort_by_key(|&u| movement_after_route(ctx, u, route));

    let mut carriers_at_end: Vec<UnitId> = ctx
        .state
        .units_in(end)
        .filter(|&u| ctx.is_allied_unit(u) && ctx.is_carrier(u))
        .collect();
    for c in moving_carriers {
        push_unique(&mut carriers_at_end, c);
    }
    let at_end = what_air_can_land_on_these_carriers(ctx, &carriers_at_end, &must_land, end);
    let landed: BTreeSet<UnitId> = at_end.values().flatten().copied().collect();
    let ignore: BTreeSet<UnitId> = must_land.iter().copied().collect();
    must_land.retain(|u| !landed.contains(u));
    report.assignments = at_end;
    if must_land.is_empty() {
        report.phase = LandingPhase::CarriersAtEnd;
        debug!("carriers at destination hold all air");
        return report;
    }

    report.phase = LandingPhase::CarrierSearch;
    let search = CarrierSearch::new(ctx, route);
    let (landing_spots, origins) = search.candidate_territories(&must_land);
    debug!(
        stranded = must_land.len(),
        spots = landing_spots.len(),
        origins = origins.len(),
        "starting carrier search"
    );
    let moved_carriers: Dependents = carriers_at_end_keys(&report.assignments, &carriers_at_end);
    let state = SearchState {
        capacity: search.static_capacity(&landing_spots, &moved_carriers),
        stranded: must_land,
        origins,
        moved_carriers,
        ignore,
        overdrawn: BTreeSet::new(),
    };
    let state = search.run(state, &landing_spots);
    for (carrier, air) in state.moved_carriers {
        if report.assignments.contains_key(&carrier) || air.is_empty() {
            continue;
        }
        report.assignments.insert(carrier, air);
    }
    report.unlanded.extend(state.stranded);
    report.overdrawn.extend(state.overdrawn);
    report
}

fn push_unique(list: &mut Vec<UnitId>, u: UnitId) {
    if !list.contains(&u) {
        list.push(u);
    }
}

/// Every carrier at the end counts as already moved, loaded or not.
fn carriers_at_end_keys(assignments: &Dependents, carriers: &[UnitId]) -> Dependents {
    carriers
        .iter()
        .map(|c| (*c, assignments.get(c).cloned().unwrap_or_default()))
        .collect()
}

/// Owned non-kamikaze air at the destination or in the move, lowest
/// remaining movement first. Suicide attackers are dropped when they fly
/// into a combat.
fn air_units_to_validate(ctx: &RuleContext<'_>, units: &[UnitId], route: &Route) -> Vec<UnitId> {
    let end = route.end();
    let owned_air = |u: UnitId| ctx.is_air(u) && ctx.is_owned(u) && !ctx.is_kamikaze(u);
    let mut air: Vec<UnitId> = Vec::new();
    for u in ctx.state.units_in(end).chain(units.iter().copied()).filter(|&u| owned_air(u)) {
        push_unique(&mut air, u);
    }
    if ctx.mode.is_combat() && ctx.has_enemy_units(end) {
        air.retain(|&u| !ctx.is_suicide_on_attack(u));
    }
    air.sort_by_key(|&u| movement_after_route(ctx, u, route));
    air
}

/// Movement a unit has once the move is over. Units already at the end are
/// not moving.
fn movement_after_route(ctx: &RuleContext<'_>, u: UnitId, route: &Route) -> Movement {
    let unit = ctx.unit(u);
    if ctx.territory(route.end()).units.contains(&u) {
        unit.movement_left
    } else {
        unit.movement_left - route.movement_cost(&ctx.state.map, unit.type_id)
    }
}

fn can_air_reach_spot(
    ctx: &RuleContext<'_>,
    air: UnitId,
    from: TerritoryId,
    movement_left: Movement,
    spot: TerritoryId,
) -> bool {
    let neutrals_passable = ctx.rules.neutrals_passable_by_air();
    let fly_over = |t: TerritoryId| ctx.air_can_fly_over(t, neutrals_passable);
    let type_id = ctx.unit(air).type_id;
    let Some(route) = ctx.state.map.route_for_units(from, spot, &fly_over, &[type_id], |_, _| true) else {
        return false;
    };
    if route.movement_cost(&ctx.state.map, type_id) > movement_left {
        return false;
    }
    !neutrals_passable
        || ctx.rules.neutral_charge_for(route.empty_neutrals(&ctx.state.map).len()) <= ctx.mover().resources.get(PUS)
}

/// Whether `air` can reach allied land it may land on from `current`.
pub fn can_find_land(ctx: &RuleContext<'_>, air: UnitId, current: TerritoryId, movement_left: Movement) -> bool {
    if movement_left.is_negative() {
        return false;
    }
    let neutrals_passable = ctx.rules.neutrals_passable_by_air();
    let fly_over = |t: TerritoryId| ctx.air_can_fly_over(t, neutrals_passable);
    ctx.state
        .map
        .neighbors_by_movement_cost(current, movement_left, &fly_over)
        .into_iter()
        .filter(|&t| ctx.air_can_land_on_allied_non_conquered_land(t))
        .any(|spot| can_air_reach_spot(ctx, air, current, movement_left, spot))
}

/// Landing capacity of one carrier. A damaged carrier that refuses new air
/// keeps room only for allied air already aboard, if it may not release them.
pub fn carrier_capacity(ctx: &RuleContext<'_>, carrier: UnitId, t: TerritoryId) -> u32 {
    let ty = ctx.ty(carrier);
    let Some(capacity) = ty.carrier_capacity else {
        return 0;
    };
    let damaged = ctx.unit(carrier).hits > 0;
    if !(damaged && ty.damaged_effects.units_may_not_land_on_carrier) {
        return capacity;
    }
    if !ty.damaged_effects.units_may_not_leave_allied_carrier {
        return 0;
    }
    ctx.state
        .units_in(t)
        .filter(|&u| ctx.is_air(u) && ctx.can_land_on_carrier(u))
        .filter(|&u| ctx.unit(u).transported_by == Some(carrier))
        .map(|u| ctx.carrier_cost(u))
        .sum()
}

fn total_capacity(ctx: &RuleContext<'_>, carriers: &[UnitId], t: TerritoryId) -> i64 {
    carriers.iter().map(|&c| i64::from(carrier_capacity(ctx, c, t))).sum()
}

fn total_cost(ctx: &RuleContext<'_>, air: &[UnitId]) -> i64 {
    air.iter().map(|&u| i64::from(ctx.carrier_cost(u))).sum()
}

/// Greedy packing of `air` onto `carriers`, carriers in order, each trying
/// every plane not yet placed. Allied cargo should come first in `air`.
pub fn what_air_can_land_on_these_carriers(
    ctx: &RuleContext<'_>,
    carriers: &[UnitId],
    air: &[UnitId],
    t: TerritoryId,
) -> Dependents {
    let mut placed: BTreeSet<UnitId> = BTreeSet::new();
    let mut assignments = Dependents::new();
    for &carrier in carriers {
        let mut room = carrier_capacity(ctx, carrier, t);
        for &plane in air {
            if placed.contains(&plane) {
                continue;
            }
            let cost = ctx.carrier_cost(plane);
            if room >= cost {
                room -= cost;
                placed.insert(plane);
                assignments.entry(carrier).or_default().push(plane);
            }
        }
    }
    assignments
}

/// What the carrier search has left to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// Air still needing a carrier, in priority order.
    pub stranded: Vec<UnitId>,
    /// Territories carriers may still be summoned from, nearest first.
    pub origins: Vec<TerritoryId>,
    /// Spare carrier capacity recorded per territory.
    pub capacity: BTreeMap<TerritoryId, i64>,
    /// Carriers committed so far, with the air riding on each.
    pub moved_carriers: Dependents,
    /// Units accounted for elsewhere and skipped when counting a territory.
    pub ignore: BTreeSet<UnitId>,
    /// Territories where allied air came out to more than the decks there.
    pub overdrawn: BTreeSet<TerritoryId>,
}

impl SearchState {
    fn is_done(&self) -> bool {
        self.stranded.is_empty()
    }

    /// Units in `t` that no earlier step has claimed.
    fn unclaimed_units(&self, ctx: &RuleContext<'_>, t: TerritoryId) -> Vec<UnitId> {
        let riding: BTreeSet<UnitId> = self.moved_carriers.values().flatten().copied().collect();
        ctx.state
            .units_in(t)
            .filter(|u| !self.moved_carriers.contains_key(u) && !self.ignore.contains(u) && !riding.contains(u))
            .collect()
    }

    /// Lands what fits from `reach` into `capacity`, in order.
    fn land(mut self, ctx: &RuleContext<'_>, spot: &mut SpotProgress) -> Self {
        let mut remaining = Vec::with_capacity(spot.reach.len());
        for air in std::mem::take(&mut spot.reach) {
            let cost = i64::from(ctx.carrier_cost(air));
            if spot.capacity >= cost {
                spot.capacity -= cost;
                self.stranded.retain(|&u| u != air);
            } else {
                remaining.push(air);
            }
        }
        spot.reach = remaining;
        self
    }
}

/// Running totals while one landing spot is being filled.
#[derive(Debug)]
struct SpotProgress {
    spot: TerritoryId,
    capacity: i64,
    reach: Vec<UnitId>,
}

struct CarrierSearch<'c, 'a> {
    ctx: &'c RuleContext<'a>,
    route: &'c Route,
}

impl<'c, 'a> CarrierSearch<'c, 'a> {
    fn new(ctx: &'c RuleContext<'a>, route: &'c Route) -> Self {
        CarrierSearch { ctx, route }
    }

    /// Movement an air unit has to reach a landing spot. Allied air cannot move.
    fn movement_for(&self, air: UnitId) -> Movement {
        if self.ctx.is_owned(air) {
            movement_after_route(self.ctx, air, self.route)
        } else {
            Movement::ZERO
        }
    }

    /// Sea zones air could land at, nearest to the destination first, and
    /// the sea zones holding our carriers that could come to them.
    fn candidate_territories(&self, stranded: &[UnitId]) -> (Vec<TerritoryId>, Vec<TerritoryId>) {
        let ctx = self.ctx;
        let map = &ctx.state.map;
        let end = self.route.end();
        let air_left = stranded
            .iter()
            .filter(|&&u| ctx.is_owned(u))
            .map(|&u| movement_after_route(ctx, u, self.route))
            .fold(Movement::ZERO, Movement::max);
        let carrier_left = ctx
            .state
            .units()
            .iter()
            .filter(|u| ctx.is_carrier(u.id) && ctx.is_owned(u.id))
            .map(|u| u.movement_left)
            .fold(Movement::ZERO, Movement::max);
        let air_range = u32::try_from(air_left.floor_int()).unwrap_or(0);
        let carrier_range = u32::try_from(carrier_left.floor_int()).unwrap_or(0);

        let neutrals_passable = ctx.rules.neutrals_passable_by_air();
        let fly_over = |t: TerritoryId| ctx.air_can_fly_over(t, neutrals_passable);
        let sea = |t: TerritoryId| ctx.sea_can_move_over(t);
        let mut spots = vec![end];
        spots.extend(map.neighbors_within(end, air_range, &fly_over));
        spots.retain(|&t| sea(t));
        map.sort_by_distance(end, &mut spots, &sea);

        let spot_set: BTreeSet<TerritoryId> = spots.iter().copied().collect();
        let mut origins = spots.clone();
        origins.extend(map.neighbors_of_set(&spot_set, carrier_range, &sea));
        origins.retain(|&t| t != end && ctx.has_owned_carrier(t));
        (spots, origins)
    }

    /// Capacity at each landing spot from allied carriers, plus any carriers
    /// in the production queue, placed once at the first spot beside one of
    /// our factories.
    fn static_capacity(&self, spots: &[TerritoryId], moved: &Dependents) -> BTreeMap<TerritoryId, i64> {
        let ctx = self.ctx;
        let mut queued: Vec<u32> = if ctx.rules.land_air_on_new_carriers() {
            ctx.mover()
                .production_queue
                .iter()
                .filter_map(|&ty| ctx.state.unit_type(ty).carrier_capacity)
                .collect()
        } else {
            Vec::new()
        };
        let mut capacity = BTreeMap::new();
        for &t in spots {
            let mut space = 0i64;
            if !queued.is_empty() && ctx.is_water(t) && ctx.has_owned_factory_neighbor(t) {
                space += queued.drain(..).map(i64::from).sum::<i64>();
            }
            let allied: Vec<UnitId> = ctx
                .state
                .units_in(t)
                .filter(|&u| ctx.is_allied_not_owned(u) && ctx.is_carrier(u) && !moved.contains_key(&u))
                .collect();
            space += total_capacity(ctx, &allied, t);
            capacity.insert(t, space);
        }
        capacity
    }

    fn run(&self, mut state: SearchState, spots: &[TerritoryId]) -> SearchState {
        for &spot in spots {
            state = self.visit_spot(state, spot);
            if state.is_done() {
                break;
            }
        }
        state
    }

    /// Lands what it can at `spot`, then summons carriers to it.
    fn visit_spot(&self, mut state: SearchState, spot: TerritoryId) -> SearchState {
        let ctx = self.ctx;
        state.origins.retain(|&t| t != spot);
        let end = self.route.end();
        let reach: Vec<UnitId> = state
            .stranded
            .iter()
            .copied()
            .filter(|&air| can_air_reach_spot(ctx, air, end, self.movement_for(air), spot))
            .collect();
        if reach.is_empty() {
            return state;
        }

        let here = state.unclaimed_units(ctx, spot);
        let owned_carriers: Vec<UnitId> = here
            .iter()
            .copied()
            .filter(|&u| ctx.is_owned(u) && ctx.is_carrier(u))
            .collect();
        let mut resident_air: Vec<UnitId> = here
            .iter()
            .copied()
            .filter(|&u| ctx.is_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u))
            .filter(|&u| !can_find_land(ctx, u, spot, ctx.unit(u).movement_left))
            .collect();
        resident_air.extend(
            here.iter()
                .copied()
                .filter(|&u| ctx.is_allied_not_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u)),
        );
        let mut progress = SpotProgress {
            spot,
            capacity: state.capacity.get(&spot).copied().unwrap_or(0) + total_capacity(ctx, &owned_carriers, spot)
                - total_cost(ctx, &resident_air),
            reach,
        };
        if progress.capacity < 0 && allied_air_overflows(ctx, spot) {
            warn!(spot = spot.0, capacity = progress.capacity, "allied air overflows carriers");
            state.overdrawn.insert(spot);
        }
        trace!(spot = spot.0, capacity = progress.capacity, reach = progress.reach.len(), "landing spot");
        state = state.land(ctx, &mut progress);
        if state.is_done() {
            return state;
        }

        let mut index = 0;
        while index < state.origins.len() {
            let origin = state.origins[index];
            let (next, keep) = self.summon_from(state, origin, &mut progress);
            state = next;
            if state.is_done() {
                return state;
            }
            if keep {
                index += 1;
            } else {
                state.origins.remove(index);
            }
        }
        state
    }

    /// Brings our carriers from `origin` to the current landing spot.
    /// Returns the new state and whether `origin` is worth visiting again.
    fn summon_from(
        &self,
        mut state: SearchState,
        origin: TerritoryId,
        progress: &mut SpotProgress,
    ) -> (SearchState, bool) {
        let ctx = self.ctx;
        let there = state.unclaimed_units(ctx, origin);
        let carriers: Vec<UnitId> = there
            .iter()
            .copied()
            .filter(|&u| ctx.is_owned(u) && ctx.is_carrier(u))
            .collect();
        if carriers.is_empty() {
            return (state, false);
        }
        let mut owned_air: Vec<UnitId> = there
            .iter()
            .copied()
            .filter(|&u| ctx.is_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u))
            .filter(|&u| !can_find_land(ctx, u, origin, ctx.unit(u).movement_left))
            .collect();
        let mut allied_air: Vec<UnitId> = there
            .iter()
            .copied()
            .filter(|&u| ctx.is_allied_not_owned(u) && ctx.is_air(u) && ctx.can_land_on_carrier(u))
            .collect();
        let origin_units: Vec<UnitId> = ctx.state.units_in(origin).collect();
        let mut forced = carrier_must_move_with(ctx, &carriers, &origin_units);

        let mut spare = match state.capacity.get(&origin) {
            Some(&c) => c,
            None => {
                let allied_carriers: Vec<UnitId> = origin_units
                    .iter()
                    .copied()
                    .filter(|&u| ctx.is_allied_not_owned(u) && ctx.is_carrier(u))
                    .collect();
                let c = total_capacity(ctx, &allied_carriers, origin);
                state.capacity.insert(origin, c);
                c
            }
        };
        if !allied_air.is_empty() || !forced.is_empty() {
            if forced.is_empty() {
                spare -= total_cost(ctx, &allied_air);
                state.ignore.extend(allied_air.iter().copied());
                if spare > 0 {
                    let mut unplaced = Vec::new();
                    for air in owned_air {
                        let cost = i64::from(ctx.carrier_cost(air));
                        if spare >= cost {
                            spare -= cost;
                            state.ignore.insert(air);
                        } else {
                            unplaced.push(air);
                        }
                    }
                    owned_air = unplaced;
                }
            } else {
                let riding: BTreeSet<UnitId> = state.moved_carriers.values().flatten().copied().collect();
                for cargo in forced.values_mut() {
                    cargo.retain(|u| !riding.contains(u));
                }
                let aboard: BTreeSet<UnitId> = forced.values().flatten().copied().collect();
                allied_air.retain(|u| !aboard.contains(u));
                spare -= total_cost(ctx, &allied_air);
                state.ignore.extend(allied_air.iter().copied());
            }
            if spare < 0 && allied_air_overflows(ctx, origin) {
                warn!(origin = origin.0, spare, "allied air overflows carriers");
                state.overdrawn.insert(origin);
            }
            state.capacity.insert(origin, spare);
        }

        let sea = |t: TerritoryId| ctx.sea_can_move_over(t);
        let carrier_types: Vec<_> = carriers.iter().map(|&c| ctx.unit(c).type_id).collect();
        let Some(to_spot) = ctx.state.map.route_for_units(origin, progress.spot, &sea, &carrier_types, |a, b| {
            can_any_units_pass_canal(ctx, a, b, &carriers)
        }) else {
            return (state, true);
        };
        let (reaching, not_reaching): (Vec<UnitId>, Vec<UnitId>) = carriers
            .iter()
            .copied()
            .partition(|&c| ctx.has_enough_movement_for_route(c, &to_spot));
        if reaching.is_empty() {
            return (state, true);
        }

        // Planes go aboard carriers staying behind first.
        let mut cargo_for: Dependents = Dependents::new();
        let mut full: BTreeSet<UnitId> = BTreeSet::new();
        for &carrier in not_reaching.iter().chain(reaching.iter()) {
            let mut cargo = forced.remove(&carrier).unwrap_or_default();
            let mut room = i64::from(carrier_capacity(ctx, carrier, origin)) - total_cost(ctx, &cargo);
            let mut unplaced = Vec::new();
            for air in owned_air {
                let cost = i64::from(ctx.carrier_cost(air));
                if room >= cost {
                    room -= cost;
                    cargo.push(air);
                } else {
                    unplaced.push(air);
                }
            }
            owned_air = unplaced;
            if room <= 0 {
                full.insert(carrier);
            }
            cargo_for.insert(carrier, cargo);
        }
        if carriers.iter().all(|c| full.contains(c)) {
            trace!(origin = origin.0, "origin carriers full");
            return (state, false);
        }
        let keep = !not_reaching.iter().all(|c| full.contains(c));

        for &carrier in &reaching {
            let cargo = cargo_for.remove(&carrier).unwrap_or_default();
            progress.capacity += i64::from(carrier_capacity(ctx, carrier, origin)) - total_cost(ctx, &cargo);
            state.moved_carriers.insert(carrier, cargo);
        }
        trace!(
            origin = origin.0,
            spot = progress.spot.0,
            carriers = reaching.len(),
            capacity = progress.capacity,
            "summoned carriers"
        );
        let state = state.land(ctx, progress);
        (state, keep)
    }
}
