//! Stacking limits: how many more units of a type a territory can take.

use crate::board::{LimitKind, PlayerId, StackingScope, TerritoryId, UnitId, UnitTypeId};
use crate::rules::RuleContext;

/// Units from `units` that fit in `territory` under `kind` limits, in
/// input order.
///
/// Units are accepted first come first served: each accepted unit counts
/// against the budget of every later one. `committed` units count as
/// already present and are never part of the result.
pub fn filter_units(
    ctx: &RuleContext<'_>,
    units: &[UnitId],
    kind: LimitKind,
    territory: TerritoryId,
    committed: &[UnitId],
) -> Vec<UnitId> {
    let mut allowed: Vec<UnitId> = committed.to_vec();
    for &unit in units {
        if remaining_room(ctx, unit, kind, territory, &allowed).map_or(true, |room| room > 0) {
            allowed.push(unit);
        }
    }
    allowed.split_off(committed.len())
}

/// How many more units like `unit` fit, or `None` when no limit applies.
fn remaining_room(
    ctx: &RuleContext<'_>,
    unit: UnitId,
    kind: LimitKind,
    territory: TerritoryId,
    allowed: &[UnitId],
) -> Option<i64> {
    let type_id = ctx.unit(unit).type_id;
    let owner = ctx.unit(unit).owner;
    let mut room: Option<i64> = None;
    let mut tighten = |max: u32, scope: StackingScope, types: &[UnitTypeId]| {
        let present = count_matching(ctx, territory, allowed, owner, scope, types);
        let left = i64::from(max) - present as i64;
        room = Some(room.map_or(left, |r: i64| r.min(left)));
    };

    for rule in ctx.state.player(owner).limits(kind) {
        if rule.types.contains(&type_id) {
            tighten(rule.max, rule.scope, &rule.types);
        }
    }
    if let Some(limit) = ctx.state.unit_type(type_id).stacking.get(kind) {
        tighten(limit.max, limit.scope, &[type_id]);
    }
    room
}

fn count_matching(
    ctx: &RuleContext<'_>,
    territory: TerritoryId,
    allowed: &[UnitId],
    owner: PlayerId,
    scope: StackingScope,
    types: &[UnitTypeId],
) -> usize {
    ctx.state
        .units_in(territory)
        .chain(allowed.iter().copied())
        .filter(|&u| {
            let other = ctx.unit(u);
            types.contains(&other.type_id)
                && match scope {
                    StackingScope::Owned => other.owner == owner,
                    StackingScope::Allied => ctx.is_allied_player(owner, other.owner),
                    StackingScope::Total => true,
                }
        })
        .count()
}
