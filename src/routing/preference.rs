//! Route preference tiers, most wanted first.

use crate::board::{TerritoryId, UnitId};
use crate::rules::{BoxPredicate, Predicate, RuleContext};

/// Which terrain a route is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Any,
    Land,
    Water,
}

impl Terrain {
    pub fn admits(self, ctx: &RuleContext<'_>, t: TerritoryId) -> bool {
        match self {
            Terrain::Any => true,
            Terrain::Land => !ctx.is_water(t),
            Terrain::Water => ctx.is_water(t),
        }
    }
}

/// The six tiers, tried in order:
///
/// 1. required units present, not enemy held, no enemy units
/// 2. required units present, no enemy units
/// 3. required units present, no anti-air
/// 4. not enemy held, no enemy units
/// 5. no enemy units
/// 6. no anti-air
///
/// `free` are the units moving under their own power; only they need
/// their required companions along the way.
pub fn preferences<'a>(ctx: &'a RuleContext<'a>, free: &'a [UnitId]) -> Vec<BoxPredicate<'a, TerritoryId>> {
    let required = move |t: TerritoryId| ctx.all_have_required_units_to_move(free, t);
    let not_enemy_held = move |t: TerritoryId| !ctx.is_territory_enemy(t) && !ctx.was_fought_over(t);
    let no_enemy_units = move |t: TerritoryId| !ctx.has_enemy_units(t);
    let no_aa = move |t: TerritoryId| !ctx.has_enemy_aa_for_flyover(t);
    vec![
        required.and(not_enemy_held).and(no_enemy_units).boxed(),
        required.and(no_enemy_units).boxed(),
        required.and(no_aa).boxed(),
        not_enemy_held.and(no_enemy_units).boxed(),
        no_enemy_units.boxed(),
        no_aa.boxed(),
    ]
}
