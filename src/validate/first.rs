//! Checks every move must pass before any phase rule is looked at: the
//! units exist where the route starts, the route is real, and the mover is
//! allowed to command the units and cross the land on the way.

use std::collections::BTreeSet;

use crate::board::{RestrictionKind, UnitId};
use crate::rules::RuleContext;

use super::candidate::MoveCandidate;
use super::cargo::dependent_units;
use super::verdict::{Findings, MoveError, PassResult, Reason};

pub fn validate_first(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let findings = validate_units(ctx, candidate)?;
    validate_route(ctx, candidate)?;
    if !ctx.edit_mode() {
        validate_ownership(ctx, candidate)?;
    }
    Ok(findings)
}

fn validate_units(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    let units = &candidate.units;
    if units.is_empty() {
        return Err(MoveError::NoUnits);
    }
    let start = ctx.territory(candidate.route.start());
    if !units.iter().all(|u| start.units.contains(u)) {
        return Err(MoveError::UnitsNotInStart);
    }
    let unique: BTreeSet<UnitId> = units.iter().copied().collect();
    if unique.len() != units.len() {
        return Err(MoveError::DuplicateUnits);
    }
    let mut findings = Findings::new();
    for &unit in units {
        if ctx.is_submerged(unit) {
            findings.disallow(Reason::Submerged, unit);
        } else if ctx.is_disabled(unit) {
            findings.disallow(Reason::Disabled, unit);
        }
    }
    Ok(findings)
}

fn validate_route(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> Result<(), MoveError> {
    let route = &candidate.route;
    let map = &ctx.state.map;
    if !map.is_valid_route(route) {
        return Err(MoveError::InvalidRoute(route.display(map).to_string()));
    }
    validate_movement_restriction(ctx, candidate)?;

    let has_land = candidate.units.iter().any(|&u| ctx.is_land(u));
    let has_air = candidate.units.iter().any(|&u| ctx.is_air(u));
    for t in route.all_territories().filter(|&t| !ctx.is_water(t)) {
        let owner = ctx.territory(t).owner;
        let rel = ctx.relationship(owner);
        if has_land && !rel.can_move_land_units_over_owned_land {
            return Err(MoveError::LandPassageDenied {
                player: ctx.mover().name.clone(),
                owner: ctx.player_name(owner).to_string(),
            });
        }
        if has_air && !rel.can_move_air_units_over_owned_land {
            return Err(MoveError::AirPassageDenied {
                player: ctx.mover().name.clone(),
                owner: ctx.player_name(owner).to_string(),
            });
        }
    }
    Ok(())
}

fn validate_movement_restriction(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> Result<(), MoveError> {
    if ctx.edit_mode() || !ctx.rules.movement_by_territory_restricted {
        return Ok(());
    }
    let Some(restriction) = &ctx.mover().movement_restriction else {
        return Ok(());
    };
    for t in candidate.route.all_territories() {
        let listed = restriction.territories.contains(&t);
        match restriction.kind {
            RestrictionKind::Allowed if !listed => return Err(MoveError::OutsideRestricted),
            RestrictionKind::Disallowed if listed => return Err(MoveError::IntoRestricted),
            _ => {}
        }
    }
    Ok(())
}

/// Only units moving on their own need to belong to the mover; cargo and
/// forced carrier passengers may be an ally's.
fn validate_ownership(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> Result<(), MoveError> {
    let dependents = dependent_units(ctx, candidate);
    let independent: Vec<UnitId> = candidate
        .units
        .iter()
        .copied()
        .filter(|u| !dependents.contains(u))
        .collect();
    if independent.is_empty() || !independent.iter().all(|&u| ctx.is_owned(u)) {
        return Err(MoveError::NotOwner {
            player: ctx.mover().name.clone(),
            units: units_text(ctx, &candidate.units),
        });
    }
    Ok(())
}

/// "2 infantry, 1 armour": counts per type in first-seen order.
pub fn units_text(ctx: &RuleContext<'_>, units: &[UnitId]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &unit in units {
        let name = ctx.ty(unit).name.as_str();
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    counts
        .iter()
        .map(|(name, count)| format!("{} {}", count, name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, GameState, MovementRestriction, PlayerId, RelationshipKind, Route, TerritoryId, UnitType, UnitTypeId};
    use crate::rules::{Ruleset, ValidationMode};

    struct Board {
        state: GameState,
        me: PlayerId,
        other: PlayerId,
        infantry: UnitTypeId,
        home: TerritoryId,
        next: TerritoryId,
    }

    fn board() -> Board {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let other = state.add_player("Swiss");
        let infantry = state.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        let home = state.add_territory("Germany", false);
        let next = state.add_territory("Poland", false);
        state.connect(home, next);
        state.set_owner(home, Some(me));
        state.set_owner(next, Some(me));
        Board {
            state,
            me,
            other,
            infantry,
            home,
            next,
        }
    }

    fn check(b: &Board, rules: &Ruleset, units: Vec<UnitId>, route: Route) -> PassResult {
        let ctx = RuleContext::new(&b.state, rules, b.me, ValidationMode::combat());
        validate_first(&ctx, &MoveCandidate::new(units, route))
    }

    #[test]
    fn empty_missing_and_duplicate_units() {
        let mut b = board();
        let rules = Ruleset::default();
        let route = Route::new(b.home, vec![b.next]);
        assert_eq!(check(&b, &rules, vec![], route.clone()), Err(MoveError::NoUnits));
        let elsewhere = b.state.add_unit(b.infantry, b.me, b.next);
        assert_eq!(
            check(&b, &rules, vec![elsewhere], route.clone()),
            Err(MoveError::UnitsNotInStart)
        );
        let u = b.state.add_unit(b.infantry, b.me, b.home);
        assert_eq!(check(&b, &rules, vec![u, u], route), Err(MoveError::DuplicateUnits));
    }

    #[test]
    fn submerged_units_are_held_back() {
        let mut b = board();
        let a = b.state.add_unit(b.infantry, b.me, b.home);
        let sub = b.state.add_unit(b.infantry, b.me, b.home);
        b.state.unit_mut(sub).submerged = true;
        let rules = Ruleset::default();
        let findings = check(&b, &rules, vec![a, sub], Route::new(b.home, vec![b.next])).unwrap();
        assert!(!findings.is_disallowed(a));
        assert!(findings.is_disallowed(sub));
    }

    #[test]
    fn disconnected_route_is_invalid() {
        let mut b = board();
        let island = b.state.add_territory("Iceland", false);
        let u = b.state.add_unit(b.infantry, b.me, b.home);
        let rules = Ruleset::default();
        assert_eq!(
            check(&b, &rules, vec![u], Route::new(b.home, vec![island])),
            Err(MoveError::InvalidRoute("Germany-Iceland".into()))
        );
    }

    #[test]
    fn neutral_owner_blocks_land_passage() {
        let mut b = board();
        b.state.set_owner(b.next, Some(b.other));
        b.state.set_relationship(b.me, b.other, RelationshipKind::Neutral);
        let u = b.state.add_unit(b.infantry, b.me, b.home);
        let rules = Ruleset::default();
        assert_eq!(
            check(&b, &rules, vec![u], Route::new(b.home, vec![b.next])),
            Err(MoveError::LandPassageDenied {
                player: "Germans".into(),
                owner: "Swiss".into()
            })
        );
    }

    #[test]
    fn restricted_movement_lists() {
        let mut b = board();
        let u = b.state.add_unit(b.infantry, b.me, b.home);
        b.state.player_mut(b.me).movement_restriction = Some(MovementRestriction {
            kind: RestrictionKind::Disallowed,
            territories: vec![b.next],
        });
        let mut rules = Ruleset::default();
        let route = Route::new(b.home, vec![b.next]);
        assert!(check(&b, &rules, vec![u], route.clone()).is_ok());
        rules.movement_by_territory_restricted = true;
        assert_eq!(check(&b, &rules, vec![u], route.clone()), Err(MoveError::IntoRestricted));
        b.state.player_mut(b.me).movement_restriction = Some(MovementRestriction {
            kind: RestrictionKind::Allowed,
            territories: vec![b.home],
        });
        assert_eq!(check(&b, &rules, vec![u], route), Err(MoveError::OutsideRestricted));
    }

    #[test]
    fn foreign_units_are_not_ours_to_move() {
        let mut b = board();
        b.state.set_relationship(b.me, b.other, RelationshipKind::Allied);
        let mine = b.state.add_unit(b.infantry, b.me, b.home);
        let theirs = b.state.add_unit(b.infantry, b.other, b.home);
        let rules = Ruleset::default();
        assert_eq!(
            check(&b, &rules, vec![mine, theirs], Route::new(b.home, vec![b.next])),
            Err(MoveError::NotOwner {
                player: "Germans".into(),
                units: "2 infantry".into()
            })
        );
        let ctx = RuleContext::new(&b.state, &rules, b.me, ValidationMode::combat().with_edit_mode(true));
        let candidate = MoveCandidate::new(vec![mine, theirs], Route::new(b.home, vec![b.next]));
        assert!(validate_first(&ctx, &candidate).is_ok());
    }
}
