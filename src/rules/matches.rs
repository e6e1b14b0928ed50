//! Unit and territory predicates evaluated against a [`RuleContext`].
//!
//! These are the building blocks every validation pass composes. Each takes
//! plain ids so it can be lifted into a [`Predicate`](super::Predicate) with
//! a one-line closure.

use crate::board::{Movement, PlayerId, Route, TerritoryId, UnitId, UnitTypeId};

use super::context::RuleContext;

impl RuleContext<'_> {
    // Units

    pub fn is_owned(&self, u: UnitId) -> bool {
        self.unit(u).owner == self.player
    }

    pub fn is_enemy_unit(&self, u: UnitId) -> bool {
        self.is_at_war_with(Some(self.unit(u).owner))
    }

    /// Owned by the mover or an ally.
    pub fn is_allied_unit(&self, u: UnitId) -> bool {
        self.is_allied_with(Some(self.unit(u).owner))
    }

    pub fn is_allied_not_owned(&self, u: UnitId) -> bool {
        !self.is_owned(u) && self.is_allied_unit(u)
    }

    pub fn is_air(&self, u: UnitId) -> bool {
        self.ty(u).is_air()
    }

    pub fn is_sea(&self, u: UnitId) -> bool {
        self.ty(u).is_sea()
    }

    pub fn is_land(&self, u: UnitId) -> bool {
        self.ty(u).is_land()
    }

    pub fn is_carrier(&self, u: UnitId) -> bool {
        self.ty(u).is_carrier()
    }

    pub fn can_land_on_carrier(&self, u: UnitId) -> bool {
        self.ty(u).can_land_on_carrier()
    }

    pub fn carrier_cost(&self, u: UnitId) -> u32 {
        self.ty(u).carrier_cost.unwrap_or(0)
    }

    pub fn transport_cost(&self, u: UnitId) -> u32 {
        self.ty(u).transport_cost.unwrap_or(0)
    }

    pub fn is_sea_transport(&self, u: UnitId) -> bool {
        self.ty(u).is_sea_transport()
    }

    /// A sea transport that does not also count as a warship.
    pub fn is_sea_transport_but_not_combat(&self, u: UnitId) -> bool {
        let ty = self.ty(u);
        ty.is_sea_transport() && !ty.abilities.is_combat_transport
    }

    pub fn is_not_sea_transport_but_could_be_combat(&self, u: UnitId) -> bool {
        let ty = self.ty(u);
        !ty.can_transport() || (ty.abilities.is_combat_transport && ty.is_sea())
    }

    pub fn is_air_transport(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_air_transport
    }

    pub fn is_air_transportable(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_air_transportable
    }

    pub fn is_land_transport(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_land_transport
    }

    pub fn is_land_transportable(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_land_transportable
    }

    pub fn is_infrastructure(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_infrastructure
    }

    pub fn is_submarine(&self, u: UnitId) -> bool {
        self.ty(u).abilities.can_move_through_enemies
    }

    pub fn is_destroyer(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_destroyer
    }

    pub fn can_blitz(&self, u: UnitId) -> bool {
        self.ty(u).abilities.can_blitz
    }

    pub fn is_kamikaze(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_kamikaze
    }

    pub fn is_suicide_on_attack(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_suicide_on_attack
    }

    pub fn is_submerged(&self, u: UnitId) -> bool {
        self.unit(u).submerged
    }

    pub fn has_moved(&self, u: UnitId) -> bool {
        self.unit(u).has_moved()
    }

    pub fn is_transported(&self, u: UnitId) -> bool {
        self.unit(u).transported_by.is_some()
    }

    pub fn is_of_type(&self, u: UnitId, ty: UnitTypeId) -> bool {
        self.unit(u).type_id == ty
    }

    /// Bombing damage beyond the operational maximum disables a unit.
    pub fn is_disabled(&self, u: UnitId) -> bool {
        let ty = self.ty(u);
        if !ty.abilities.can_be_damaged || !self.rules.damage_from_bombing_done_to_units {
            return false;
        }
        match ty.max_operational_damage {
            Some(max) => self.unit(u).damage > max,
            None => false,
        }
    }

    pub fn is_enemy_aa_for_flyover(&self, u: UnitId) -> bool {
        self.ty(u).abilities.is_aa_for_fly_over && self.is_enemy_unit(u)
    }

    /// Whether `u` may land from `transport` in an amphibious assault.
    pub fn can_invade_from(&self, u: UnitId, transport: UnitId) -> bool {
        let transport_type = self.unit(transport).type_id;
        !self.ty(u).cannot_invade_from.contains(&transport_type)
    }

    /// Air units gain a point at each end of the route that has an air base.
    pub fn has_enough_movement_for_route(&self, u: UnitId, route: &Route) -> bool {
        let unit = self.unit(u);
        let mut left = unit.movement_left;
        if self.ty(u).is_air() {
            if self.territory(route.start()).air_base {
                left += Movement::ONE;
            }
            if self.territory(route.end()).air_base {
                left += Movement::ONE;
            }
        }
        if left.is_negative() {
            return false;
        }
        left >= route.movement_cost(&self.state.map, unit.type_id)
    }

    /// Some alternative set of required types is present in `t`, counting
    /// only working units allied to the unit's owner.
    pub fn has_required_units_to_move(&self, u: UnitId, t: TerritoryId) -> bool {
        let required = &self.ty(u).requires_units_to_move;
        if required.is_empty() {
            return true;
        }
        let owner = self.unit(u).owner;
        let present: Vec<UnitTypeId> = self
            .state
            .units_in(t)
            .filter(|&other| {
                self.state
                    .relationships
                    .is_allied(owner, Some(self.unit(other).owner))
                    && !self.is_disabled(other)
            })
            .map(|other| self.unit(other).type_id)
            .collect();
        required
            .iter()
            .any(|set| set.iter().all(|ty| present.contains(ty)))
    }

    pub fn all_have_required_units_to_move(&self, units: &[UnitId], t: TerritoryId) -> bool {
        units.iter().all(|&u| self.has_required_units_to_move(u, t))
    }

    // Territories

    pub fn is_territory_owned(&self, t: TerritoryId) -> bool {
        self.territory(t).is_owned_by(self.player)
    }

    /// Not ours and owned by someone we are at war with. Unowned water and
    /// neutral land count as enemy.
    pub fn is_territory_enemy(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        !territory.is_owned_by(self.player) && self.is_at_war_with(territory.owner)
    }

    pub fn is_territory_enemy_not_unowned_water(&self, t: TerritoryId) -> bool {
        self.is_territory_enemy(t) && !self.territory(t).is_unowned_water()
    }

    /// Enemy territory a unit could actually enter.
    pub fn is_enemy_destination(&self, t: TerritoryId) -> bool {
        self.is_territory_enemy_not_unowned_water(t) && self.is_passable_and_not_restricted(t)
    }

    pub fn is_territory_allied(&self, t: TerritoryId) -> bool {
        self.is_allied_with(self.territory(t).owner)
    }

    pub fn is_territory_friendly(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        territory.is_water || territory.is_owned_by(self.player) || self.is_allied_with(territory.owner)
    }

    pub fn is_neutral(&self, t: TerritoryId) -> bool {
        self.territory(t).owner.is_none()
    }

    pub fn is_neutral_land(&self, t: TerritoryId) -> bool {
        self.territory(t).is_neutral_land()
    }

    pub fn is_water(&self, t: TerritoryId) -> bool {
        self.territory(t).is_water
    }

    pub fn is_impassable(&self, t: TerritoryId) -> bool {
        self.territory(t).is_impassable()
    }

    /// Restrictions only apply when the house rule is on and the mover has one.
    pub fn is_restricted(&self, t: TerritoryId) -> bool {
        if !self.rules.movement_by_territory_restricted {
            return false;
        }
        match &self.mover().movement_restriction {
            Some(restriction) => !restriction.permits(t),
            None => false,
        }
    }

    pub fn is_passable_and_not_restricted(&self, t: TerritoryId) -> bool {
        !self.is_impassable(t) && !self.is_restricted(t)
    }

    pub fn is_not_impassable_to_land(&self, t: TerritoryId) -> bool {
        !self.is_water(t) && self.is_passable_and_not_restricted(t)
    }

    pub fn air_can_fly_over(&self, t: TerritoryId, neutrals_passable: bool) -> bool {
        let territory = self.territory(t);
        if !neutrals_passable && territory.is_neutral_land() {
            return false;
        }
        self.is_passable_and_not_restricted(t)
            && !(territory.is_land() && !self.relationship(territory.owner).can_move_air_units_over_owned_land)
    }

    pub fn sea_can_move_over(&self, t: TerritoryId) -> bool {
        self.is_water(t) && self.is_passable_and_not_restricted(t)
    }

    /// Allied land not conquered this turn whose owner lets our air land.
    pub fn air_can_land_on_allied_non_conquered_land(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        if territory.is_water || territory.conquered || territory.owner.is_none() {
            return false;
        }
        let rel = self.relationship(territory.owner);
        rel.can_move_air_units_over_owned_land && rel.can_land_air_units_on_owned_land
    }

    pub fn allows_air_over_owned_land(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        territory.is_water || self.relationship(territory.owner).can_move_air_units_over_owned_land
    }

    pub fn allows_land_over_owned_land(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        territory.is_water || self.relationship(territory.owner).can_move_land_units_over_owned_land
    }

    pub fn owner_can_move_into_during_combat(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        territory.is_owned_by(self.player)
            || territory.is_unowned_water()
            || self.relationship(territory.owner).can_move_into_during_combat_move
    }

    /// Land that can be blitzed through: not conquered outright this turn
    /// and free of enemy units that would stop the blitz.
    pub fn is_blitzable(&self, t: TerritoryId) -> bool {
        let territory = self.territory(t);
        if territory.is_water {
            return false;
        }
        if territory.owner.is_none() && !self.rules.neutrals_blitzable {
            return false;
        }
        if territory.conquered_not_blitzed() {
            return false;
        }
        let infrastructure_ignored =
            !self.rules.ww2v2 && !self.rules.blitz_through_factories_and_aa_restricted;
        territory
            .units
            .iter()
            .all(|&u| !self.is_enemy_unit(u) || (infrastructure_ignored && self.is_infrastructure(u)))
    }

    pub fn has_enemy_units(&self, t: TerritoryId) -> bool {
        self.state.units_in(t).any(|u| self.is_enemy_unit(u))
    }

    pub fn has_enemy_sea_units(&self, t: TerritoryId) -> bool {
        self.state
            .units_in(t)
            .any(|u| self.is_enemy_unit(u) && self.is_sea(u))
    }

    pub fn has_enemy_aa_for_flyover(&self, t: TerritoryId) -> bool {
        self.state.units_in(t).any(|u| self.is_enemy_aa_for_flyover(u))
    }

    /// Nothing here but infrastructure and non-enemy units.
    pub fn is_empty_of_combat_units(&self, t: TerritoryId) -> bool {
        self.state
            .units_in(t)
            .all(|u| self.is_infrastructure(u) || !self.is_enemy_unit(u))
    }

    pub fn was_fought_over(&self, t: TerritoryId) -> bool {
        self.territory(t).was_fought_over()
    }

    pub fn has_owned_carrier(&self, t: TerritoryId) -> bool {
        self.state
            .units_in(t)
            .any(|u| self.is_owned(u) && self.is_carrier(u))
    }

    /// Some neighbor is ours and has held a factory since the turn began.
    pub fn has_owned_factory_neighbor(&self, t: TerritoryId) -> bool {
        self.state.map.neighbors(t).iter().any(|&n| {
            let neighbor = self.territory(n);
            neighbor.is_owned_by(self.player) && neighbor.factory_at_turn_start
        })
    }

    pub fn territory_effects_allow(&self, t: TerritoryId, units: &[UnitId]) -> bool {
        let banned = &self.territory(t).effects.types_not_allowed;
        banned.is_empty() || !units.iter().any(|&u| banned.contains(&self.unit(u).type_id))
    }

    // Relationships

    pub fn is_allied_player(&self, a: PlayerId, b: PlayerId) -> bool {
        self.state.relationships.is_allied(a, Some(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{Domain, GameState, PlayerId, RelationshipKind, UnitType};
    use crate::rules::{RuleContext, Ruleset, ValidationMode};

    struct Fixture {
        state: GameState,
        rules: Ruleset,
        me: PlayerId,
        enemy: PlayerId,
    }

    fn fixture() -> Fixture {
        let mut state = GameState::new();
        let me = state.add_player("Germans");
        let enemy = state.add_player("Russians");
        state.set_relationship(me, enemy, RelationshipKind::War);
        Fixture {
            state,
            rules: Ruleset::default(),
            me,
            enemy,
        }
    }

    impl Fixture {
        fn ctx(&self) -> RuleContext<'_> {
            RuleContext::new(&self.state, &self.rules, self.me, ValidationMode::combat())
        }
    }

    #[test]
    fn enemy_and_neutral_territories() {
        let mut f = fixture();
        let mine = f.state.add_territory("Berlin", false);
        let theirs = f.state.add_territory("Moscow", false);
        let neutral = f.state.add_territory("Sweden", false);
        let sea = f.state.add_territory("sz5", true);
        f.state.set_owner(mine, Some(f.me));
        f.state.set_owner(theirs, Some(f.enemy));
        let ctx = f.ctx();
        assert!(!ctx.is_territory_enemy(mine));
        assert!(ctx.is_territory_enemy(theirs));
        assert!(ctx.is_territory_enemy(neutral));
        assert!(ctx.is_territory_enemy(sea));
        assert!(!ctx.is_territory_enemy_not_unowned_water(sea));
        assert!(ctx.is_territory_friendly(sea));
        assert!(!ctx.air_can_fly_over(neutral, false));
        assert!(ctx.air_can_fly_over(neutral, true));
    }

    #[test]
    fn blitzable_ignores_infrastructure_outside_ww2v2() {
        let mut f = fixture();
        let mut factory = UnitType::new("factory", Domain::Land, 0);
        factory.abilities.is_infrastructure = true;
        let factory = f.state.add_unit_type(factory);
        let t = f.state.add_territory("Karelia", false);
        f.state.set_owner(t, Some(f.enemy));
        f.state.add_unit(factory, f.enemy, t);
        assert!(f.ctx().is_blitzable(t));
        f.rules.ww2v2 = true;
        assert!(!f.ctx().is_blitzable(t));
    }

    #[test]
    fn conquered_territory_is_not_blitzable() {
        let mut f = fixture();
        let t = f.state.add_territory("Poland", false);
        f.state.set_owner(t, Some(f.me));
        f.state.territory_mut(t).conquered = true;
        assert!(!f.ctx().is_blitzable(t));
        f.state.territory_mut(t).blitzed = true;
        assert!(f.ctx().is_blitzable(t));
    }

    #[test]
    fn air_base_extends_range() {
        let mut f = fixture();
        let fighter = f.state.add_unit_type(UnitType::new("fighter", Domain::Air, 1));
        let a = f.state.add_territory("a", false);
        let b = f.state.add_territory("b", false);
        let c = f.state.add_territory("c", false);
        f.state.connect(a, b);
        f.state.connect(b, c);
        let u = f.state.add_unit(fighter, f.me, a);
        let route = crate::board::Route::new(a, vec![b, c]);
        assert!(!f.ctx().has_enough_movement_for_route(u, &route));
        f.state.territory_mut(a).air_base = true;
        assert!(f.ctx().has_enough_movement_for_route(u, &route));
    }

    #[test]
    fn required_units_need_a_full_set() {
        let mut f = fixture();
        let truck = f.state.add_unit_type(UnitType::new("truck", Domain::Land, 1));
        let fuel = f.state.add_unit_type(UnitType::new("depot", Domain::Land, 0));
        let mut needy = UnitType::new("artillery", Domain::Land, 1);
        needy.requires_units_to_move = vec![vec![truck, fuel]];
        let needy = f.state.add_unit_type(needy);
        let t = f.state.add_territory("Kiev", false);
        let u = f.state.add_unit(needy, f.me, t);
        f.state.add_unit(truck, f.me, t);
        assert!(!f.ctx().has_required_units_to_move(u, t));
        f.state.add_unit(fuel, f.enemy, t);
        assert!(!f.ctx().has_required_units_to_move(u, t));
        f.state.add_unit(fuel, f.me, t);
        assert!(f.ctx().has_required_units_to_move(u, t));
    }

    #[test]
    fn restriction_applies_only_with_house_rule() {
        use crate::board::{MovementRestriction, RestrictionKind};
        let mut f = fixture();
        let a = f.state.add_territory("a", false);
        let b = f.state.add_territory("b", false);
        f.state.player_mut(f.me).movement_restriction = Some(MovementRestriction {
            kind: RestrictionKind::Allowed,
            territories: vec![a],
        });
        assert!(!f.ctx().is_restricted(b));
        f.rules.movement_by_territory_restricted = true;
        assert!(f.ctx().is_restricted(b));
        assert!(!f.ctx().is_restricted(a));
    }
}
