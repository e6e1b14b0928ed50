//! Routes: a start territory followed by the steps taken from it.
//!
//! A route never owns territory data. Helpers that depend on terrain take
//! the map they should be read against.

use std::fmt;

use super::map::GameMap;
use super::movement::Movement;
use super::territory::TerritoryId;
use super::unit::UnitTypeId;

/// An ordered path: `start` and then each territory entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    start: TerritoryId,
    steps: Vec<TerritoryId>,
}

impl Route {
    pub fn new(start: TerritoryId, steps: Vec<TerritoryId>) -> Self {
        Route { start, steps }
    }

    /// Builds a route from the full territory sequence, start first.
    /// Returns `None` for an empty sequence.
    pub fn from_territories(territories: &[TerritoryId]) -> Option<Self> {
        let (&start, steps) = territories.split_first()?;
        Some(Route::new(start, steps.to_vec()))
    }

    /// A route that stays where it is.
    pub fn stationary(start: TerritoryId) -> Self {
        Route::new(start, Vec::new())
    }

    pub const fn start(&self) -> TerritoryId {
        self.start
    }

    /// The last territory, or the start when there are no steps.
    pub fn end(&self) -> TerritoryId {
        self.steps.last().copied().unwrap_or(self.start)
    }

    pub fn steps(&self) -> &[TerritoryId] {
        &self.steps
    }

    /// Steps strictly between start and end.
    pub fn middle_steps(&self) -> &[TerritoryId] {
        match self.steps.len() {
            0 | 1 => &[],
            n => &self.steps[..n - 1],
        }
    }

    pub fn all_territories(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        std::iter::once(self.start).chain(self.steps.iter().copied())
    }

    /// Consecutive `(from, to)` pairs along the route.
    pub fn legs(&self) -> impl Iterator<Item = (TerritoryId, TerritoryId)> + '_ {
        self.all_territories().zip(self.steps.iter().copied())
    }

    pub fn number_of_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn has_no_steps(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_exactly_one_step(&self) -> bool {
        self.steps.len() == 1
    }

    pub fn has_more_than_one_step(&self) -> bool {
        self.steps.len() > 1
    }

    /// True if any step (not the start) satisfies `pred`.
    pub fn any_step(&self, pred: impl Fn(TerritoryId) -> bool) -> bool {
        self.steps.iter().any(|&t| pred(t))
    }

    /// Steps (not the start) satisfying `pred`, in route order.
    pub fn matching_steps(&self, pred: impl Fn(TerritoryId) -> bool) -> Vec<TerritoryId> {
        self.steps.iter().copied().filter(|&t| pred(t)).collect()
    }

    /// True if there is at least one middle step and every one satisfies `pred`.
    pub fn all_middle_steps(&self, pred: impl Fn(TerritoryId) -> bool) -> bool {
        let middle = self.middle_steps();
        !middle.is_empty() && middle.iter().all(|&t| pred(t))
    }

    pub fn any_middle_step(&self, pred: impl Fn(TerritoryId) -> bool) -> bool {
        self.middle_steps().iter().any(|&t| pred(t))
    }

    pub fn has_water(&self, map: &GameMap) -> bool {
        self.all_territories().any(|t| map.territory(t).is_water)
    }

    pub fn has_land(&self, map: &GameMap) -> bool {
        self.all_territories().any(|t| map.territory(t).is_land())
    }

    /// Land to water.
    pub fn is_load(&self, map: &GameMap) -> bool {
        self.has_steps()
            && map.territory(self.start).is_land()
            && map.territory(self.end()).is_water
    }

    /// Water to land.
    pub fn is_unload(&self, map: &GameMap) -> bool {
        self.has_steps()
            && map.territory(self.start).is_water
            && map.territory(self.end()).is_land()
    }

    pub fn has_neutral_before_end(&self, map: &GameMap) -> bool {
        self.middle_steps()
            .iter()
            .any(|&t| map.territory(t).is_neutral_land())
    }

    /// Movement cost for one unit type: the sum of each step's entry cost.
    pub fn movement_cost(&self, map: &GameMap, unit_type: UnitTypeId) -> Movement {
        self.steps
            .iter()
            .map(|&t| map.territory(t).movement_cost_for(unit_type))
            .sum()
    }

    /// Steps that are neutral land with nothing in them.
    pub fn empty_neutrals(&self, map: &GameMap) -> Vec<TerritoryId> {
        self.matching_steps(|t| {
            let territory = map.territory(t);
            territory.is_neutral_land() && territory.units.is_empty()
        })
    }

    /// Renders territory names joined by `-`.
    pub fn display<'a>(&'a self, map: &'a GameMap) -> RouteDisplay<'a> {
        RouteDisplay { route: self, map }
    }
}

/// A route formatted with territory names.
pub struct RouteDisplay<'a> {
    route: &'a Route,
    map: &'a GameMap,
}

impl fmt::Display for RouteDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.route.all_territories().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{}", self.map.territory(t).name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_map() -> GameMap {
        let mut map = GameMap::default();
        let a = map.add_territory("a", false);
        let b = map.add_territory("b", false);
        let c = map.add_territory("c", true);
        let d = map.add_territory("d", false);
        map.connect(a, b);
        map.connect(b, c);
        map.connect(c, d);
        map
    }

    #[test]
    fn end_and_middle_steps() {
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1), TerritoryId(2)]);
        assert_eq!(r.end(), TerritoryId(2));
        assert_eq!(r.middle_steps(), &[TerritoryId(1)]);
        let stay = Route::stationary(TerritoryId(4));
        assert_eq!(stay.end(), TerritoryId(4));
        assert!(stay.middle_steps().is_empty());
        assert!(stay.has_no_steps());
    }

    #[test]
    fn all_middle_steps_needs_a_middle() {
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1)]);
        assert!(!r.all_middle_steps(|_| true));
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1), TerritoryId(2)]);
        assert!(r.all_middle_steps(|t| t == TerritoryId(1)));
    }

    #[test]
    fn any_step_ignores_start() {
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1)]);
        assert!(!r.any_step(|t| t == TerritoryId(0)));
        assert!(r.any_step(|t| t == TerritoryId(1)));
    }

    #[test]
    fn load_and_unload() {
        let map = line_map();
        let load = Route::new(TerritoryId(1), vec![TerritoryId(2)]);
        assert!(load.is_load(&map));
        assert!(!load.is_unload(&map));
        let unload = Route::new(TerritoryId(2), vec![TerritoryId(3)]);
        assert!(unload.is_unload(&map));
        assert!(!Route::stationary(TerritoryId(2)).is_unload(&map));
    }

    #[test]
    fn movement_cost_sums_steps() {
        let mut map = line_map();
        let tank = UnitTypeId(0);
        map.territory_mut(TerritoryId(1))
            .effects
            .movement_cost
            .insert(tank, "1.5".parse().unwrap());
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1), TerritoryId(2)]);
        assert_eq!(r.movement_cost(&map, tank), "2.5".parse().unwrap());
        assert_eq!(r.movement_cost(&map, UnitTypeId(1)), Movement::from_int(2));
    }

    #[test]
    fn neutral_before_end() {
        let map = line_map();
        let through = Route::new(TerritoryId(0), vec![TerritoryId(1), TerritoryId(2)]);
        assert!(through.has_neutral_before_end(&map));
        assert_eq!(through.empty_neutrals(&map), vec![TerritoryId(1)]);
    }

    #[test]
    fn display_joins_names() {
        let map = line_map();
        let r = Route::new(TerritoryId(0), vec![TerritoryId(1), TerritoryId(2)]);
        assert_eq!(r.display(&map).to_string(), "a-b-c");
    }
}
