//! The territory graph and the queries every validator runs against it.
//!
//! Neighbor sets are returned as `BTreeSet`s so iteration order is fixed by
//! territory id, which keeps every search built on top of them deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, VecDeque};

use super::movement::Movement;
use super::route::Route;
use super::territory::{Canal, Territory, TerritoryId};
use super::unit::UnitTypeId;
use crate::rules::Predicate;

/// Territories, their adjacency, and the canals between sea zones.
#[derive(Debug, Clone, Default)]
pub struct GameMap {
    territories: Vec<Territory>,
    adjacency: Vec<Vec<TerritoryId>>,
    canals: Vec<Canal>,
    by_name: HashMap<String, TerritoryId>,
}

impl GameMap {
    /// Adds a territory and returns its id. Names are expected to be unique.
    pub fn add_territory(&mut self, name: impl Into<String>, is_water: bool) -> TerritoryId {
        let id = TerritoryId(self.territories.len() as u16);
        let territory = Territory::new(id, name, is_water);
        self.by_name.insert(territory.name.clone(), id);
        self.territories.push(territory);
        self.adjacency.push(Vec::new());
        id
    }

    /// Connects two territories in both directions.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if a == b {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            let list = &mut self.adjacency[from.index()];
            if let Err(pos) = list.binary_search(&to) {
                list.insert(pos, to);
            }
        }
    }

    pub fn add_canal(&mut self, canal: Canal) {
        self.canals.push(canal);
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    pub fn contains(&self, id: TerritoryId) -> bool {
        id.index() < self.territories.len()
    }

    /// Panics if `id` was not issued by this map.
    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.index()]
    }

    pub fn territory_mut(&mut self, id: TerritoryId) -> &mut Territory {
        &mut self.territories[id.index()]
    }

    pub fn get(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(id.index())
    }

    pub fn territories(&self) -> impl Iterator<Item = &Territory> {
        self.territories.iter()
    }

    pub fn id_of(&self, name: &str) -> Option<TerritoryId> {
        self.by_name.get(name).copied()
    }

    pub fn canals(&self) -> &[Canal] {
        &self.canals
    }

    pub fn canals_mut(&mut self) -> &mut [Canal] {
        &mut self.canals
    }

    /// Canals whose passage is the move from `a` to `b`.
    pub fn canals_between(&self, a: TerritoryId, b: TerritoryId) -> impl Iterator<Item = &Canal> {
        self.canals.iter().filter(move |c| c.connects(a, b))
    }

    pub fn neighbors(&self, t: TerritoryId) -> &[TerritoryId] {
        &self.adjacency[t.index()]
    }

    pub fn is_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.adjacency[a.index()].binary_search(&b).is_ok()
    }

    /// Direct neighbors of `t` satisfying `cond`.
    pub fn neighbors_matching<P: Predicate<TerritoryId>>(
        &self,
        t: TerritoryId,
        cond: &P,
    ) -> BTreeSet<TerritoryId> {
        self.neighbors(t)
            .iter()
            .copied()
            .filter(|&n| cond.test(n))
            .collect()
    }

    /// Territories within `distance` steps of `t` where every territory
    /// entered satisfies `cond`. The start is never included.
    pub fn neighbors_within<P: Predicate<TerritoryId>>(
        &self,
        t: TerritoryId,
        distance: u32,
        cond: &P,
    ) -> BTreeSet<TerritoryId> {
        if distance == 0 {
            return BTreeSet::new();
        }
        let first = self.neighbors_matching(t, cond);
        if distance == 1 {
            return first;
        }
        let mut result = self.expand(first.clone(), first, distance - 1, cond);
        result.remove(&t);
        result
    }

    /// Territories within `distance` steps of any frontier territory, with
    /// the frontier itself excluded.
    pub fn neighbors_of_set<P: Predicate<TerritoryId>>(
        &self,
        frontier: &BTreeSet<TerritoryId>,
        distance: u32,
        cond: &P,
    ) -> BTreeSet<TerritoryId> {
        let mut result = self.expand(frontier.clone(), frontier.clone(), distance, cond);
        result.retain(|t| !frontier.contains(t));
        result
    }

    /// Neighbors reachable with `movement_left` points, counting each step
    /// as one point and truncating fractional movement beyond the first step.
    pub fn neighbors_by_movement_cost<P: Predicate<TerritoryId>>(
        &self,
        t: TerritoryId,
        movement_left: Movement,
        cond: &P,
    ) -> BTreeSet<TerritoryId> {
        if movement_left <= Movement::ZERO {
            return BTreeSet::new();
        }
        let first = self.neighbors_matching(t, cond);
        if movement_left <= Movement::ONE {
            return first;
        }
        let extra = u32::try_from(movement_left.floor_int() - 1).unwrap_or(0);
        let mut result = self.expand(first.clone(), first, extra, cond);
        result.remove(&t);
        result
    }

    fn expand<P: Predicate<TerritoryId>>(
        &self,
        mut frontier: BTreeSet<TerritoryId>,
        mut searched: BTreeSet<TerritoryId>,
        mut distance: u32,
        cond: &P,
    ) -> BTreeSet<TerritoryId> {
        while distance > 0 && !frontier.is_empty() {
            let next: BTreeSet<TerritoryId> = frontier
                .iter()
                .flat_map(|&f| self.neighbors(f).iter().copied())
                .filter(|n| !searched.contains(n) && cond.test(*n))
                .collect();
            searched.extend(next.iter().copied());
            frontier = next;
            distance -= 1;
        }
        searched
    }

    /// Fewest steps from `from` to `to` where every territory entered,
    /// including `to`, satisfies `cond`. `None` when unreachable.
    pub fn distance<P: Predicate<TerritoryId>>(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        cond: &P,
    ) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        let mut seen = vec![false; self.len()];
        seen[from.index()] = true;
        let mut queue = VecDeque::from([(from, 0u32)]);
        while let Some((t, d)) = queue.pop_front() {
            for &n in self.neighbors(t) {
                if seen[n.index()] || !cond.test(n) {
                    continue;
                }
                if n == to {
                    return Some(d + 1);
                }
                seen[n.index()] = true;
                queue.push_back((n, d + 1));
            }
        }
        None
    }

    /// Shortest route by step count whose covered territories satisfy
    /// `cond`; the end territory is always allowed.
    pub fn route<P: Predicate<TerritoryId>>(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        cond: &P,
    ) -> Option<Route> {
        if start == end {
            return Some(Route::stationary(start));
        }
        let mut parent: Vec<Option<TerritoryId>> = vec![None; self.len()];
        let mut seen = vec![false; self.len()];
        seen[start.index()] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            for &n in self.neighbors(t) {
                if seen[n.index()] || (n != end && !cond.test(n)) {
                    continue;
                }
                seen[n.index()] = true;
                parent[n.index()] = Some(t);
                if n == end {
                    return Some(self.unwind(start, end, &parent));
                }
                queue.push_back(n);
            }
        }
        None
    }

    /// Cheapest route for a group of unit types. Entering a territory costs
    /// the most any of the types pays there; `leg_ok` can veto individual
    /// legs, which is how canals are honored. The end is always allowed.
    /// Ties on cost prefer fewer steps.
    pub fn route_for_units<P, L>(
        &self,
        start: TerritoryId,
        end: TerritoryId,
        cond: &P,
        unit_types: &[UnitTypeId],
        leg_ok: L,
    ) -> Option<Route>
    where
        P: Predicate<TerritoryId>,
        L: Fn(TerritoryId, TerritoryId) -> bool,
    {
        if start == end {
            return Some(Route::stationary(start));
        }
        let entry_cost = |t: TerritoryId| -> Movement {
            let territory = self.territory(t);
            unit_types
                .iter()
                .map(|&ty| territory.movement_cost_for(ty))
                .max()
                .unwrap_or(Movement::ONE)
        };
        let mut best: Vec<Option<(Movement, u32)>> = vec![None; self.len()];
        let mut parent: Vec<Option<TerritoryId>> = vec![None; self.len()];
        best[start.index()] = Some((Movement::ZERO, 0));
        let mut heap = BinaryHeap::from([Reverse((Movement::ZERO, 0u32, start))]);
        while let Some(Reverse((cost, steps, t))) = heap.pop() {
            if best[t.index()] != Some((cost, steps)) {
                continue;
            }
            if t == end {
                return Some(self.unwind(start, end, &parent));
            }
            for &n in self.neighbors(t) {
                if (n != end && !cond.test(n)) || !leg_ok(t, n) {
                    continue;
                }
                let candidate = (cost + entry_cost(n), steps + 1);
                if best[n.index()].map_or(true, |b| candidate < b) {
                    best[n.index()] = Some(candidate);
                    parent[n.index()] = Some(t);
                    heap.push(Reverse((candidate.0, candidate.1, n)));
                }
            }
        }
        None
    }

    fn unwind(&self, start: TerritoryId, end: TerritoryId, parent: &[Option<TerritoryId>]) -> Route {
        let mut steps = vec![end];
        let mut at = end;
        while let Some(p) = parent[at.index()] {
            if p == start {
                break;
            }
            steps.push(p);
            at = p;
        }
        steps.reverse();
        Route::new(start, steps)
    }

    /// Every territory exists and each leg joins adjacent territories.
    pub fn is_valid_route(&self, route: &Route) -> bool {
        route.all_territories().all(|t| self.contains(t))
            && route.legs().all(|(a, b)| self.is_adjacent(a, b))
    }

    /// Orders `territories` by distance from `from` under `cond`, nearest
    /// first; unreachable territories go last. The sort is stable.
    pub fn sort_by_distance<P: Predicate<TerritoryId>>(
        &self,
        from: TerritoryId,
        territories: &mut [TerritoryId],
        cond: &P,
    ) {
        territories.sort_by_cached_key(|&t| self.distance(from, t, cond).unwrap_or(u32::MAX));
    }
}
