//! The input to validation: which units move, along which route, and how
//! cargo is assigned to transports.

use std::collections::BTreeMap;

use crate::board::{Route, UnitId};
use crate::error::{EngineError, Result};

/// A proposed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCandidate {
    pub units: Vec<UnitId>,
    pub route: Route,
    /// Land unit to the sea transport it boards.
    pub sea_transports: BTreeMap<UnitId, UnitId>,
    /// Air transport to the paratroopers it carries.
    pub air_dependents: BTreeMap<UnitId, Vec<UnitId>>,
}

impl MoveCandidate {
    pub fn new(units: Vec<UnitId>, route: Route) -> Self {
        MoveCandidate {
            units,
            route,
            sea_transports: BTreeMap::new(),
            air_dependents: BTreeMap::new(),
        }
    }

    pub fn with_sea_transport(mut self, cargo: UnitId, transport: UnitId) -> Self {
        self.sea_transports.insert(cargo, transport);
        self
    }

    pub fn with_air_dependents(mut self, transport: UnitId, cargo: Vec<UnitId>) -> Self {
        self.air_dependents.insert(transport, cargo);
        self
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Every unit the paratrooper map declares as carried.
    pub fn air_dependent_units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.air_dependents.values().flatten().copied()
    }

    /// Checks that every unit assigned as cargo is part of the move.
    /// Transports are checked by the structural pass instead, since a sea
    /// transport waiting at the end of a load is legitimately not moving.
    pub fn check_assignments(&self) -> Result<()> {
        let cargo = self.sea_transports.keys().copied().chain(self.air_dependent_units());
        for unit in cargo {
            if !self.contains(unit) {
                return Err(EngineError::StrayAssignment(unit));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TerritoryId;

    #[test]
    fn stray_cargo_is_a_contract_breach() {
        let route = Route::new(TerritoryId(0), vec![TerritoryId(1)]);
        let ok = MoveCandidate::new(vec![UnitId(0)], route.clone()).with_sea_transport(UnitId(0), UnitId(1));
        assert!(ok.check_assignments().is_ok());
        let stray = MoveCandidate::new(vec![UnitId(0)], route.clone()).with_sea_transport(UnitId(5), UnitId(1));
        assert!(matches!(
            stray.check_assignments(),
            Err(EngineError::StrayAssignment(UnitId(5)))
        ));
        let stray = MoveCandidate::new(vec![UnitId(0)], route).with_air_dependents(UnitId(0), vec![UnitId(3)]);
        assert!(matches!(
            stray.check_assignments(),
            Err(EngineError::StrayAssignment(UnitId(3)))
        ));
    }
}
