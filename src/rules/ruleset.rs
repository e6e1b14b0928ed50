//! House-rule configuration.
//!
//! Every toggle defaults to off, so an empty TOML file yields the plainest
//! ruleset. Unknown keys are rejected to catch misspelled options.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ruleset {
    /// Air units need not find a landing spot.
    pub kamikaze_airplanes: bool,
    pub neutral_flyover_allowed: bool,
    pub neutrals_impassable: bool,
    pub neutrals_blitzable: bool,
    /// PUs charged per empty neutral territory entered.
    pub neutral_charge: u32,
    pub all_units_can_attack_from_contested_territories: bool,
    pub ww2v2: bool,
    pub ww2v3: bool,
    pub naval_units_may_not_non_combat_move_into_controlled_sea_zones: bool,
    pub subs_can_end_non_combat_move_with_enemies: bool,
    pub ignore_transport_in_movement: bool,
    pub scramble_rules_in_effect: bool,
    pub use_kamikaze_suicide_attacks: bool,
    pub submarines_prevent_unescorted_amphibious_assaults: bool,
    pub units_can_load_in_hostile_sea_zones: bool,
    pub paratroopers_can_move_during_non_combat: bool,
    pub paratroopers_can_attack_deep_into_enemy_territory: bool,
    pub control_all_canals_between_territories_to_pass: bool,
    pub use_fuel_cost: bool,
    pub movement_by_territory_restricted: bool,
    pub lhtr_carrier_production_rules: bool,
    pub land_existing_fighters_on_new_carriers: bool,
    pub transport_unload_restricted: bool,
    pub blitz_through_factories_and_aa_restricted: bool,
    pub multiple_aa_per_territory: bool,
    pub damage_from_bombing_done_to_units: bool,
    pub airborne_attacks_only_in_existing_battles: bool,
    pub airborne_attacks_only_in_enemy_territories: bool,
}

impl Ruleset {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a ruleset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let rules = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded ruleset");
        Ok(rules)
    }

    pub fn neutrals_passable_by_air(&self) -> bool {
        self.neutral_flyover_allowed && !self.neutrals_impassable
    }

    pub fn neutrals_blitzable_effective(&self) -> bool {
        self.neutrals_blitzable && !self.neutrals_impassable
    }

    pub fn neutral_charge_for(&self, territories: usize) -> u32 {
        self.neutral_charge.saturating_mul(territories as u32)
    }

    pub fn naval_may_not_non_combat_into_controlled(&self) -> bool {
        self.ww2v2 || self.naval_units_may_not_non_combat_move_into_controlled_sea_zones
    }

    /// Carriers still in the production queue count as landing capacity.
    pub fn land_air_on_new_carriers(&self) -> bool {
        self.lhtr_carrier_production_rules || self.land_existing_fighters_on_new_carriers
    }
}
