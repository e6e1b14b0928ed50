//! The result of validating one candidate move.
//!
//! A pass either fails the whole move with a [`MoveError`] or returns the
//! [`Findings`] it made: per-unit rejections, each tagged disallowed or
//! unresolved. The pipeline folds pass results into a [`Verdict`] by value,
//! stopping at the first fatal error.

use std::collections::BTreeSet;
use std::fmt;

use crate::board::{ResourceBag, UnitId};

use super::canal::CanalBlockage;

/// A violation that rejects the whole move. `Display` is the message shown
/// to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("No units")]
    NoUnits,
    #[error("Not enough units in starting territory")]
    UnitsNotInStart,
    #[error("Not all units unique")]
    DuplicateUnits,
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
    #[error("Cannot move outside restricted territories")]
    OutsideRestricted,
    #[error("Cannot move to restricted territories")]
    IntoRestricted,
    #[error("{player} may not move land units over land owned by {owner}")]
    LandPassageDenied { player: String, owner: String },
    #[error("{player} may not move air units over land owned by {owner}")]
    AirPassageDenied { player: String, owner: String },
    #[error("Player, {player}, is not owner of all the units: {units}")]
    NotOwner { player: String, units: String },

    // Combat movement
    #[error("Cannot move into territories owned by {0} during Combat Movement Phase")]
    CombatEntryDenied(String),
    #[error("Cannot blitz out of a battle further into enemy territory")]
    BlitzOutOfBattleFurther,
    #[error("Cannot blitz out of a battle into enemy territory")]
    BlitzOutOfBattle,
    #[error("Must stop land units when passing through neutral territories")]
    MustStopInNeutral,
    #[error("Cannot blitz on that route")]
    CannotBlitzRoute,
    #[error("Air units cannot fly over neutral territories")]
    AirOverNeutral,
    #[error("Cannot move through newly captured territories")]
    ThroughNewlyCaptured,
    #[error("Units cannot participate in multiple battles")]
    MultipleBattles,

    // Non-combat movement
    #[error("Can't move through impassable territories")]
    Impassable,
    #[error("Can't move through restricted territories")]
    Restricted,
    #[error("Cannot advance units to battle in non combat")]
    AdvanceUnitsInNonCombat,
    #[error("Cannot move submarines under destroyers")]
    SubmarinesUnderDestroyers,
    #[error("Cannot advance to battle in non combat")]
    AdvanceInNonCombat,
    #[error("Air units cannot fly over neutral territories in non combat")]
    AirOverNeutralInNonCombat,
    #[error("Cannot move units through neutral or enemy territories in non combat")]
    NeutralOrEnemyInNonCombat,

    #[error("Enemy units on path")]
    EnemyUnitsOnPath,

    // Structure
    #[error("Transports not found in route end")]
    TransportsNotAtEnd,
    #[error("Air transports map contains units not being moved")]
    AirTransportsNotMoving,
    #[error("Territory Effects disallow some units into {}", territory_phrase(.plural))]
    TerritoryEffects { plural: bool },
    #[error("{0} doesn't have the required units to allow moving the selected units into it")]
    MissingRequiredUnits(String),
    #[error("Not enough money to pay for violating neutrality")]
    TooPoorToViolateNeutrality,
    #[error("Cannot violate neutrality")]
    CannotViolateNeutrality,

    // Transports
    #[error("Unloading units must stop where they are unloaded")]
    UnloadMustStop,
    #[error("Invalid move, only start or end can be land when route has water.")]
    LandOnlyAtEnds,
    #[error("Units cannot move before loading onto transports")]
    MovedBeforeLoading,
    #[error("Cannot load when enemy sea units are present")]
    EnemySeaUnitsAtLoad,

    // Paratroopers
    #[error("Paratroops may not move during NonCombat")]
    ParatroopsInNonCombat,
    #[error("Not all units could be air transported")]
    NotAllAirTransported,
    #[error("Must stop paratroops in first enemy territory")]
    ParatroopsMustStop,

    #[error("Not enough resources to perform this move, you need: {0} for this move")]
    FuelShortage(ResourceBag),
    #[error("Cannot move units out of battle zone")]
    LeaveBattleZone,

    // Airborne forces
    #[error("Do Not Have Airborne Tech")]
    NoAirborneTech,
    #[error("Require Airborne Forces And Launch Capacity Tech")]
    NoAirborneForces,
    #[error("Destination Is Out Of Range")]
    OutOfRange,
    #[error("Require Airborne Base At Originating Territory")]
    NoAirborneBase,
    #[error("Airborne Bases Must Have Launch Capacity")]
    NoLaunchCapacity,
    #[error("May Not Fly Over Impassable or Restricted Territories")]
    AirborneOverImpassable,
    #[error("May Only Fly Over Territories Where Air May Move")]
    AirborneOverForbidden,
    #[error("Cannot Mix Land and Sea Units")]
    MixedLandAndSea,
    #[error("Cannot Move Land Units To Sea")]
    LandToSea,
    #[error("Cannot Move Sea Units To Land")]
    SeaToLand,
    #[error("Airborne May Only Attack Territories Already Under Assault")]
    NotUnderAssault,
    #[error("Battle Must Have Some Land Units Participating Already")]
    NoLandAttackers,
    #[error("Battle Must Have Some Sea Units Participating Already")]
    NoSeaAttackers,
    #[error("Destination Must Be Enemy Or Contain Enemy Units")]
    NotEnemyDestination,
}

fn territory_phrase(plural: &bool) -> &'static str {
    if *plural {
        "these territories"
    } else {
        "this territory"
    }
}

/// Why a single unit was rejected or left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reason {
    Submerged,
    Disabled,
    CannotBlitzOutOfEmptyEnemy,
    AaInCombatMove,
    NotAllCanBlitz,
    CannotInvade { unit_type: String, transport_type: String },
    FriendlyUnitsOnly,
    NotEnoughMovement,
    OwnTroopsOnly,
    CannotEndAtWater,
    SeaUnitsOnLand,
    StackingLimit(String),
    NotAllAirCanLand,
    AlliedTransportLoadedThisTurn,
    SubmarinePreventsLanding,
    UnloadBeforeCombatResolved,
    UnloadedInPreviousPhase,
    AlreadyUnloadedTo(String),
    LoadAndUnloadAfterCombat,
    CannotLoadAfterCombat,
    CannotBeTransported,
    TransportsCannotLeaveCargo,
    MustStayWithTransport,
    MovedBeforeLoading,
    NotEnoughTransports,
    MovedThenTransportParatroops,
    ParatrooperAlreadyMoved,
    ParatroopsMustAdvance,
    ParatroopsOnlyInNonCombat,
    Canal(CanalBlockage),
    OwnedUnitsOnly,
    AirborneCapacityReached,
    MustOwnAirborneForces,
    NotAirborneForces,
    AirborneDisabled,
    AirborneAlreadyMoved,
    AlreadyAirborne,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Submerged => "Cannot move submerged units",
            Reason::Disabled => "Cannot move disabled units",
            Reason::CannotBlitzOutOfEmptyEnemy => "Not all units can blitz out of empty enemy territory",
            Reason::AaInCombatMove => "Cannot move AA guns in combat movement phase",
            Reason::NotAllCanBlitz => "Not all units can blitz",
            Reason::CannotInvade {
                unit_type,
                transport_type,
            } => return write!(f, "{} can't invade from {}", unit_type, transport_type),
            Reason::FriendlyUnitsOnly => "Can only move friendly units",
            Reason::NotEnoughMovement => "Not all units have enough movement",
            Reason::OwnTroopsOnly => "Can only move own troops",
            Reason::CannotEndAtWater => "Not all units can end at water",
            Reason::SeaUnitsOnLand => "Sea units cannot go on land",
            Reason::StackingLimit(name) => return write!(f, "Unit type {} has reached stacking limit", name),
            Reason::NotAllAirCanLand => "Not all air units can land",
            Reason::AlliedTransportLoadedThisTurn => "Cannot load and unload an allied transport in the same round",
            Reason::SubmarinePreventsLanding => "Enemy Submarine Preventing Unescorted Amphibious Assault Landing",
            Reason::UnloadBeforeCombatResolved => {
                "Transport may not unload to friendly territories until after combat is resolved"
            }
            Reason::UnloadedInPreviousPhase => "Transport has already unloaded units in a previous phase",
            Reason::AlreadyUnloadedTo(name) => return write!(f, "Transport has already unloaded units to {}", name),
            Reason::LoadAndUnloadAfterCombat => "Transport cannot both load AND unload after being in combat",
            Reason::CannotLoadAfterCombat => "Transport cannot load after being in combat",
            Reason::CannotBeTransported => "Not all units can be transported",
            Reason::TransportsCannotLeaveCargo => "Transports cannot leave their units",
            Reason::MustStayWithTransport => "Unit must stay with its transport while moving",
            Reason::MovedBeforeLoading => "Units cannot move before loading onto transports",
            Reason::NotEnoughTransports => "Not enough transports",
            Reason::MovedThenTransportParatroops => "Cannot move then transport paratroops",
            Reason::ParatrooperAlreadyMoved => "Cannot paratroop units that have already moved",
            Reason::ParatroopsMustAdvance => "Paratroops must advance to battle",
            Reason::ParatroopsOnlyInNonCombat => "Paratroops may only airlift during Non-Combat Movement Phase",
            Reason::Canal(blockage) => return blockage.fmt(f),
            Reason::OwnedUnitsOnly => "Can only move owned units",
            Reason::AirborneCapacityReached => "Airborne Base Capacity Has Been Reached",
            Reason::MustOwnAirborneForces => "Must Own All Airborne Forces",
            Reason::NotAirborneForces => "Can Only Launch Airborne Forces",
            Reason::AirborneDisabled => "Must Not Be Disabled",
            Reason::AirborneAlreadyMoved => "Must Not Have Previously Moved Airborne Forces",
            Reason::AlreadyAirborne => "Cannot Move Units Already Airborne",
        };
        f.write_str(text)
    }
}

/// Whether a rejected unit is out for good or needs the player to choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    Disallowed,
    /// More information (for example which transport to use) would let
    /// the unit move.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub unit: UnitId,
    pub reason: Reason,
    pub disposition: Disposition,
}

/// What one pass found, in the order it found it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Findings {
    records: Vec<Rejection>,
    stranded: Vec<UnitId>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disallow(&mut self, reason: Reason, unit: UnitId) {
        self.records.push(Rejection {
            unit,
            reason,
            disposition: Disposition::Disallowed,
        });
    }

    pub fn disallow_all(&mut self, reason: Reason, units: impl IntoIterator<Item = UnitId>) {
        for unit in units {
            self.disallow(reason.clone(), unit);
        }
    }

    pub fn unresolve(&mut self, reason: Reason, unit: UnitId) {
        self.records.push(Rejection {
            unit,
            reason,
            disposition: Disposition::Unresolved,
        });
    }

    /// Records a unit outside the move that the move would leave unable to
    /// land.
    pub fn strand(&mut self, unit: UnitId) {
        if !self.stranded.contains(&unit) {
            self.stranded.push(unit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.stranded.is_empty()
    }

    pub fn records(&self) -> &[Rejection] {
        &self.records
    }

    pub fn stranded(&self) -> &[UnitId] {
        &self.stranded
    }

    pub fn is_disallowed(&self, unit: UnitId) -> bool {
        self.records
            .iter()
            .any(|r| r.unit == unit && r.disposition == Disposition::Disallowed)
    }

    /// Appends everything `other` found.
    pub fn merge(&mut self, other: Findings) {
        self.records.extend(other.records);
        for unit in other.stranded {
            self.strand(unit);
        }
    }
}

/// The outcome of one pass.
pub type PassResult = Result<Findings, MoveError>;

/// Overall outcome class of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictStatus {
    Clean,
    PartialReject,
    Fatal,
}

impl VerdictStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Clean => "clean",
            VerdictStatus::PartialReject => "partial",
            VerdictStatus::Fatal => "fatal",
        }
    }
}

/// Input units split by what the verdict says about them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub approved: Vec<UnitId>,
    pub disallowed: Vec<UnitId>,
    pub unresolved: Vec<UnitId>,
}

/// The accumulated result of a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    fatal: Option<MoveError>,
    findings: Findings,
}

impl Verdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn from_error(error: MoveError) -> Self {
        Verdict {
            fatal: Some(error),
            findings: Findings::default(),
        }
    }

    /// Folds a pass result in. Once a verdict is fatal it stays unchanged.
    pub fn absorb(mut self, result: PassResult) -> Self {
        if self.fatal.is_some() {
            return self;
        }
        match result {
            Ok(findings) => self.findings.merge(findings),
            Err(error) => {
                self.fatal = Some(error);
                self.findings = Findings::default();
            }
        }
        self
    }

    pub fn status(&self) -> VerdictStatus {
        if self.fatal.is_some() {
            VerdictStatus::Fatal
        } else if self.findings.is_empty() {
            VerdictStatus::Clean
        } else {
            VerdictStatus::PartialReject
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn fatal(&self) -> Option<&MoveError> {
        self.fatal.as_ref()
    }

    pub fn records(&self) -> &[Rejection] {
        self.findings.records()
    }

    /// Air units outside the move that it would strand.
    pub fn stranded(&self) -> &[UnitId] {
        self.findings.stranded()
    }

    /// Disallowed units grouped by reason, reasons in first-seen order.
    pub fn disallowed(&self) -> Vec<(&Reason, Vec<UnitId>)> {
        self.grouped(Disposition::Disallowed)
    }

    /// Unresolved units grouped by reason, reasons in first-seen order.
    pub fn unresolved(&self) -> Vec<(&Reason, Vec<UnitId>)> {
        self.grouped(Disposition::Unresolved)
    }

    fn grouped(&self, disposition: Disposition) -> Vec<(&Reason, Vec<UnitId>)> {
        let mut groups: Vec<(&Reason, Vec<UnitId>)> = Vec::new();
        for record in self.records().iter().filter(|r| r.disposition == disposition) {
            match groups.iter_mut().find(|(reason, _)| **reason == record.reason) {
                Some((_, units)) => {
                    if !units.contains(&record.unit) {
                        units.push(record.unit);
                    }
                }
                None => groups.push((&record.reason, vec![record.unit])),
            }
        }
        groups
    }

    /// Splits the input units. A fatal verdict disallows every unit; an
    /// unresolved unit that is also disallowed counts as disallowed.
    pub fn partition(&self, input: &[UnitId]) -> Partition {
        let mut partition = Partition::default();
        if self.is_fatal() {
            partition.disallowed = input.to_vec();
            return partition;
        }
        let mut disallowed = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        for record in self.records() {
            match record.disposition {
                Disposition::Disallowed => disallowed.insert(record.unit),
                Disposition::Unresolved => unresolved.insert(record.unit),
            };
        }
        for &unit in input {
            if disallowed.contains(&unit) {
                partition.disallowed.push(unit);
            } else if unresolved.contains(&unit) {
                partition.unresolved.push(unit);
            } else {
                partition.approved.push(unit);
            }
        }
        partition
    }

    pub fn approved(&self, input: &[UnitId]) -> Vec<UnitId> {
        self.partition(input).approved
    }
}
