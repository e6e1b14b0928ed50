//! The explicit context every rule query runs in.
//!
//! A `RuleContext` bundles the snapshot, the ruleset, the moving player and
//! the per-call mode. It is cheap to copy and holds only shared borrows, so
//! many validations can run against one snapshot at once.

use crate::board::{GameState, Player, PlayerId, Relationship, Territory, TerritoryId, Unit, UnitId, UnitType};

use super::ruleset::Ruleset;

/// The movement phase a move is made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Combat,
    NonCombat,
}

/// Per-call validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValidationMode {
    pub phase: Phase,
    /// Edit mode bypasses almost every rule.
    pub edit_mode: bool,
}

impl ValidationMode {
    pub const fn combat() -> Self {
        ValidationMode {
            phase: Phase::Combat,
            edit_mode: false,
        }
    }

    pub const fn non_combat() -> Self {
        ValidationMode {
            phase: Phase::NonCombat,
            edit_mode: false,
        }
    }

    pub const fn with_edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }

    pub const fn is_combat(&self) -> bool {
        matches!(self.phase, Phase::Combat)
    }

    pub const fn is_non_combat(&self) -> bool {
        matches!(self.phase, Phase::NonCombat)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub state: &'a GameState,
    pub rules: &'a Ruleset,
    pub player: PlayerId,
    pub mode: ValidationMode,
}

impl<'a> RuleContext<'a> {
    pub fn new(state: &'a GameState, rules: &'a Ruleset, player: PlayerId, mode: ValidationMode) -> Self {
        RuleContext {
            state,
            rules,
            player,
            mode,
        }
    }

    pub fn unit(&self, id: UnitId) -> &'a Unit {
        self.state.unit(id)
    }

    pub fn ty(&self, id: UnitId) -> &'a UnitType {
        self.state.type_of(id)
    }

    pub fn territory(&self, id: TerritoryId) -> &'a Territory {
        self.state.territory(id)
    }

    pub fn mover(&self) -> &'a Player {
        self.state.player(self.player)
    }

    pub fn player_name(&self, id: Option<PlayerId>) -> &'a str {
        match id {
            Some(p) => &self.state.player(p).name,
            None => "Neutral",
        }
    }

    /// How the mover relates to `other`.
    pub fn relationship(&self, other: Option<PlayerId>) -> Relationship {
        self.state.relationships.get(self.player, other)
    }

    pub fn is_at_war_with(&self, other: Option<PlayerId>) -> bool {
        self.relationship(other).is_at_war()
    }

    pub fn is_allied_with(&self, other: Option<PlayerId>) -> bool {
        self.relationship(other).is_allied()
    }

    pub fn edit_mode(&self) -> bool {
        self.mode.edit_mode
    }
}
