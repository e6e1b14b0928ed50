//! Command parser.
//!
//! Turns raw protocol lines into [`Command`] values for the main loop.
//! Territories stay as names here; the engine resolves them against the
//! loaded scenario.

use tracing::warn;

use crate::board::UnitId;
use crate::rules::Phase;

/// A move as written on the wire, before names are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveRequest {
    /// Territory names or numeric ids, start first.
    pub route: Vec<String>,
    pub units: Vec<UnitId>,
    /// Cargo to sea transport.
    pub transports: Vec<(UnitId, UnitId)>,
    /// Air transport to the units it carries.
    pub dependents: Vec<(UnitId, Vec<UnitId>)>,
}

/// A parsed client-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol handshake; engine replies with its id and `mliok`.
    Mli,

    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Load a JSON scenario snapshot.
    Scenario { path: String },

    /// Load a TOML ruleset.
    Rules { path: String },

    /// Set the moving player by name.
    Player { name: String },

    Phase { phase: Phase },

    Edit { on: bool },

    /// Validate a normal move.
    Validate(MoveRequest),

    /// Validate an airborne launch.
    Special(MoveRequest),

    /// Ask for the preferred route between two territories.
    BestRoute {
        from: String,
        to: String,
        units: Vec<UnitId>,
        force: bool,
    },

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&head, args) = tokens.split_first()?;

    match head {
        "mli" => Some(Command::Mli),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),

        "scenario" => single_arg(head, args).map(|path| Command::Scenario { path }),
        "rules" => single_arg(head, args).map(|path| Command::Rules { path }),
        "player" => parse_player(args),
        "phase" => parse_phase(args),
        "edit" => parse_edit(args),
        "validate" => parse_move(head, args).map(Command::Validate),
        "special" => parse_move(head, args).map(Command::Special),
        "bestroute" => parse_bestroute(args),

        other => {
            warn!(command = other, "unknown command");
            None
        }
    }
}

fn single_arg(command: &str, args: &[&str]) -> Option<String> {
    match args {
        [arg] => Some((*arg).to_string()),
        _ => {
            warn!(command, "expected exactly one argument");
            None
        }
    }
}

/// Parses `player <name>`; the name may contain spaces.
fn parse_player(args: &[&str]) -> Option<Command> {
    if args.is_empty() {
        warn!("malformed player: expected 'player <name>'");
        return None;
    }
    Some(Command::Player { name: args.join(" ") })
}

fn parse_phase(args: &[&str]) -> Option<Command> {
    let phase = match args {
        ["combat"] => Phase::Combat,
        ["noncombat"] => Phase::NonCombat,
        _ => {
            warn!(?args, "malformed phase: expected 'phase combat|noncombat'");
            return None;
        }
    };
    Some(Command::Phase { phase })
}

fn parse_edit(args: &[&str]) -> Option<Command> {
    let on = match args {
        ["on"] => true,
        ["off"] => false,
        _ => {
            warn!(?args, "malformed edit: expected 'edit on|off'");
            return None;
        }
    };
    Some(Command::Edit { on })
}

/// Parses `<route> units <ids> [transports <u>:<t>,...] [dependents <t>:<u>+<u>,...]`.
fn parse_move(command: &str, args: &[&str]) -> Option<MoveRequest> {
    let Some((&route, rest)) = args.split_first() else {
        warn!(command, "missing route");
        return None;
    };
    let mut request = MoveRequest {
        route: parse_route(route),
        ..MoveRequest::default()
    };

    let mut i = 0;
    while i < rest.len() {
        let (keyword, value) = (rest[i], rest.get(i + 1).copied());
        let Some(value) = value else {
            warn!(command, keyword, "keyword without a value");
            return None;
        };
        let parsed = match keyword {
            "units" => parse_ids(value).map(|ids| request.units = ids),
            "transports" => parse_pairs(value).map(|pairs| request.transports = pairs),
            "dependents" => parse_dependents(value).map(|deps| request.dependents = deps),
            other => {
                warn!(command, keyword = other, "unknown keyword");
                None
            }
        };
        if parsed.is_none() {
            warn!(command, keyword, value, "malformed value");
            return None;
        }
        i += 2;
    }
    if request.route.iter().any(|t| t.is_empty()) {
        warn!(command, route, "malformed route");
        return None;
    }
    if request.units.is_empty() {
        warn!(command, "no units given");
    }
    Some(request)
}

/// Parses `bestroute <from> <to> units <ids> [force]`.
fn parse_bestroute(args: &[&str]) -> Option<Command> {
    let (from, to, units, force) = match args {
        [from, to, "units", ids] => (from, to, ids, false),
        [from, to, "units", ids, "force"] => (from, to, ids, true),
        _ => {
            warn!(?args, "malformed bestroute: expected 'bestroute <from> <to> units <ids> [force]'");
            return None;
        }
    };
    let Some(units) = parse_ids(units) else {
        warn!(units, "malformed unit list");
        return None;
    };
    Some(Command::BestRoute {
        from: (*from).to_string(),
        to: (*to).to_string(),
        units,
        force,
    })
}

fn parse_route(text: &str) -> Vec<String> {
    text.split('-').map(str::to_string).collect()
}

fn parse_ids(text: &str) -> Option<Vec<UnitId>> {
    text.split(',').map(|id| id.parse().ok().map(UnitId)).collect()
}

fn parse_pairs(text: &str) -> Option<Vec<(UnitId, UnitId)>> {
    text.split(',')
        .map(|pair| {
            let (cargo, transport) = pair.split_once(':')?;
            Some((UnitId(cargo.parse().ok()?), UnitId(transport.parse().ok()?)))
        })
        .collect()
}

fn parse_dependents(text: &str) -> Option<Vec<(UnitId, Vec<UnitId>)>> {
    text.split(',')
        .map(|group| {
            let (transport, cargo) = group.split_once(':')?;
            let cargo = cargo
                .split('+')
                .map(|u| u.parse().ok().map(UnitId))
                .collect::<Option<Vec<_>>>()?;
            Some((UnitId(transport.parse().ok()?), cargo))
        })
        .collect()
}
