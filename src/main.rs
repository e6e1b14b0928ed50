//! Landfall -- a move legality engine speaking a line-based text protocol.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Logging goes to stderr, filtered by `RUST_LOG`.

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use landfall::engine::{write_error, Engine};
use landfall::protocol::parser::{parse_command, Command};

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::Mli => engine.handle_mli(&mut out)?,
            Command::IsReady => engine.handle_isready(&mut out)?,
            Command::Scenario { path } => {
                if let Err(e) = engine.load_scenario(&path) {
                    write_error(&mut out, &e)?;
                }
            }
            Command::Rules { path } => {
                if let Err(e) = engine.load_rules(&path) {
                    write_error(&mut out, &e)?;
                }
            }
            Command::Player { name } => {
                if let Err(e) = engine.set_player(&name) {
                    write_error(&mut out, &e)?;
                }
            }
            Command::Phase { phase } => engine.set_phase(phase),
            Command::Edit { on } => engine.set_edit_mode(on),
            Command::Validate(request) => engine.handle_validate(&mut out, &request, false)?,
            Command::Special(request) => engine.handle_validate(&mut out, &request, true)?,
            Command::BestRoute { from, to, units, force } => {
                engine.handle_bestroute(&mut out, &from, &to, &units, force)?;
            }
            Command::Quit => break,
        }
    }
    out.flush()
}
