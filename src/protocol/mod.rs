//! Text protocol handling.
//!
//! Line-based commands on stdin, responses on stdout: the command parser,
//! the verdict and route output format, and the JSON scenario loader the
//! `scenario` command reads.

pub mod format;
pub mod parser;
pub mod scenario;

pub use format::{format_ids, format_route, write_best_route, write_verdict};
pub use parser::{parse_command, Command, MoveRequest};
pub use scenario::Scenario;
