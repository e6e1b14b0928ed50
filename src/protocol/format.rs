//! Output lines for verdicts and routes.

use std::io::{self, Write};

use crate::board::{GameMap, Route, UnitId};
use crate::validate::Verdict;

/// Writes a verdict block: the status line, one line per fatal error,
/// rejection group or stranded set, then `verdictend`.
pub fn write_verdict<W: Write>(out: &mut W, verdict: &Verdict) -> io::Result<()> {
    writeln!(out, "verdict {}", verdict.status().as_str())?;
    if let Some(error) = verdict.fatal() {
        writeln!(out, "fatal {}", error)?;
    }
    for (reason, units) in verdict.disallowed() {
        writeln!(out, "disallowed {}|{}", reason, format_ids(&units))?;
    }
    for (reason, units) in verdict.unresolved() {
        writeln!(out, "unresolved {}|{}", reason, format_ids(&units))?;
    }
    if !verdict.stranded().is_empty() {
        writeln!(out, "stranded {}", format_ids(verdict.stranded()))?;
    }
    writeln!(out, "verdictend")
}

pub fn write_best_route<W: Write>(out: &mut W, map: &GameMap, route: Option<&Route>) -> io::Result<()> {
    match route {
        Some(route) => writeln!(out, "bestroute {}", format_route(map, route)),
        None => writeln!(out, "bestroute none"),
    }
}

pub fn format_ids(units: &[UnitId]) -> String {
    units.iter().map(|u| u.0.to_string()).collect::<Vec<_>>().join(",")
}

/// Territory names joined by `-`, spaces written as `_` so the result
/// parses back as a route.
pub fn format_route(map: &GameMap, route: &Route) -> String {
    route
        .all_territories()
        .map(|t| wire_name(&map.territory(t).name))
        .collect::<Vec<_>>()
        .join("-")
}

pub fn wire_name(name: &str) -> String {
    name.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Findings, MoveError, Reason};

    fn render(verdict: &Verdict) -> String {
        let mut out = Vec::new();
        write_verdict(&mut out, verdict).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn clean_verdict_is_two_lines() {
        assert_eq!(render(&Verdict::clean()), "verdict clean\nverdictend\n");
    }

    #[test]
    fn fatal_verdict_carries_the_message() {
        let verdict = Verdict::from_error(MoveError::NoUnits);
        assert_eq!(render(&verdict), "verdict fatal\nfatal No units\nverdictend\n");
    }

    #[test]
    fn rejections_are_grouped_by_reason() {
        let mut findings = Findings::new();
        findings.disallow(Reason::NotEnoughTransports, UnitId(3));
        findings.disallow(Reason::NotEnoughTransports, UnitId(5));
        findings.unresolve(Reason::NotEnoughTransports, UnitId(4));
        findings.strand(UnitId(9));
        let verdict = Verdict::clean().absorb(Ok(findings));
        assert_eq!(
            render(&verdict),
            "verdict partial\n\
             disallowed Not enough transports|3,5\n\
             unresolved Not enough transports|4\n\
             stranded 9\n\
             verdictend\n"
        );
    }

    #[test]
    fn routes_use_wire_names() {
        let mut map = GameMap::default();
        let a = map.add_territory("West Germany", false);
        let b = map.add_territory("Holland", false);
        map.connect(a, b);
        assert_eq!(format_route(&map, &Route::new(a, vec![b])), "West_Germany-Holland");
    }
}
