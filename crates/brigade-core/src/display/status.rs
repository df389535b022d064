//! Display for machine state and specifications.

use std::fmt;

use crate::machine::{Action, Guard, MachineSpec, MachineState, ScopeSpec};

/// `cooking` or `cooking (ana: working, bo: working)`.
impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.session)?;
        if !self.chefs.is_empty() {
            let chefs: Vec<String> = self
                .chefs
                .iter()
                .map(|(chef, state)| format!("{chef}: {state}"))
                .collect();
            write!(f, " ({})", chefs.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn fmt_scope(f: &mut fmt::Formatter<'_>, title: &str, scope: &ScopeSpec) -> fmt::Result {
    writeln!(f, "## {title}")?;
    writeln!(f)?;
    writeln!(f, "- Initial: {}", scope.initial)?;
    writeln!(f, "- States: {}", scope.states.join(", "))?;
    writeln!(f)?;
    if scope.transitions.is_empty() {
        writeln!(f, "No transitions.")?;
        return writeln!(f);
    }
    writeln!(f, "| Event | From | To | Action | Guard |")?;
    writeln!(f, "|---|---|---|---|---|")?;
    for t in &scope.transitions {
        let guard = t.guard.map(Guard::as_str).unwrap_or_default();
        writeln!(
            f,
            "| {} | {} | {} | {} | {guard} |",
            t.trigger,
            t.source.join(", "),
            t.dest,
            t.action
        )?;
    }
    writeln!(f)
}

/// Markdown overview of both machines.
impl fmt::Display for MachineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Machine")?;
        writeln!(f)?;
        fmt_scope(f, "Session", &self.session)?;
        fmt_scope(f, "Chef", &self.chef)
    }
}
