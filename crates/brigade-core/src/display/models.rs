//! Display implementations for domain models.
//!
//! All output is markdown so the CLI can hand it straight to the terminal
//! renderer.

use std::fmt;

use jiff::SignedDuration;

use super::datetime::{ClockOffset, LocalDateTime};
use crate::models::{ChefTask, Instruction, Session, TaskStatus};

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.attention { "attention" } else { "passive" };
        write!(
            f,
            "{}. {} ({}, {mode})",
            self.index,
            self.task,
            ClockOffset(SignedDuration::from_secs(i64::from(self.duration)))
        )?;
        if !self.dependencies.is_empty() {
            let deps: Vec<String> = self.dependencies.iter().map(usize::to_string).collect();
            write!(f, " after {}", deps.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for ChefTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.instruction_index, self.status().with_icon())
    }
}

impl Session {
    fn fmt_task(&self, f: &mut fmt::Formatter<'_>, task: &ChefTask) -> fmt::Result {
        match self.recipe.get(task.instruction_index) {
            Some(instruction) => write!(f, "- {} {instruction}", task.status().with_icon())?,
            None => write!(f, "- {task}")?,
        }
        if let Some(started) = &task.when_started {
            write!(f, ", started {}", LocalDateTime(started))?;
        }
        if let Some(dismissed) = &task.when_dismissed {
            write!(f, ", dismissed {}", LocalDateTime(dismissed))?;
        }
        writeln!(f)
    }
}

/// Markdown board: one section per chef listing their tasks in order, then
/// any recipe steps nobody holds.
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.recipe.len();
        let dismissed = self
            .chef_tasks
            .values()
            .flatten()
            .filter(|task| task.status() == TaskStatus::Dismissed)
            .count();
        writeln!(f, "# Kitchen ({dismissed}/{total} done)")?;
        writeln!(f)?;

        if self.chef_tasks.is_empty() {
            writeln!(f, "No chefs in this session.")?;
        }
        for (chef, tasks) in &self.chef_tasks {
            writeln!(f, "## {chef}")?;
            writeln!(f)?;
            if tasks.is_empty() {
                writeln!(f, "Nothing assigned.")?;
            }
            for task in tasks {
                self.fmt_task(f, task)?;
            }
            writeln!(f)?;
        }

        let unassigned: Vec<&Instruction> = self
            .recipe
            .iter()
            .filter(|instruction| self.locate(instruction.index).is_none())
            .collect();
        if !unassigned.is_empty() {
            writeln!(f, "## Unassigned")?;
            writeln!(f)?;
            for instruction in unassigned {
                writeln!(f, "- {}", instruction)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
