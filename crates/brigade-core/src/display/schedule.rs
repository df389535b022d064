//! Tabular rendering of a computed schedule.

use std::fmt;

use super::datetime::ClockOffset;
use crate::{models::Recipe, scheduler::Schedule};

/// Wrapper that renders a [`Schedule`] as a markdown table ordered by start
/// time, optionally naming each step from its recipe.
///
/// # Examples
///
/// ```rust
/// use brigade_core::display::ScheduleTable;
/// use brigade_core::models::{Instruction, Recipe};
/// use brigade_core::scheduler::{Scheduler, SchedulerConfig};
///
/// let recipe = Recipe::new(vec![Instruction::new(0, "Knead dough", 120, true)])?;
/// let scheduler = Scheduler::new(SchedulerConfig::default())?;
/// let schedule = scheduler.schedule(vec!["ana".into()], &[recipe.get(0).unwrap()])?;
///
/// let table = ScheduleTable::new(&schedule).with_recipe(&recipe);
/// assert!(table.to_string().contains("| 00:00 | ana | 0. Knead dough"));
/// # Ok::<(), brigade_core::KitchenError>(())
/// ```
pub struct ScheduleTable<'a> {
    schedule: &'a Schedule,
    recipe: Option<&'a Recipe>,
}

impl<'a> ScheduleTable<'a> {
    pub fn new(schedule: &'a Schedule) -> Self {
        Self {
            schedule,
            recipe: None,
        }
    }

    /// Label rows with instruction text instead of bare indices.
    pub fn with_recipe(mut self, recipe: &'a Recipe) -> Self {
        self.recipe = Some(recipe);
        self
    }
}

impl<'a> fmt::Display for ScheduleTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Schedule ({} min, {}s slots)",
            self.schedule.horizon_minutes, self.schedule.slot_seconds
        )?;
        writeln!(f)?;

        if self.schedule.placements.is_empty() {
            writeln!(f, "Nothing to schedule.")?;
            return Ok(());
        }

        writeln!(f, "| Start | Chef | Step |")?;
        writeln!(f, "|---|---|---|")?;
        for placement in &self.schedule.placements {
            let start = self
                .schedule
                .start_offset(placement.vertex)
                .map(|offset| ClockOffset(offset).to_string())
                .unwrap_or_default();
            match self.recipe.and_then(|r| r.get(placement.vertex)) {
                Some(instruction) => writeln!(
                    f,
                    "| {start} | {} | {instruction} |",
                    placement.chef
                )?,
                None => writeln!(f, "| {start} | {} | {} |", placement.chef, placement.vertex)?,
            }
        }
        Ok(())
    }
}
