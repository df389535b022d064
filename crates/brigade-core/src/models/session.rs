//! Session model and the derived queries the transition functions rely on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{ChefTask, Instruction, Recipe};
use crate::error::{KitchenError, Result};

/// Immutable snapshot of a cooking session.
///
/// Each chef's task list is in planned execution order, with every started
/// entry ahead of every unstarted one. A chef exists in the session iff it is
/// a key of `chef_tasks`; iteration order over chefs is lexicographic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// The recipe being cooked; fixed once the session is created
    pub recipe: Recipe,

    /// Planned and in-progress work, per chef
    #[serde(default)]
    pub chef_tasks: BTreeMap<String, Vec<ChefTask>>,
}

impl Session {
    /// A session with a recipe and no chefs yet.
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            chef_tasks: BTreeMap::new(),
        }
    }

    pub fn chefs(&self) -> impl Iterator<Item = &str> {
        self.chef_tasks.keys().map(String::as_str)
    }

    pub fn has_chef(&self, chef: &str) -> bool {
        self.chef_tasks.contains_key(chef)
    }

    pub fn tasks_of(&self, chef: &str) -> Result<&[ChefTask]> {
        self.chef_tasks
            .get(chef)
            .map(Vec::as_slice)
            .ok_or_else(|| KitchenError::ChefNotFound {
                chef: chef.to_string(),
            })
    }

    pub fn instruction(&self, index: usize) -> Result<&Instruction> {
        self.recipe
            .get(index)
            .ok_or(KitchenError::InstructionNotFound { index })
    }

    /// Position of the first unstarted task in the chef's list, or the list
    /// length when everything has started.
    pub fn next_unstarted_task(&self, chef: &str) -> Result<usize> {
        let tasks = self.tasks_of(chef)?;
        Ok(tasks
            .iter()
            .position(|task| !task.is_started())
            .unwrap_or(tasks.len()))
    }

    /// Instructions still open for re-planning, ascending.
    ///
    /// This is every instruction in a chef's unstarted suffix, plus any
    /// recipe instruction not assigned to anyone (a fresh session, or work
    /// dropped when the last chef left).
    pub fn remaining_recipe_indices(&self) -> Vec<usize> {
        let mut assigned = BTreeSet::new();
        let mut remaining = BTreeSet::new();
        for tasks in self.chef_tasks.values() {
            let split = tasks
                .iter()
                .position(|task| !task.is_started())
                .unwrap_or(tasks.len());
            for (position, task) in tasks.iter().enumerate() {
                assigned.insert(task.instruction_index);
                if position >= split {
                    remaining.insert(task.instruction_index);
                }
            }
        }
        remaining.extend(self.recipe.indices().filter(|i| !assigned.contains(i)));
        remaining.into_iter().collect()
    }

    /// Passive tasks the chef has started and not dismissed.
    pub fn active_timers(&self, chef: &str) -> Result<Vec<&ChefTask>> {
        let mut timers = Vec::new();
        for task in self.tasks_of(chef)? {
            if task.is_running() && self.instruction(task.instruction_index)?.is_passive() {
                timers.push(task);
            }
        }
        Ok(timers)
    }

    /// Chef and list position of the task referencing `index`.
    pub fn locate(&self, index: usize) -> Option<(&str, usize)> {
        self.chef_tasks.iter().find_map(|(chef, tasks)| {
            tasks
                .iter()
                .position(|task| task.instruction_index == index)
                .map(|position| (chef.as_str(), position))
        })
    }

    /// Chef currently holding the instruction, if it is assigned.
    pub fn chef_of(&self, index: usize) -> Option<&str> {
        self.locate(index).map(|(chef, _)| chef)
    }

    pub fn task_for(&self, index: usize) -> Option<&ChefTask> {
        self.locate(index)
            .and_then(|(chef, position)| self.chef_tasks.get(chef)?.get(position))
    }

    /// True once every instruction is assigned and dismissed.
    pub fn is_complete(&self) -> bool {
        self.recipe.indices().all(|index| {
            self.task_for(index)
                .is_some_and(|task| task.when_dismissed.is_some())
        })
    }
}
