//! Instruction model: one node of the recipe graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A timed cooking step with its prerequisite steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    /// Unique index, also the node id in the dependency graph
    pub index: usize,

    /// Human-readable description of the step
    pub task: String,

    /// Duration in seconds
    pub duration: u32,

    /// Whether the step needs a chef's continuous presence
    pub attention: bool,

    /// Indices of instructions that must complete before this one starts
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<usize>,
}

impl Instruction {
    pub fn new(index: usize, task: impl Into<String>, duration: u32, attention: bool) -> Self {
        Self {
            index,
            task: task.into(),
            duration,
            attention,
            dependencies: BTreeSet::new(),
        }
    }

    /// Sets the prerequisite instructions.
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = usize>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// A passive step runs in the background (chilling, baking, simmering).
    pub fn is_passive(&self) -> bool {
        !self.attention
    }

    /// Duration expressed in scheduler slots, rounded up.
    ///
    /// Zero-length steps still occupy one slot so that dependants cannot
    /// start in the same slot as their prerequisite.
    pub fn duration_slots(&self, slot_seconds: u32) -> u32 {
        self.duration.div_ceil(slot_seconds.max(1)).max(1)
    }
}
