//! Chef task model: one chef's progress on one assigned instruction.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Progress record for an instruction assigned to a chef.
///
/// Values are never mutated in place; every transition builds a new task
/// with updated timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChefTask {
    /// Index of the referenced instruction
    pub instruction_index: usize,

    /// When the chef began the step; `None` while only planned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_started: Option<Timestamp>,

    /// When the chef finished or acknowledged the step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_dismissed: Option<Timestamp>,
}

/// Derived lifecycle status of a [`ChefTask`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Assigned by the scheduler, not yet begun
    Planned,

    /// Started and not yet dismissed
    Running,

    /// Finished or acknowledged
    Dismissed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::Running => "running",
            TaskStatus::Dismissed => "dismissed",
        }
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use brigade_core::models::TaskStatus;
    ///
    /// assert_eq!(TaskStatus::Dismissed.with_icon(), "✓ Dismissed");
    /// assert_eq!(TaskStatus::Running.with_icon(), "➤ Running");
    /// assert_eq!(TaskStatus::Planned.with_icon(), "○ Planned");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            TaskStatus::Dismissed => "✓ Dismissed",
            TaskStatus::Running => "➤ Running",
            TaskStatus::Planned => "○ Planned",
        }
    }
}

impl ChefTask {
    /// A freshly planned, unstarted task.
    pub fn planned(instruction_index: usize) -> Self {
        Self {
            instruction_index,
            when_started: None,
            when_dismissed: None,
        }
    }

    /// Copy of this task started at `now`, with any dismissal cleared.
    pub fn started_at(self, now: Timestamp) -> Self {
        Self {
            when_started: Some(now),
            when_dismissed: None,
            ..self
        }
    }

    /// Copy of this task dismissed at `now`.
    pub fn dismissed_at(self, now: Timestamp) -> Self {
        Self {
            when_dismissed: Some(now),
            ..self
        }
    }

    /// Copy of this task reverted to the planned state.
    pub fn reset(self) -> Self {
        Self::planned(self.instruction_index)
    }

    pub fn is_started(&self) -> bool {
        self.when_started.is_some()
    }

    /// Started and not yet dismissed.
    pub fn is_running(&self) -> bool {
        self.when_started.is_some() && self.when_dismissed.is_none()
    }

    pub fn status(&self) -> TaskStatus {
        match (self.when_started, self.when_dismissed) {
            (None, _) => TaskStatus::Planned,
            (Some(_), None) => TaskStatus::Running,
            (Some(_), Some(_)) => TaskStatus::Dismissed,
        }
    }
}
