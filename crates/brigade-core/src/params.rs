//! Parameter structures shared by every transport.
//!
//! These carry only serde derives so that the CLI (and any future HTTP or
//! WebSocket front end) can wrap or deserialize them without pulling its own
//! framework into the core. Transports convert their argument types into
//! these with `From` impls.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::models::Recipe;

/// An inbound event for one session.
///
/// `name` must match a trigger declared by the machine specification. A
/// missing `timestamp` is filled with the time of deserialization.
///
/// ```rust
/// use brigade_core::params::Event;
///
/// let event: Event = serde_json::from_str(
///     r#"{"name": "dismiss", "session_id": "s1", "instr_idx": 3}"#,
/// )?;
/// assert_eq!(event.instr_idx, Some(3));
/// assert!(event.chef_id.is_none());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Trigger name
    pub name: String,

    /// Session the event applies to
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instr_idx: Option<usize>,

    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,
}

impl Event {
    /// An event stamped with the current time.
    pub fn new(name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session_id: session_id.into(),
            chef_id: None,
            instr_idx: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn with_chef(mut self, chef: impl Into<String>) -> Self {
        self.chef_id = Some(chef.into());
        self
    }

    pub fn with_instruction(mut self, index: usize) -> Self {
        self.instr_idx = Some(index);
        self
    }

    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Parameters for opening a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Identifier the session is stored under
    pub session_id: String,
    /// Recipe to cook; fixed for the session's lifetime
    pub recipe: Recipe,
}

/// Parameters for a one-off scheduling run outside any session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRecipe {
    /// Roster to plan onto
    pub chefs: Vec<String>,
    /// Smallest horizon in minutes; the configured lower bound if absent
    #[serde(default)]
    pub lower_bound: Option<u32>,
    /// Exclusive largest horizon in minutes; derived from the recipe if absent
    #[serde(default)]
    pub upper_bound: Option<u32>,
}
