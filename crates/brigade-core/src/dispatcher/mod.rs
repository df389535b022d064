//! Event dispatch over stored sessions.
//!
//! The [`Dispatcher`] ties together the compiled [`Machine`], the
//! [`Scheduler`] and the [`SessionStore`]. Dispatching an event:
//!
//! 1. locks the session's store entry (not found if absent)
//! 2. resolves the event against the composite machine state
//! 3. runs the bound transition function on a blocking thread
//! 4. writes the new session and machine state back under the same lock
//!
//! Any failure along the way leaves the stored record untouched, and events
//! for one session are applied strictly one after another.
//!
//! ## Submodules
//!
//! - [`builder`]: configuration and construction
//! - [`event_handlers`]: event dispatch
//! - [`session_handlers`]: session lifecycle and one-off planning
//!
//! # Example
//!
//! ```rust,no_run
//! use brigade_core::{
//!     models::{Instruction, Recipe},
//!     params::{CreateSession, Event},
//!     DispatcherBuilder,
//! };
//!
//! # async fn example() -> brigade_core::Result<()> {
//! let dispatcher = DispatcherBuilder::new().build().await?;
//! let recipe = Recipe::new(vec![Instruction::new(0, "Boil pasta", 600, false)])?;
//! dispatcher
//!     .create_session(&CreateSession {
//!         session_id: "dinner".to_string(),
//!         recipe,
//!     })
//!     .await?;
//!
//! let state = dispatcher
//!     .dispatch(&Event::new("chef_joined", "dinner").with_chef("ana"))
//!     .await?;
//! assert_eq!(state.session, "cooking");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod event_handlers;
pub mod session_handlers;

#[cfg(test)]
mod tests;

pub use builder::DispatcherBuilder;

use crate::{machine::Machine, scheduler::Scheduler, store::SessionStore};

/// Owns the machine, scheduler and session store of one process.
#[derive(Debug)]
pub struct Dispatcher {
    machine: Machine,
    scheduler: Scheduler,
    store: SessionStore,
}

impl Dispatcher {
    pub(crate) fn new(machine: Machine, scheduler: Scheduler) -> Self {
        Self {
            machine,
            scheduler,
            store: SessionStore::new(),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
