//! Core library for the Brigade kitchen coordinator.
//!
//! Brigade assigns the steps of a recipe to a changing group of chefs and
//! tracks their progress while they cook. It has two halves:
//!
//! - a SAT-based [`scheduler`] that places every open step on a
//!   `(chef, start slot)` pair while respecting dependencies, attention
//!   exclusivity and shared resources, and binary-searches the shortest
//!   horizon that admits such a plan
//! - a session engine: the immutable [`models::Session`] value, the pure
//!   [`transitions`] that rewrite it (re-planning through the scheduler when
//!   the roster or progress changes), and a [`Dispatcher`] that drives those
//!   transitions from named events through a declarative [`machine`]
//!
//! Sessions live in an in-memory [`store::SessionStore`] with one lock per
//! session, so events for a session are applied one at a time while
//! different sessions proceed independently.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use brigade_core::{
//!     models::Recipe,
//!     params::{CreateSession, Event},
//!     DispatcherBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = DispatcherBuilder::new().build().await?;
//!
//! let recipe = Recipe::from_delimited(
//!     "0;Chop onions;120;\n1;Simmer sauce;900;0\n2;Grate cheese;60;\n",
//! )?;
//! dispatcher
//!     .create_session(&CreateSession {
//!         session_id: "dinner".to_string(),
//!         recipe,
//!     })
//!     .await?;
//!
//! dispatcher
//!     .dispatch(&Event::new("chef_joined", "dinner").with_chef("ana"))
//!     .await?;
//! let record = dispatcher
//!     .dispatch_with_session(&Event::new("chef_joined", "dinner").with_chef("bo"))
//!     .await?;
//! println!("{}\n{}", record.state, record.session);
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod display;
pub mod error;
pub mod machine;
pub mod models;
pub mod params;
pub mod scheduler;
pub mod store;
pub mod transitions;

// Re-export commonly used types
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use display::{ClockOffset, LocalDateTime, ScheduleTable};
pub use error::{ErrorKind, KitchenError, Result};
pub use machine::{Action, Guard, Machine, MachineSpec, MachineState};
pub use models::{ChefTask, Instruction, Recipe, Session, TaskStatus};
pub use params::{CreateSession, Event, PlanRecipe};
pub use scheduler::{
    KeywordResources, NoResources, Placement, Problem, ResourceClassifier, Schedule, Scheduler,
    SchedulerConfig,
};
pub use store::{SessionRecord, SessionStore};
