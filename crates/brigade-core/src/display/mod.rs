//! Display implementations and wrapper types.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]
//! and [`status`]); wrappers in this module cover output that needs extra
//! context, such as a schedule rendered against its recipe. Everything is
//! markdown so the CLI can pass it to its terminal renderer unchanged.
//!
//! ## Module Organization
//!
//! - [`datetime`]: timestamp and offset formatting
//! - [`models`]: recipes, tasks and the session board
//! - [`schedule`]: schedule tables
//! - [`status`]: machine state and specification
//!
//! ```rust
//! use brigade_core::models::{ChefTask, Instruction, Recipe, Session};
//!
//! let recipe = Recipe::new(vec![Instruction::new(0, "Whisk eggs", 45, true)])?;
//! let mut session = Session::new(recipe);
//! session.chef_tasks.insert("ana".into(), vec![ChefTask::planned(0)]);
//!
//! let board = session.to_string();
//! assert!(board.contains("## ana"));
//! assert!(board.contains("○ Planned 0. Whisk eggs (00:45, attention)"));
//! # Ok::<(), brigade_core::KitchenError>(())
//! ```

pub mod datetime;
pub mod models;
pub mod schedule;
pub mod status;

pub use datetime::{ClockOffset, LocalDateTime};
pub use schedule::ScheduleTable;
