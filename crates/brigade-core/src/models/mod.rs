//! Data models for recipes, chef tasks and sessions.
//!
//! This module contains the core domain models of a cooking session: the
//! recipe graph produced by an external parser, the per-chef progress records
//! and the immutable [`Session`] snapshot that the transition functions in
//! [`crate::transitions`] rewrite. Display implementations for these models
//! live in [`crate::display`].
//!
//! # Examples
//!
//! ```rust
//! use brigade_core::models::{ChefTask, Instruction, Recipe, Session};
//!
//! let recipe = Recipe::new(vec![
//!     Instruction::new(0, "Shred mozzarella", 60, true),
//!     Instruction::new(1, "Chill dough", 1800, false).with_dependencies([0]),
//! ])?;
//! let mut session = Session::new(recipe);
//! session
//!     .chef_tasks
//!     .insert("ana".to_string(), vec![ChefTask::planned(0), ChefTask::planned(1)]);
//!
//! assert_eq!(session.next_unstarted_task("ana")?, 0);
//! assert_eq!(session.remaining_recipe_indices(), vec![0, 1]);
//! # Ok::<(), brigade_core::KitchenError>(())
//! ```

pub mod chef_task;
pub mod instruction;
pub mod recipe;
pub mod session;


pub use chef_task::{ChefTask, TaskStatus};
pub use instruction::Instruction;
pub use recipe::Recipe;
pub use session::Session;
