//! Session lifecycle operations for the Dispatcher.

use tokio::task;

use super::Dispatcher;
use crate::{
    error::{KitchenError, Result},
    models::{Recipe, Session},
    params::{CreateSession, PlanRecipe},
    scheduler::{Problem, Schedule},
    store::SessionRecord,
};

impl Dispatcher {
    /// Opens a session with no chefs, in the machine's initial state.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Conflict` if the ID is already in use.
    pub async fn create_session(&self, params: &CreateSession) -> Result<SessionRecord> {
        let record = SessionRecord::new(
            Session::new(params.recipe.clone()),
            self.machine.initial_state(),
        );
        self.store.create(&params.session_id, record).await
    }

    /// Current record of a session.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::SessionNotFound` if the ID is unknown.
    pub async fn session(&self, id: &str) -> Result<SessionRecord> {
        self.store.state_of(id).await
    }

    pub async fn delete_session(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.store.ids().await
    }

    /// Schedules a whole recipe onto a roster without opening a session.
    ///
    /// Bounds missing from `params` are derived the same way re-planning
    /// derives them.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Configuration` for an empty roster or recipe,
    /// and `Infeasible` or `Timeout` when the search finds nothing.
    pub async fn plan(&self, recipe: &Recipe, params: &PlanRecipe) -> Result<Schedule> {
        let scheduler = self.scheduler.clone();
        let recipe = recipe.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let instructions: Vec<_> = recipe.iter().collect();
            let problem = Problem::from_instructions(
                params.chefs,
                &instructions,
                scheduler.config().slot_seconds,
                scheduler.classifier(),
            )?;
            let (lower, upper) = scheduler.horizon_bounds(&problem);
            scheduler.solve(
                &problem,
                params.lower_bound.unwrap_or(lower),
                params.upper_bound.unwrap_or(upper),
            )
        })
        .await
        .map_err(|e| KitchenError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}
