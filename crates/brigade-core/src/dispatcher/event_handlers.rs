//! Event dispatch for the Dispatcher.

use log::{debug, info};
use tokio::task;

use super::Dispatcher;
use crate::{
    error::{KitchenError, Result},
    machine::{Action, MachineState},
    params::Event,
    store::SessionRecord,
};

impl Dispatcher {
    /// Applies an event and returns the new machine state.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session does not exist
    /// - `InvalidInput` for an unknown event or missing chef/instruction
    /// - `InvalidState` if the event is not valid in the current state
    /// - whatever the bound transition function or the scheduler reports
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use brigade_core::{params::Event, DispatcherBuilder};
    /// # async {
    /// let dispatcher = DispatcherBuilder::new().build().await?;
    /// let state = dispatcher
    ///     .dispatch(&Event::new("advance", "dinner").with_chef("ana"))
    ///     .await?;
    /// println!("{state}");
    /// # Result::<(), brigade_core::KitchenError>::Ok(())
    /// # };
    /// ```
    pub async fn dispatch(&self, event: &Event) -> Result<MachineState> {
        self.dispatch_with_session(event)
            .await
            .map(|record| record.state)
    }

    /// Like [`dispatch`](Self::dispatch) but returns the whole updated record.
    pub async fn dispatch_with_session(&self, event: &Event) -> Result<SessionRecord> {
        debug!(
            "dispatching '{}' to session '{}' (chef: {:?}, instruction: {:?})",
            event.name, event.session_id, event.chef_id, event.instr_idx
        );

        let mut record = self.store.lock(&event.session_id).await?;
        let step = self.machine.resolve(
            &record.state,
            &event.name,
            event.chef_id.as_deref(),
            &record.session,
        )?;

        let session = match step.action {
            Action::None => record.session.clone(),
            action => {
                let current = record.session.clone();
                let scheduler = self.scheduler.clone();
                let event = event.clone();
                task::spawn_blocking(move || action.apply(&current, &event, &scheduler))
                    .await
                    .map_err(|e| KitchenError::Configuration {
                        message: format!("Task join error: {e}"),
                    })??
            }
        };

        if record.state != step.next {
            info!(
                "session '{}': {} -> {}",
                event.session_id, record.state, step.next
            );
        }
        *record = SessionRecord::new(session, step.next);
        Ok(record.clone())
    }
}
