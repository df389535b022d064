//! Command handlers for the brigade CLI
//!
//! Each handler turns parsed arguments into core parameters, calls the
//! [`Dispatcher`] and hands the markdown produced by the core display types to
//! the [`TerminalRenderer`].
//!
//! Events arrive as JSON objects without a session id; [`EventLine`] wraps
//! that shape and converts into a core [`Event`] for the session at hand.

use std::path::Path;

use anyhow::{Context, Result};
use brigade_core::{
    display::ScheduleTable,
    params::{CreateSession, Event, PlanRecipe},
    Dispatcher, Recipe, SessionRecord,
};
use jiff::Timestamp;
use log::debug;
use serde::Deserialize;

use crate::{
    args::{PlanArgs, ReplayArgs},
    renderer::TerminalRenderer,
};

/// One event as written in an event log or sent to `serve`.
#[derive(Debug, Deserialize)]
pub struct EventLine {
    pub name: String,
    #[serde(default)]
    pub chef_id: Option<String>,
    #[serde(default)]
    pub instr_idx: Option<usize>,
    /// Defaults to the time the line is read
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl EventLine {
    pub fn into_event(self, session_id: &str) -> Event {
        let mut event = Event::new(self.name, session_id);
        event.chef_id = self.chef_id;
        event.instr_idx = self.instr_idx;
        if let Some(timestamp) = self.timestamp {
            event = event.at(timestamp);
        }
        event
    }
}

/// Reads a recipe, picking the format from the file extension.
pub async fn load_recipe(path: &Path) -> Result<Recipe> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recipe {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let recipe = if is_json {
        Recipe::from_json(&text)
    } else {
        Recipe::from_delimited(&text)
    };
    recipe.with_context(|| format!("Invalid recipe {}", path.display()))
}

pub struct Cli {
    dispatcher: Dispatcher,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(dispatcher: Dispatcher, renderer: TerminalRenderer) -> Self {
        Self {
            dispatcher,
            renderer,
        }
    }

    pub async fn plan(&self, args: &PlanArgs) -> Result<()> {
        let recipe = load_recipe(&args.recipe).await?;
        let params = PlanRecipe::from(args);
        let schedule = self
            .dispatcher
            .plan(&recipe, &params)
            .await
            .context("Failed to plan recipe")?;
        self.renderer
            .render(&ScheduleTable::new(&schedule).with_recipe(&recipe).to_string())
    }

    pub async fn replay(&self, args: &ReplayArgs) -> Result<()> {
        let recipe = load_recipe(&args.recipe).await?;
        self.dispatcher
            .create_session(&CreateSession {
                session_id: args.session.clone(),
                recipe,
            })
            .await?;

        let log = tokio::fs::read_to_string(&args.events)
            .await
            .with_context(|| format!("Failed to read events {}", args.events.display()))?;

        let mut applied = 0;
        for (line_no, line) in log.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event = serde_json::from_str::<EventLine>(line)
                .with_context(|| format!("Invalid event on line {}", line_no + 1))?
                .into_event(&args.session);
            let state = self
                .dispatcher
                .dispatch(&event)
                .await
                .with_context(|| format!("Event '{}' on line {} failed", event.name, line_no + 1))?;
            debug!("line {}: {} -> {state}", line_no + 1, event.name);
            applied += 1;
        }

        let record = self.dispatcher.session(&args.session).await?;
        self.renderer.render(&board(&record, applied))
    }

    pub fn machine(&self) -> Result<()> {
        self.renderer
            .render(&self.dispatcher.machine().spec().to_string())
    }
}

fn board(record: &SessionRecord, applied: usize) -> String {
    format!(
        "{}## State\n\n{} after {applied} event(s)\n",
        record.session, record.state
    )
}
