#![allow(dead_code)]

use std::time::Duration;

use brigade_core::{
    models::{Instruction, Recipe},
    params::CreateSession,
    scheduler::SchedulerConfig,
    Dispatcher, DispatcherBuilder, MachineSpec,
};
use jiff::Timestamp;

/// Scheduler settings with a generous probe budget for loaded CI machines
pub fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        probe_timeout: Duration::from_secs(30),
        ..Default::default()
    }
}

/// Helper function to create a test dispatcher on the embedded machine
pub async fn create_test_dispatcher() -> Dispatcher {
    let spec = MachineSpec::from_json(brigade_core::machine::EMBEDDED_SPEC)
        .expect("Failed to parse embedded machine");
    DispatcherBuilder::new()
        .with_machine_spec(spec)
        .with_scheduler_config(test_config())
        .build()
        .await
        .expect("Failed to create dispatcher")
}

/// Helper function to open a session under `id`
pub async fn create_test_session(dispatcher: &Dispatcher, id: &str, recipe: Recipe) {
    dispatcher
        .create_session(&CreateSession {
            session_id: id.to_string(),
            recipe,
        })
        .await
        .expect("Failed to create session");
}

/// Chopping followed by a simmer, with cheese to grate on the side
pub fn pasta_recipe() -> Recipe {
    Recipe::new(vec![
        Instruction::new(0, "Chop onions", 60, true),
        Instruction::new(1, "Simmer sauce", 120, false).with_dependencies([0]),
        Instruction::new(2, "Grate cheese", 60, true),
    ])
    .expect("Failed to build recipe")
}

/// A two-step recipe with no room for a second chef to matter
pub fn toast_recipe() -> Recipe {
    Recipe::new(vec![
        Instruction::new(0, "Slice bread", 30, true),
        Instruction::new(1, "Toast bread", 90, false).with_dependencies([0]),
    ])
    .expect("Failed to build recipe")
}

pub fn at(seconds: i64) -> Timestamp {
    Timestamp::from_second(1_700_000_000 + seconds).expect("Failed to build timestamp")
}
