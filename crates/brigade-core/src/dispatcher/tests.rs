//! Tests for the dispatcher module.

use std::time::Duration;

use jiff::Timestamp;
use tempfile::TempDir;

use super::*;
use crate::{
    error::KitchenError,
    machine::{MachineSpec, EMBEDDED_SPEC},
    models::{Instruction, Recipe},
    params::{CreateSession, Event, PlanRecipe},
    scheduler::SchedulerConfig,
};

fn config() -> SchedulerConfig {
    SchedulerConfig {
        probe_timeout: Duration::from_secs(20),
        ..Default::default()
    }
}

/// Helper function to create a test dispatcher on the embedded machine
async fn create_test_dispatcher() -> Dispatcher {
    DispatcherBuilder::new()
        .with_machine_spec(MachineSpec::from_json(EMBEDDED_SPEC).expect("Failed to parse spec"))
        .with_scheduler_config(config())
        .build()
        .await
        .expect("Failed to create dispatcher")
}

fn salad() -> Recipe {
    Recipe::new(vec![
        Instruction::new(0, "Wash lettuce", 60, true),
        Instruction::new(1, "Whisk dressing", 30, true),
        Instruction::new(2, "Toss salad", 30, true).with_dependencies([0, 1]),
    ])
    .expect("Failed to build recipe")
}

#[tokio::test]
async fn test_build_from_spec_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("machine.json");
    let custom = EMBEDDED_SPEC.replace("\"idle\"", "\"waiting\"");
    std::fs::write(&path, custom).expect("Failed to write spec");

    let dispatcher = DispatcherBuilder::new()
        .with_machine_spec_path(Some(&path))
        .build()
        .await
        .expect("Failed to create dispatcher");
    assert_eq!(dispatcher.machine().initial_state().session, "waiting");
}

#[tokio::test]
async fn test_build_rejects_missing_or_invalid_spec() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let missing = DispatcherBuilder::new()
        .with_machine_spec_path(Some(temp_dir.path().join("nope.json")))
        .build()
        .await;
    assert!(matches!(missing, Err(KitchenError::FileSystem { .. })));

    let broken = temp_dir.path().join("broken.json");
    std::fs::write(&broken, "{\"session\": 3}").expect("Failed to write spec");
    let invalid = DispatcherBuilder::new()
        .with_machine_spec_path(Some(&broken))
        .build()
        .await;
    assert!(matches!(invalid, Err(KitchenError::Configuration { .. })));

    let bad_slots = DispatcherBuilder::new()
        .with_machine_spec(MachineSpec::from_json(EMBEDDED_SPEC).unwrap())
        .with_scheduler_config(SchedulerConfig {
            slot_seconds: 7,
            ..Default::default()
        })
        .build()
        .await;
    assert!(matches!(bad_slots, Err(KitchenError::Configuration { .. })));
}

#[tokio::test]
async fn test_create_session_starts_idle() {
    let dispatcher = create_test_dispatcher().await;
    let params = CreateSession {
        session_id: "lunch".to_string(),
        recipe: salad(),
    };

    let record = dispatcher
        .create_session(&params)
        .await
        .expect("Failed to create session");
    assert_eq!(record.state.session, "idle");
    assert_eq!(record.session.chefs().count(), 0);

    assert!(matches!(
        dispatcher.create_session(&params).await,
        Err(KitchenError::Conflict { .. })
    ));
    assert_eq!(dispatcher.session_ids().await, vec!["lunch"]);

    dispatcher
        .delete_session("lunch")
        .await
        .expect("Failed to delete session");
    assert!(matches!(
        dispatcher.session("lunch").await,
        Err(KitchenError::SessionNotFound { .. })
    ));
}

#[tokio::test]
async fn test_dispatch_joins_and_advances() {
    let dispatcher = create_test_dispatcher().await;
    dispatcher
        .create_session(&CreateSession {
            session_id: "lunch".to_string(),
            recipe: salad(),
        })
        .await
        .expect("Failed to create session");

    let t0 = Timestamp::from_second(1_700_000_000).unwrap();
    let state = dispatcher
        .dispatch(&Event::new("chef_joined", "lunch").with_chef("ana").at(t0))
        .await
        .expect("Failed to dispatch join");
    assert_eq!(state.session, "cooking");
    assert_eq!(state.chef("ana"), Some("working"));

    let record = dispatcher.session("lunch").await.unwrap();
    let first = record.session.tasks_of("ana").unwrap()[0];
    assert_eq!(first.when_started, Some(t0));
    assert_eq!(record.state, state);
}

#[tokio::test]
async fn test_failed_dispatch_persists_nothing() {
    let dispatcher = create_test_dispatcher().await;
    dispatcher
        .create_session(&CreateSession {
            session_id: "lunch".to_string(),
            recipe: salad(),
        })
        .await
        .unwrap();
    dispatcher
        .dispatch(&Event::new("chef_joined", "lunch").with_chef("ana"))
        .await
        .unwrap();
    let before = dispatcher.session("lunch").await.unwrap();

    // "Toss salad" never started
    let err = dispatcher
        .dispatch(&Event::new("dismiss", "lunch").with_instruction(2))
        .await
        .unwrap_err();
    assert!(matches!(err, KitchenError::InvalidState { .. }));

    let err = dispatcher
        .dispatch(&Event::new("resume", "lunch"))
        .await
        .unwrap_err();
    assert!(matches!(err, KitchenError::InvalidState { .. }));

    let err = dispatcher
        .dispatch(&Event::new("taste", "lunch"))
        .await
        .unwrap_err();
    assert_eq!(err.kind().status_code(), 400);

    assert_eq!(dispatcher.session("lunch").await.unwrap(), before);

    let missing = dispatcher.dispatch(&Event::new("advance", "brunch")).await;
    assert!(matches!(missing, Err(KitchenError::SessionNotFound { .. })));
}

#[tokio::test]
async fn test_plan_uses_explicit_bounds() {
    let dispatcher = create_test_dispatcher().await;
    let params = PlanRecipe {
        chefs: vec!["ana".to_string(), "bo".to_string()],
        lower_bound: None,
        upper_bound: None,
    };

    let schedule = dispatcher.plan(&salad(), &params).await.expect("Failed to plan");
    assert_eq!(schedule.placements.len(), 3);
    // lettuce and dressing in parallel, then tossing: 3 slots -> 2 minutes
    assert_eq!(schedule.horizon_minutes, 2);

    let too_tight = PlanRecipe {
        upper_bound: Some(1),
        ..params
    };
    assert!(matches!(
        dispatcher.plan(&salad(), &too_tight).await,
        Err(KitchenError::Infeasible { upper_bound: 1 })
    ));
}
