mod common;

use std::{
    collections::BTreeMap,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use brigade_core::{
    models::Instruction,
    scheduler::{
        KeywordResources, ProbeOutcome, Problem, Schedule, Scheduler, SchedulerConfig, Vertex,
    },
    KitchenError,
};
use common::test_config;

fn minute_slots() -> Scheduler {
    Scheduler::new(SchedulerConfig {
        slot_seconds: 60,
        ..test_config()
    })
    .expect("Failed to create scheduler")
}

fn chefs(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Checks every constraint the encoder promises against a decoded schedule.
fn assert_schedule_sound(problem: &Problem, schedule: &Schedule) {
    let slots = schedule.placements.len();
    assert_eq!(slots, problem.vertices().len(), "each vertex placed once");

    let starts: BTreeMap<usize, (&str, u32)> = schedule
        .placements
        .iter()
        .map(|p| (p.vertex, (p.chef.as_str(), p.slot)))
        .collect();
    assert_eq!(starts.len(), slots, "no vertex placed twice");

    let vertex = |index: usize| {
        problem
            .vertices()
            .iter()
            .find(|v| v.index == index)
            .expect("Failed to find vertex")
    };
    let window = |index: usize| {
        let start = starts[&index].1;
        start..start + vertex(index).duration
    };

    for (from, to) in problem.edges() {
        assert!(
            starts[to].1 >= window(*from).end,
            "{to} starts before {from} ends"
        );
    }

    for a in problem.vertices() {
        for b in problem.vertices() {
            if a.index >= b.index {
                continue;
            }
            let (wa, wb) = (window(a.index), window(b.index));
            let overlap = wa.start < wb.end && wb.start < wa.end;
            if a.attention && b.attention && starts[&a.index].0 == starts[&b.index].0 {
                assert!(!overlap, "chef runs {} and {} at once", a.index, b.index);
            }
            if !a.resources.is_disjoint(&b.resources) {
                assert!(!overlap, "{} and {} share a resource", a.index, b.index);
            }
        }
    }
}

#[test]
fn test_single_chef_chain() {
    let problem = Problem::new(
        chefs(&["ana"]),
        vec![
            Vertex::new(0, true, 2),
            Vertex::new(1, true, 2),
            Vertex::new(2, false, 1),
        ],
        vec![(0, 1), (0, 2)],
    )
    .expect("Failed to build problem");

    let schedule = minute_slots()
        .solve(&problem, 0, 10)
        .expect("Failed to solve");

    assert_eq!(schedule.horizon_minutes, 3);
    assert_eq!(schedule.placement_of(0).unwrap().slot, 0);
    assert!(schedule.placement_of(1).unwrap().slot >= 2);
    assert!(schedule.placement_of(2).unwrap().slot >= 2);
    assert!(schedule.placements.iter().all(|p| p.chef == "ana"));
    assert_schedule_sound(&problem, &schedule);
}

#[test]
fn test_second_chef_shortens_horizon() {
    let vertices = vec![
        Vertex::new(0, true, 2),
        Vertex::new(1, true, 2),
        Vertex::new(2, true, 2),
        Vertex::new(3, false, 3),
    ];
    let edges = vec![(0, 3)];
    let scheduler = minute_slots();

    let solo = Problem::new(chefs(&["ana"]), vertices.clone(), edges.clone()).unwrap();
    let pair = Problem::new(chefs(&["ana", "bo"]), vertices, edges).unwrap();

    let solo_schedule = scheduler.solve(&solo, 0, 12).expect("Failed to solve solo");
    let pair_schedule = scheduler.solve(&pair, 0, 12).expect("Failed to solve pair");

    // three attention blocks back to back, the last starting at slot 4
    assert_eq!(solo_schedule.horizon_minutes, 5);
    assert!(pair_schedule.horizon_minutes < solo_schedule.horizon_minutes);
    assert_schedule_sound(&solo, &solo_schedule);
    assert_schedule_sound(&pair, &pair_schedule);
}

#[test]
fn test_feasibility_is_monotone_in_horizon() {
    let problem = Arc::new(
        Problem::new(
            chefs(&["ana", "bo"]),
            vec![
                Vertex::new(0, true, 3),
                Vertex::new(1, true, 1),
                Vertex::new(2, false, 2),
                Vertex::new(3, true, 2),
            ],
            vec![(0, 2), (1, 3)],
        )
        .unwrap(),
    );
    let scheduler = minute_slots();
    let optimum = scheduler
        .solve(&problem, 0, 12)
        .expect("Failed to solve")
        .horizon_minutes;

    for horizon in 0..optimum {
        let outcome = scheduler.probe(&problem, horizon).expect("Failed to probe");
        assert!(!outcome.is_satisfiable(), "{horizon} min should be infeasible");
    }
    for horizon in optimum..optimum + 3 {
        let outcome = scheduler.probe(&problem, horizon).expect("Failed to probe");
        assert!(outcome.is_satisfiable(), "{horizon} min should be feasible");
    }
}

#[test]
fn test_shared_oven_serializes_baking() {
    let cookies = Instruction::new(0, "Bake cookies", 120, false);
    let bread = Instruction::new(1, "Bake bread", 120, false);
    let roster = chefs(&["ana", "bo"]);

    let free = Scheduler::new(test_config()).unwrap();
    let schedule = free
        .schedule(roster.clone(), &[&cookies, &bread])
        .expect("Failed to schedule");
    assert_eq!(schedule.horizon_minutes, 1);

    let shared = Scheduler::new(test_config())
        .unwrap()
        .with_classifier(Arc::new(KeywordResources::oven()));
    let schedule = shared
        .schedule(roster.clone(), &[&cookies, &bread])
        .expect("Failed to schedule");
    // four slots of baking, then the second tray starts at slot 4
    assert_eq!(schedule.horizon_minutes, 3);

    let problem = Problem::from_instructions(roster, &[&cookies, &bread], 30, shared.classifier())
        .expect("Failed to build problem");
    assert_schedule_sound(&problem, &schedule);
}

#[test]
fn test_exhausted_range_is_infeasible() {
    let problem = Problem::new(
        chefs(&["ana"]),
        vec![Vertex::new(0, true, 2), Vertex::new(1, true, 2)],
        vec![(0, 1)],
    )
    .unwrap();

    let result = minute_slots().solve(&problem, 0, 2);
    assert!(matches!(result, Err(KitchenError::Infeasible { upper_bound: 2 })));
}

#[test]
fn test_timed_out_solver_thread_exits() {
    // Fourteen one-slot attention steps cannot share thirteen slots, and
    // proving that is far beyond the budget.
    let problem = Arc::new(
        Problem::new(
            chefs(&["ana"]),
            (0..14).map(|i| Vertex::new(i, true, 1)).collect(),
            vec![],
        )
        .unwrap(),
    );
    let scheduler = Scheduler::new(SchedulerConfig {
        slot_seconds: 60,
        probe_timeout: Duration::from_millis(100),
        ..Default::default()
    })
    .unwrap();

    let started = Instant::now();
    let outcome = scheduler.probe(&problem, 13).unwrap();
    assert_eq!(outcome, ProbeOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(5));

    let deadline = Instant::now() + Duration::from_secs(10);
    while scheduler.live_probes() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(scheduler.live_probes(), 0, "solver thread outlived its probe");

    let result = scheduler.solve(&problem, 13, 14);
    assert!(matches!(result, Err(KitchenError::Timeout { .. })));
}
