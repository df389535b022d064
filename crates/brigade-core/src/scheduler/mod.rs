//! SAT-based makespan scheduling of recipe steps onto chefs.
//!
//! A scheduling [`Problem`] (chefs, timed vertices, dependency edges) is
//! compiled for a candidate horizon into a CNF formula over boolean variables
//! `X[chef, slot, vertex]` ("chef starts vertex at slot"), solved with
//! `varisat`, and the smallest satisfiable horizon is located by binary
//! search. Feasibility is monotone in the horizon, which is what makes the
//! search sound.
//!
//! Each probe runs on its own thread under a wall-clock timeout. A probe that
//! runs out of time counts as infeasible for the search, so the reported
//! horizon is an upper bound on the optimum rather than a proof of it. The
//! timed-out worker is cancelled and exits at its next solver conflict.
//!
//! # Example
//!
//! ```rust,no_run
//! use brigade_core::scheduler::{Problem, Scheduler, SchedulerConfig, Vertex};
//!
//! let problem = Problem::new(
//!     vec!["ana".to_string()],
//!     vec![
//!         Vertex::new(0, true, 2),
//!         Vertex::new(1, true, 2),
//!         Vertex::new(2, false, 1),
//!     ],
//!     vec![(0, 1), (0, 2)],
//! )?;
//! let scheduler = Scheduler::new(SchedulerConfig {
//!     slot_seconds: 60,
//!     ..Default::default()
//! })?;
//! let schedule = scheduler.solve(&problem, 0, 10)?;
//! assert_eq!(schedule.horizon_minutes, 3);
//! assert_eq!(schedule.placement_of(0).map(|p| p.slot), Some(0));
//! # Ok::<(), brigade_core::KitchenError>(())
//! ```

mod encoding;
mod probe;
pub mod resources;
mod search;

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use jiff::SignedDuration;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use probe::ProbeOutcome;
pub use resources::{KeywordResources, NoResources, ResourceClassifier};

use crate::{
    error::{KitchenError, Result},
    models::Instruction,
};

/// Tunables for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Length of one time slot in seconds; must divide 60
    pub slot_seconds: u32,

    /// Wall-clock budget for a single satisfiability probe
    pub probe_timeout: Duration,

    /// Smallest horizon, in minutes, the search will consider
    pub lower_bound_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slot_seconds: 30,
            probe_timeout: Duration::from_secs(30),
            lower_bound_minutes: 0,
        }
    }
}

impl SchedulerConfig {
    /// Checks the slot length and timeout.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Configuration` when the slot length is zero or
    /// does not divide a minute, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.slot_seconds == 0 || 60 % self.slot_seconds != 0 {
            return Err(KitchenError::configuration(format!(
                "slot length must divide 60 seconds, got {}",
                self.slot_seconds
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(KitchenError::configuration("probe timeout must be positive"));
        }
        Ok(())
    }

    /// Number of slots in a horizon of `minutes`.
    pub fn slots_in(&self, minutes: u32) -> usize {
        (minutes as usize * 60) / self.slot_seconds as usize
    }
}

/// One instruction as the scheduler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub index: usize,
    pub attention: bool,
    /// Duration in slots; at least one
    pub duration: u32,
    pub resources: BTreeSet<String>,
}

impl Vertex {
    pub fn new(index: usize, attention: bool, duration: u32) -> Self {
        Self {
            index,
            attention,
            duration: duration.max(1),
            resources: BTreeSet::new(),
        }
    }

    pub fn with_resources(mut self, resources: BTreeSet<String>) -> Self {
        self.resources = resources;
        self
    }
}

/// Validated scheduling input.
#[derive(Debug, Clone)]
pub struct Problem {
    chefs: Vec<String>,
    vertices: Vec<Vertex>,
    edges: Vec<(usize, usize)>,
    positions: HashMap<usize, usize>,
}

impl Problem {
    /// Builds a problem; edges are `(prerequisite, dependant)` vertex indices.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Configuration` when there are no chefs or no
    /// vertices, a chef or vertex is duplicated, or an edge references a
    /// vertex outside the problem.
    pub fn new(chefs: Vec<String>, vertices: Vec<Vertex>, edges: Vec<(usize, usize)>) -> Result<Self> {
        if chefs.is_empty() {
            return Err(KitchenError::configuration("cannot schedule without chefs"));
        }
        if vertices.is_empty() {
            return Err(KitchenError::configuration("cannot schedule an empty vertex set"));
        }
        let distinct_chefs: BTreeSet<&String> = chefs.iter().collect();
        if distinct_chefs.len() != chefs.len() {
            return Err(KitchenError::configuration("duplicate chef in roster"));
        }

        let mut positions = HashMap::with_capacity(vertices.len());
        for (position, vertex) in vertices.iter().enumerate() {
            if positions.insert(vertex.index, position).is_some() {
                return Err(KitchenError::configuration(format!(
                    "duplicate vertex {}",
                    vertex.index
                )));
            }
        }
        for (from, to) in &edges {
            for end in [from, to] {
                if !positions.contains_key(end) {
                    return Err(KitchenError::configuration(format!(
                        "edge ({from}, {to}) references unknown vertex {end}"
                    )));
                }
            }
        }

        Ok(Self {
            chefs,
            vertices,
            edges,
            positions,
        })
    }

    /// Builds a problem from a subset of recipe instructions.
    ///
    /// Dependencies on instructions outside the subset are treated as already
    /// satisfied and dropped.
    pub fn from_instructions(
        chefs: Vec<String>,
        instructions: &[&Instruction],
        slot_seconds: u32,
        classifier: &dyn ResourceClassifier,
    ) -> Result<Self> {
        let included: BTreeSet<usize> = instructions.iter().map(|i| i.index).collect();
        let vertices = instructions
            .iter()
            .map(|i| {
                Vertex::new(i.index, i.attention, i.duration_slots(slot_seconds))
                    .with_resources(classifier.resources(i))
            })
            .collect();
        let edges = instructions
            .iter()
            .flat_map(|i| {
                i.dependencies
                    .iter()
                    .filter(|dep| included.contains(*dep))
                    .map(move |dep| (*dep, i.index))
            })
            .collect();
        Self::new(chefs, vertices, edges)
    }

    pub fn chefs(&self) -> &[String] {
        &self.chefs
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    fn position(&self, vertex: usize) -> Option<usize> {
        self.positions.get(&vertex).copied()
    }

    /// Total work in slots; a serial run of every vertex fits in this many.
    pub fn serial_slots(&self) -> u64 {
        self.vertices.iter().map(|v| u64::from(v.duration)).sum()
    }
}

/// A chef starting a vertex at a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub chef: String,
    pub slot: u32,
    pub vertex: usize,
}

/// A feasible assignment of every vertex to one `(chef, slot)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Smallest horizon (minutes) at which a probe succeeded
    pub horizon_minutes: u32,
    pub slot_seconds: u32,
    /// Ordered by slot, then vertex
    pub placements: Vec<Placement>,
}

impl Schedule {
    fn new(horizon_minutes: u32, slot_seconds: u32, mut placements: Vec<Placement>) -> Self {
        placements.sort_by(|a, b| (a.slot, a.vertex).cmp(&(b.slot, b.vertex)));
        Self {
            horizon_minutes,
            slot_seconds,
            placements,
        }
    }

    pub fn placement_of(&self, vertex: usize) -> Option<&Placement> {
        self.placements.iter().find(|p| p.vertex == vertex)
    }

    /// The chef's placements in execution order.
    pub fn for_chef<'a>(&'a self, chef: &'a str) -> impl Iterator<Item = &'a Placement> + 'a {
        self.placements.iter().filter(move |p| p.chef == chef)
    }

    /// Offset from the start of the schedule at which `vertex` begins.
    pub fn start_offset(&self, vertex: usize) -> Option<SignedDuration> {
        self.placement_of(vertex).map(|p| {
            SignedDuration::from_secs(i64::from(p.slot) * i64::from(self.slot_seconds))
        })
    }
}

/// Scheduler front end: configuration plus the resource classifier.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    classifier: Arc<dyn ResourceClassifier>,
    live_probes: probe::LiveProbes,
}

impl Scheduler {
    /// Creates a scheduler with no shared resources.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: Arc::new(NoResources),
            live_probes: probe::LiveProbes::default(),
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ResourceClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn ResourceClassifier {
        self.classifier.as_ref()
    }

    /// Number of solver threads started by this scheduler (or its clones)
    /// that are still running. Cancelled probes drop out shortly after their
    /// timeout.
    pub fn live_probes(&self) -> usize {
        self.live_probes.count()
    }

    /// Runs a single satisfiability probe at the given horizon.
    pub fn probe(&self, problem: &Arc<Problem>, horizon_minutes: u32) -> Result<ProbeOutcome> {
        let slots = self.config.slots_in(horizon_minutes);
        probe::run(
            Arc::clone(problem),
            slots,
            self.config.probe_timeout,
            &self.live_probes,
        )
    }

    /// Finds the smallest horizon in `[lower_bound, upper_bound)` minutes
    /// with a feasible schedule and returns that schedule.
    ///
    /// # Errors
    ///
    /// - `KitchenError::Configuration` if `lower_bound >= upper_bound`
    /// - `KitchenError::Timeout` if no probe succeeded and at least one ran
    ///   out of time
    /// - `KitchenError::Infeasible` if every probe was proven unsatisfiable
    pub fn solve(&self, problem: &Problem, lower_bound: u32, upper_bound: u32) -> Result<Schedule> {
        if lower_bound >= upper_bound {
            return Err(KitchenError::configuration(format!(
                "lower bound {lower_bound} must be below upper bound {upper_bound}"
            )));
        }

        let shared = Arc::new(problem.clone());
        let found = search::minimal_feasible(lower_bound, upper_bound, |horizon| {
            let outcome = self.probe(&shared, horizon)?;
            debug!("horizon {horizon} min: {outcome}");
            Ok(outcome)
        })?;

        match found {
            search::SearchResult::Found { bound, placements } => {
                info!(
                    "scheduled {} steps for {} chef(s) within {bound} min",
                    problem.vertices.len(),
                    problem.chefs.len()
                );
                Ok(Schedule::new(bound, self.config.slot_seconds, placements))
            }
            search::SearchResult::NotFound { timed_out: true } => Err(KitchenError::Timeout {
                per_probe: self.config.probe_timeout,
            }),
            search::SearchResult::NotFound { timed_out: false } => {
                Err(KitchenError::Infeasible { upper_bound })
            }
        }
    }

    /// Plans `instructions` onto `chefs`, deriving the horizon range from
    /// the configured lower bound and the serial length of the work.
    pub fn schedule(&self, chefs: Vec<String>, instructions: &[&Instruction]) -> Result<Schedule> {
        let problem = Problem::from_instructions(
            chefs,
            instructions,
            self.config.slot_seconds,
            self.classifier.as_ref(),
        )?;
        let (lower, upper) = self.horizon_bounds(&problem);
        self.solve(&problem, lower, upper)
    }

    /// Search range in minutes. The upper end leaves room for running every
    /// vertex back to back, so it is always feasible given at least one chef.
    pub fn horizon_bounds(&self, problem: &Problem) -> (u32, u32) {
        let serial_seconds = problem.serial_slots() * u64::from(self.config.slot_seconds);
        let serial_minutes = u32::try_from(serial_seconds.div_ceil(60)).unwrap_or(u32::MAX - 1);
        let lower = self.config.lower_bound_minutes;
        let upper = serial_minutes.saturating_add(1).max(lower.saturating_add(1));
        (lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chefs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(SchedulerConfig::default().validate().is_ok());

        let bad_slot = SchedulerConfig {
            slot_seconds: 45,
            ..Default::default()
        };
        assert!(matches!(
            bad_slot.validate(),
            Err(KitchenError::Configuration { .. })
        ));

        let zero_timeout = SchedulerConfig {
            probe_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
        assert_eq!(SchedulerConfig::default().slots_in(3), 6);
    }

    #[test]
    fn test_problem_rejects_malformed_input() {
        let no_chefs = Problem::new(vec![], vec![Vertex::new(0, true, 1)], vec![]);
        assert!(matches!(no_chefs, Err(KitchenError::Configuration { .. })));

        let no_vertices = Problem::new(chefs(&["a"]), vec![], vec![]);
        assert!(matches!(no_vertices, Err(KitchenError::Configuration { .. })));

        let dangling = Problem::new(chefs(&["a"]), vec![Vertex::new(0, true, 1)], vec![(0, 7)]);
        assert!(matches!(dangling, Err(KitchenError::Configuration { .. })));

        let duplicate = Problem::new(
            chefs(&["a"]),
            vec![Vertex::new(0, true, 1), Vertex::new(0, false, 2)],
            vec![],
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_from_instructions_drops_edges_outside_subset() {
        let b = Instruction::new(1, "Mix", 90, true).with_dependencies([0]);
        let c = Instruction::new(2, "Bake", 600, false).with_dependencies([1]);

        let problem = Problem::from_instructions(
            chefs(&["a"]),
            &[&b, &c],
            30,
            &KeywordResources::oven(),
        )
        .expect("valid problem");

        assert_eq!(problem.edges(), &[(1, 2)]);
        assert_eq!(problem.vertices()[0].duration, 3);
        assert_eq!(problem.vertices()[1].duration, 20);
        assert!(problem.vertices()[1].resources.contains("oven"));
    }

    #[test]
    fn test_solve_rejects_inverted_bounds() {
        let problem = Problem::new(chefs(&["a"]), vec![Vertex::new(0, true, 1)], vec![]).unwrap();
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        assert!(matches!(
            scheduler.solve(&problem, 5, 5),
            Err(KitchenError::Configuration { .. })
        ));
    }

    #[test]
    fn test_horizon_bounds_cover_serial_run() {
        let problem = Problem::new(
            chefs(&["a"]),
            vec![Vertex::new(0, true, 3), Vertex::new(1, false, 4)],
            vec![(0, 1)],
        )
        .unwrap();
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        // 7 slots of 30s = 210s -> 4 min, plus one
        assert_eq!(scheduler.horizon_bounds(&problem), (0, 5));
    }

    #[test]
    fn test_schedule_start_offset() {
        let schedule = Schedule::new(
            2,
            30,
            vec![
                Placement {
                    chef: "a".into(),
                    slot: 3,
                    vertex: 1,
                },
                Placement {
                    chef: "a".into(),
                    slot: 0,
                    vertex: 0,
                },
            ],
        );
        assert_eq!(schedule.placements[0].vertex, 0);
        assert_eq!(schedule.start_offset(1), Some(SignedDuration::from_secs(90)));
        assert_eq!(schedule.for_chef("a").count(), 2);
        assert!(schedule.start_offset(9).is_none());
    }
}
