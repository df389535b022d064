//! Declarative session and chef state machines.
//!
//! A [`MachineSpec`] is loaded from JSON and compiled into a [`Machine`]: one
//! transition table per [`Scope`], keyed by trigger and source state. Actions
//! and guards are closed enums, so a misspelled name fails when the
//! specification is loaded rather than when an event arrives.
//!
//! The discrete state of one session is a single [`MachineState`] value
//! holding the session-level state plus the state of every chef that has
//! left the initial chef state.
//!
//! # Example
//!
//! ```rust
//! use brigade_core::machine::{Action, Machine};
//! use brigade_core::models::Session;
//!
//! let machine = Machine::embedded()?;
//! let state = machine.initial_state();
//! assert_eq!(state.session, "idle");
//!
//! let step = machine.resolve(&state, "chef_joined", Some("ana"), &Session::default())?;
//! assert_eq!(step.action, Action::NewChefJoined);
//! assert_eq!(step.next.session, "cooking");
//! assert_eq!(step.next.chef("ana"), Some("working"));
//! # Ok::<(), brigade_core::KitchenError>(())
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{KitchenError, Result, ResultExt},
    models::Session,
    params::Event,
    scheduler::Scheduler,
    transitions,
};

/// The machine shipped with the crate.
pub const EMBEDDED_SPEC: &str = include_str!("../assets/machine.json");

/// Which of the two machines a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Session,
    Chef,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Session => write!(f, "session"),
            Scope::Chef => write!(f, "chef"),
        }
    }
}

/// Transition function run when a transition fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NewChefJoined,
    ChefLeave,
    AdvanceTask,
    DismissTimer,
    ResetTask,
    StartTimer,
    FinishTask,
    UndoTimer,
    Recompile,
    /// State change only
    #[default]
    None,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::NewChefJoined => "new_chef_joined",
            Action::ChefLeave => "chef_leave",
            Action::AdvanceTask => "advance_task",
            Action::DismissTimer => "dismiss_timer",
            Action::ResetTask => "reset_task",
            Action::StartTimer => "start_timer",
            Action::FinishTask => "finish_task",
            Action::UndoTimer => "undo_timer",
            Action::Recompile => "recompile",
            Action::None => "none",
        }
    }

    /// Runs the bound transition function against `session`.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::InvalidInput` when the event lacks the chef or
    /// instruction the action needs, and otherwise whatever the transition
    /// function reports.
    pub fn apply(self, session: &Session, event: &Event, scheduler: &Scheduler) -> Result<Session> {
        let now = event.timestamp;
        let chef = || {
            event.chef_id.as_deref().ok_or_else(|| {
                KitchenError::invalid_input("chef_id")
                    .with_reason(format!("event '{}' requires a chef", event.name))
            })
        };
        let instruction = || {
            event.instr_idx.ok_or_else(|| {
                KitchenError::invalid_input("instr_idx")
                    .with_reason(format!("event '{}' requires an instruction", event.name))
            })
        };

        match self {
            Action::NewChefJoined => transitions::new_chef_joined(session, chef()?, now, scheduler),
            Action::ChefLeave => transitions::chef_leave(session, chef()?, scheduler),
            Action::AdvanceTask => transitions::advance_task_for_chef(session, chef()?, now),
            Action::DismissTimer => transitions::dismiss_timer(session, instruction()?, now),
            Action::ResetTask => transitions::reset_active_task(session, instruction()?),
            Action::StartTimer => transitions::start_low_attention_task(session, chef()?, now),
            Action::FinishTask => transitions::finish_attention_task(session, chef()?, now),
            Action::UndoTimer => transitions::undo_timer_pressed(session, chef()?, now),
            Action::Recompile => transitions::recompile_session(session, scheduler),
            Action::None => Ok(session.clone()),
        }
    }
}

/// Condition on the pre-action session that must hold for a transition to
/// fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Someone other than the event's chef is in the kitchen
    HasOtherChefs,
    /// Nobody other than the event's chef is in the kitchen
    IsLastChef,
    /// Every instruction is assigned and dismissed
    AllDismissed,
}

impl Guard {
    pub fn as_str(self) -> &'static str {
        match self {
            Guard::HasOtherChefs => "has_other_chefs",
            Guard::IsLastChef => "is_last_chef",
            Guard::AllDismissed => "all_dismissed",
        }
    }

    pub fn allows(self, session: &Session, chef: Option<&str>) -> bool {
        let others = || session.chefs().any(|c| Some(c) != chef);
        match self {
            Guard::HasOtherChefs => others(),
            Guard::IsLastChef => !others(),
            Guard::AllDismissed => session.is_complete(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub trigger: String,
    pub source: Vec<String>,
    pub dest: String,
    #[serde(default, skip_serializing_if = "is_none_action")]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
}

fn is_none_action(action: &Action) -> bool {
    *action == Action::None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    pub initial: String,
    pub states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

/// The declarative document both machines are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub session: ScopeSpec,
    pub chef: ScopeSpec,
}

impl MachineSpec {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context("invalid machine specification")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| KitchenError::FileSystem {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }
}

/// Composite discrete state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub session: String,

    /// Chefs not in the initial chef state
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chefs: BTreeMap<String, String>,
}

impl MachineState {
    pub fn chef(&self, chef: &str) -> Option<&str> {
        self.chefs.get(chef).map(String::as_str)
    }
}

/// A resolved event: what to run and where the machines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub action: Action,
    pub next: MachineState,
}

#[derive(Debug, Clone)]
struct Rule {
    dest: String,
    action: Action,
    guard: Option<Guard>,
}

#[derive(Debug, Clone)]
struct ScopeTable {
    scope: Scope,
    initial: String,
    /// trigger -> source state -> candidate rules in declaration order
    rules: BTreeMap<String, BTreeMap<String, Vec<Rule>>>,
}

impl ScopeTable {
    fn compile(scope: Scope, spec: &ScopeSpec) -> Result<Self> {
        let fail = |message: String| {
            Err(KitchenError::configuration(format!(
                "{scope} machine: {message}"
            )))
        };

        let states: BTreeSet<&str> = spec.states.iter().map(String::as_str).collect();
        if states.is_empty() {
            return fail("no states declared".to_string());
        }
        if states.len() != spec.states.len() {
            return fail("duplicate state".to_string());
        }
        if !states.contains(spec.initial.as_str()) {
            return fail(format!("initial state '{}' is not declared", spec.initial));
        }

        let mut rules: BTreeMap<String, BTreeMap<String, Vec<Rule>>> = BTreeMap::new();
        for transition in &spec.transitions {
            if transition.trigger.is_empty() {
                return fail("transition with an empty trigger".to_string());
            }
            if transition.source.is_empty() {
                return fail(format!("'{}' has no source state", transition.trigger));
            }
            if !states.contains(transition.dest.as_str()) {
                return fail(format!(
                    "'{}' targets undeclared state '{}'",
                    transition.trigger, transition.dest
                ));
            }
            for source in &transition.source {
                if !states.contains(source.as_str()) {
                    return fail(format!(
                        "'{}' leaves undeclared state '{source}'",
                        transition.trigger
                    ));
                }
                let candidates = rules
                    .entry(transition.trigger.clone())
                    .or_default()
                    .entry(source.clone())
                    .or_default();
                if candidates.iter().any(|rule| rule.guard.is_none()) {
                    return fail(format!(
                        "'{}' from '{source}' is shadowed by an unguarded transition",
                        transition.trigger
                    ));
                }
                candidates.push(Rule {
                    dest: transition.dest.clone(),
                    action: transition.action,
                    guard: transition.guard,
                });
            }
        }

        Ok(Self {
            scope,
            initial: spec.initial.clone(),
            rules,
        })
    }

    fn has_action(&self, trigger: &str) -> bool {
        self.rules
            .get(trigger)
            .into_iter()
            .flat_map(BTreeMap::values)
            .flatten()
            .any(|rule| rule.action != Action::None)
    }

    fn pick(
        &self,
        trigger: &str,
        current: &str,
        session: &Session,
        chef: Option<&str>,
    ) -> Result<Option<&Rule>> {
        let Some(by_state) = self.rules.get(trigger) else {
            return Ok(None);
        };
        let candidates = by_state.get(current).ok_or_else(|| {
            KitchenError::invalid_state(format!(
                "event '{trigger}' is not valid in {} state '{current}'",
                self.scope
            ))
        })?;
        candidates
            .iter()
            .find(|rule| rule.guard.map_or(true, |guard| guard.allows(session, chef)))
            .map(Some)
            .ok_or_else(|| {
                KitchenError::invalid_state(format!(
                    "no '{trigger}' transition from {} state '{current}' is allowed",
                    self.scope
                ))
            })
    }
}

/// Compiled, validated pair of state machines.
#[derive(Debug, Clone)]
pub struct Machine {
    spec: MachineSpec,
    session: ScopeTable,
    chef: ScopeTable,
}

impl Machine {
    /// Validates `spec` and builds its transition tables.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Configuration` for undeclared states, an
    /// unreachable transition, or a trigger that binds actions in both
    /// scopes.
    pub fn new(spec: MachineSpec) -> Result<Self> {
        let session = ScopeTable::compile(Scope::Session, &spec.session)?;
        let chef = ScopeTable::compile(Scope::Chef, &spec.chef)?;

        if let Some(trigger) = session
            .rules
            .keys()
            .find(|trigger| session.has_action(trigger) && chef.has_action(trigger))
        {
            return Err(KitchenError::configuration(format!(
                "trigger '{trigger}' binds actions in both machines"
            )));
        }

        Ok(Self {
            spec,
            session,
            chef,
        })
    }

    /// The machine compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::new(MachineSpec::from_json(EMBEDDED_SPEC)?)
    }

    pub fn spec(&self) -> &MachineSpec {
        &self.spec
    }

    pub fn initial_state(&self) -> MachineState {
        MachineState {
            session: self.session.initial.clone(),
            chefs: BTreeMap::new(),
        }
    }

    /// Every trigger either machine declares.
    pub fn triggers(&self) -> BTreeSet<&str> {
        self.session
            .rules
            .keys()
            .chain(self.chef.rules.keys())
            .map(String::as_str)
            .collect()
    }

    /// Resolves `trigger` against the current state.
    ///
    /// Guards see `session` as it was before the action runs. When both
    /// machines declare the trigger, both must accept it.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a trigger neither machine declares, or a
    ///   chef-scoped trigger without a chef
    /// - `InvalidState` when the trigger is not valid from the current state
    ///   or every candidate's guard fails
    pub fn resolve(
        &self,
        state: &MachineState,
        trigger: &str,
        chef: Option<&str>,
        session: &Session,
    ) -> Result<Step> {
        let in_session = self.session.rules.contains_key(trigger);
        let in_chef = self.chef.rules.contains_key(trigger);
        if !in_session && !in_chef {
            return Err(KitchenError::invalid_input("name")
                .with_reason(format!("unknown event '{trigger}'")));
        }

        let mut next = state.clone();
        let mut action = Action::None;

        if let Some(rule) = self.session.pick(trigger, &state.session, session, chef)? {
            next.session = rule.dest.clone();
            action = rule.action;
        }

        if in_chef {
            let chef = chef.ok_or_else(|| {
                KitchenError::invalid_input("chef_id")
                    .with_reason(format!("event '{trigger}' requires a chef"))
            })?;
            let current = state.chef(chef).unwrap_or(self.chef.initial.as_str());
            if let Some(rule) = self.chef.pick(trigger, current, session, Some(chef))? {
                if rule.dest == self.chef.initial {
                    next.chefs.remove(chef);
                } else {
                    next.chefs.insert(chef.to_string(), rule.dest.clone());
                }
                if action == Action::None {
                    action = rule.action;
                }
            }
        }

        Ok(Step { action, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChefTask, Instruction, Recipe};

    fn machine() -> Machine {
        Machine::embedded().expect("embedded spec is valid")
    }

    fn session_with_chefs(chefs: &[&str]) -> Session {
        let recipe = Recipe::new(vec![Instruction::new(0, "Toast bread", 60, true)]).unwrap();
        let mut session = Session::new(recipe);
        for chef in chefs {
            session.chef_tasks.insert(chef.to_string(), Vec::new());
        }
        session
    }

    fn cooking(chefs: &[&str]) -> MachineState {
        MachineState {
            session: "cooking".into(),
            chefs: chefs
                .iter()
                .map(|c| (c.to_string(), "working".to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_embedded_spec_round_trips_through_serde() {
        let spec = MachineSpec::from_json(EMBEDDED_SPEC).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(MachineSpec::from_json(&json).unwrap(), spec);
        assert!(machine().triggers().contains("serve"));
    }

    #[test]
    fn test_unknown_action_fails_at_load() {
        let text = EMBEDDED_SPEC.replace("\"advance_task\"", "\"advance_tsak\"");
        let err = MachineSpec::from_json(&text).unwrap_err();
        assert!(matches!(err, KitchenError::Configuration { .. }));
    }

    #[test]
    fn test_validation_rejects_undeclared_states_and_shadowing() {
        let mut spec = MachineSpec::from_json(EMBEDDED_SPEC).unwrap();
        spec.session.transitions[0].dest = "plating".into();
        assert!(Machine::new(spec).is_err());

        let mut spec = MachineSpec::from_json(EMBEDDED_SPEC).unwrap();
        spec.session.initial = "nowhere".into();
        assert!(Machine::new(spec).is_err());

        let mut spec = MachineSpec::from_json(EMBEDDED_SPEC).unwrap();
        let pause = spec
            .session
            .transitions
            .iter()
            .find(|t| t.trigger == "pause")
            .cloned()
            .unwrap();
        spec.session.transitions.push(pause);
        let err = Machine::new(spec).unwrap_err();
        assert!(err.to_string().contains("shadowed"));

        let mut spec = MachineSpec::from_json(EMBEDDED_SPEC).unwrap();
        spec.chef.transitions[0].action = Action::AdvanceTask;
        let err = Machine::new(spec).unwrap_err();
        assert!(err.to_string().contains("both machines"));
    }

    #[test]
    fn test_unknown_and_invalid_events() {
        let m = machine();
        let session = session_with_chefs(&[]);

        let unknown = m.resolve(&m.initial_state(), "flambe", None, &session);
        assert!(matches!(unknown, Err(KitchenError::InvalidInput { .. })));

        let too_early = m.resolve(&m.initial_state(), "advance", Some("ana"), &session);
        assert!(matches!(too_early, Err(KitchenError::InvalidState { .. })));

        let no_chef = m.resolve(&m.initial_state(), "chef_joined", None, &session);
        assert!(matches!(no_chef, Err(KitchenError::InvalidInput { .. })));
    }

    #[test]
    fn test_chef_left_guards_pick_destination() {
        let m = machine();

        let both = session_with_chefs(&["ana", "bo"]);
        let step = m.resolve(&cooking(&["ana", "bo"]), "chef_left", Some("ana"), &both).unwrap();
        assert_eq!(step.action, Action::ChefLeave);
        assert_eq!(step.next.session, "cooking");
        assert_eq!(step.next.chef("ana"), None);
        assert_eq!(step.next.chef("bo"), Some("working"));

        let alone = session_with_chefs(&["ana"]);
        let step = m.resolve(&cooking(&["ana"]), "chef_left", Some("ana"), &alone).unwrap();
        assert_eq!(step.next.session, "idle");
        assert!(step.next.chefs.is_empty());
    }

    #[test]
    fn test_serve_requires_everything_dismissed() {
        let m = machine();
        let mut session = session_with_chefs(&["ana"]);
        let state = cooking(&["ana"]);

        let refused = m.resolve(&state, "serve", Some("ana"), &session);
        assert!(matches!(refused, Err(KitchenError::InvalidState { .. })));

        let now = jiff::Timestamp::UNIX_EPOCH;
        session
            .chef_tasks
            .insert("ana".into(), vec![ChefTask::planned(0).started_at(now).dismissed_at(now)]);
        let step = m.resolve(&state, "serve", Some("ana"), &session).unwrap();
        assert_eq!(step.next.session, "done");
        assert_eq!(step.action, Action::None);
    }

    #[test]
    fn test_chef_scope_rejects_double_join() {
        let m = machine();
        let session = session_with_chefs(&["ana"]);
        let result = m.resolve(&cooking(&["ana"]), "chef_joined", Some("ana"), &session);
        assert!(matches!(result, Err(KitchenError::InvalidState { .. })));
    }

    #[test]
    fn test_action_requires_inputs() {
        let scheduler = Scheduler::new(Default::default()).unwrap();
        let session = session_with_chefs(&["ana"]);
        let event = Event::new("dismiss", "s1");
        let err = Action::DismissTimer.apply(&session, &event, &scheduler).unwrap_err();
        assert!(matches!(err, KitchenError::InvalidInput { ref field, .. } if field == "instr_idx"));

        let err = Action::AdvanceTask.apply(&session, &event, &scheduler).unwrap_err();
        assert!(matches!(err, KitchenError::InvalidInput { ref field, .. } if field == "chef_id"));

        assert_eq!(Action::None.apply(&session, &event, &scheduler).unwrap(), session);
    }
}
