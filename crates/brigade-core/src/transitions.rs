//! Pure transition functions over [`Session`].
//!
//! Every function takes the current session by reference and returns a new
//! one; nothing is mutated in place. Expected "nothing to do" cases return an
//! unchanged copy. Programmer errors (unknown chef, unknown instruction,
//! dismissing a task that never started) surface as [`KitchenError`]s.
//!
//! Each chef's list keeps its started entries ahead of its unstarted ones.
//! Operations that flip a task between the two groups move the entry to the
//! boundary so the ordering holds.

use std::collections::BTreeMap;

use jiff::Timestamp;
use log::debug;

use crate::{
    error::{KitchenError, Result},
    models::{ChefTask, Session},
    scheduler::Scheduler,
};

/// Length of the started prefix of a task list.
fn started_prefix(tasks: &[ChefTask]) -> usize {
    tasks
        .iter()
        .position(|task| !task.is_started())
        .unwrap_or(tasks.len())
}

fn with_tasks(session: &Session, chef: &str, tasks: Vec<ChefTask>) -> Session {
    let mut next = session.clone();
    next.chef_tasks.insert(chef.to_string(), tasks);
    next
}

fn replace_task(session: &Session, chef: &str, position: usize, task: ChefTask) -> Result<Session> {
    let mut tasks = session.tasks_of(chef)?.to_vec();
    let slot = tasks
        .get_mut(position)
        .ok_or(KitchenError::InstructionNotFound {
            index: task.instruction_index,
        })?;
    *slot = task;
    Ok(with_tasks(session, chef, tasks))
}

/// Moves the entry at `position` to the started/unstarted boundary after
/// applying `update` to it.
fn move_to_boundary(
    session: &Session,
    chef: &str,
    position: usize,
    update: impl FnOnce(ChefTask) -> ChefTask,
) -> Result<Session> {
    let mut tasks = session.tasks_of(chef)?.to_vec();
    if position >= tasks.len() {
        return Ok(session.clone());
    }
    let task = update(tasks.remove(position));
    let boundary = started_prefix(&tasks);
    tasks.insert(boundary, task);
    Ok(with_tasks(session, chef, tasks))
}

/// Starts the chef's next unstarted task at `now`.
///
/// No-op when every task on the chef's list has started.
pub fn advance_task_for_chef(session: &Session, chef: &str, now: Timestamp) -> Result<Session> {
    let position = session.next_unstarted_task(chef)?;
    match session.tasks_of(chef)?.get(position) {
        Some(task) => replace_task(session, chef, position, task.started_at(now)),
        None => Ok(session.clone()),
    }
}

/// Plans every open instruction onto the current roster.
///
/// Returns the freshly planned (unstarted) tasks per chef, in execution
/// order. Chefs the scheduler left idle map to an empty list.
///
/// # Errors
///
/// Propagates scheduler failures: `Configuration` when there are no chefs,
/// `Infeasible` or `Timeout` when no plan was found.
pub fn solve_remaining_session(
    session: &Session,
    scheduler: &Scheduler,
) -> Result<BTreeMap<String, Vec<ChefTask>>> {
    let remaining = session.remaining_recipe_indices();
    let mut planned: BTreeMap<String, Vec<ChefTask>> = session
        .chefs()
        .map(|chef| (chef.to_string(), Vec::new()))
        .collect();
    if remaining.is_empty() {
        return Ok(planned);
    }

    let instructions = remaining
        .iter()
        .map(|index| session.instruction(*index))
        .collect::<Result<Vec<_>>>()?;
    let chefs = session.chefs().map(str::to_string).collect();
    let schedule = scheduler.schedule(chefs, &instructions)?;

    for placement in &schedule.placements {
        planned
            .entry(placement.chef.clone())
            .or_default()
            .push(ChefTask::planned(placement.vertex));
    }
    Ok(planned)
}

/// Re-plans all unstarted work and swaps it in behind each chef's started
/// prefix.
///
/// No-op when nothing is left to plan. On scheduler failure nothing is
/// committed; the error is returned and the caller keeps the old session.
pub fn recompile_session(session: &Session, scheduler: &Scheduler) -> Result<Session> {
    if session.remaining_recipe_indices().is_empty() {
        debug!("nothing left to plan");
        return Ok(session.clone());
    }

    let mut future = solve_remaining_session(session, scheduler)?;
    let mut next = session.clone();
    for (chef, tasks) in &mut next.chef_tasks {
        let keep = started_prefix(tasks);
        tasks.truncate(keep);
        tasks.extend(future.remove(chef).unwrap_or_default());
    }
    Ok(next)
}

/// Adds `chef` to the session, re-plans, and starts the chef's first task.
///
/// No-op if the chef is already present.
pub fn new_chef_joined(
    session: &Session,
    chef: &str,
    now: Timestamp,
    scheduler: &Scheduler,
) -> Result<Session> {
    if session.has_chef(chef) {
        return Ok(session.clone());
    }
    let joined = with_tasks(session, chef, Vec::new());
    let planned = recompile_session(&joined, scheduler)?;
    advance_task_for_chef(&planned, chef, now)
}

/// Removes `chef`, hands their whole list to the first remaining chef and
/// re-plans.
///
/// The leaving chef's running passive timers are reset, since nobody knows
/// their physical state. When the last chef leaves the work is dropped and no
/// re-plan is attempted; the instructions stay open for whoever joins next.
/// No-op if the chef is not present.
pub fn chef_leave(session: &Session, chef: &str, scheduler: &Scheduler) -> Result<Session> {
    let Some(leaving) = session.chef_tasks.get(chef) else {
        return Ok(session.clone());
    };
    let timers: Vec<usize> = session
        .active_timers(chef)?
        .iter()
        .map(|task| task.instruction_index)
        .collect();

    let mut next = session.clone();
    next.chef_tasks.remove(chef);
    let Some((heir, inherited)) = next.chef_tasks.iter_mut().next() else {
        debug!("last chef '{chef}' left; {} task(s) dropped", leaving.len());
        return Ok(next);
    };

    let heir_split = started_prefix(inherited);
    let leaver_split = started_prefix(leaving);
    let mut merged = Vec::with_capacity(inherited.len() + leaving.len());
    merged.extend_from_slice(&inherited[..heir_split]);
    merged.extend_from_slice(&leaving[..leaver_split]);
    merged.extend_from_slice(&inherited[heir_split..]);
    merged.extend_from_slice(&leaving[leaver_split..]);
    *inherited = merged;
    debug!("'{heir}' inherits {} task(s) from '{chef}'", leaving.len());

    for index in timers {
        next = reset_active_task(&next, index)?;
    }
    recompile_session(&next, scheduler)
}

/// Marks the task for `index` dismissed at `now`.
///
/// # Errors
///
/// - `InstructionNotFound` if no chef holds the instruction
/// - `InvalidState` if the task never started or was already dismissed
pub fn dismiss_timer(session: &Session, index: usize, now: Timestamp) -> Result<Session> {
    let (chef, position) = session
        .locate(index)
        .ok_or(KitchenError::InstructionNotFound { index })?;
    let task = session.tasks_of(chef)?[position];
    if !task.is_started() {
        return Err(KitchenError::invalid_state(format!(
            "instruction {index} has not started"
        )));
    }
    if task.when_dismissed.is_some() {
        return Err(KitchenError::invalid_state(format!(
            "instruction {index} is already dismissed"
        )));
    }
    replace_task(session, chef, position, task.dismissed_at(now))
}

/// Reverts a running task for `index` to unstarted, placing it first in its
/// chef's unstarted suffix.
///
/// No-op if the task is unassigned, unstarted or already dismissed.
pub fn reset_active_task(session: &Session, index: usize) -> Result<Session> {
    let Some((chef, position)) = session.locate(index) else {
        return Ok(session.clone());
    };
    if !session.tasks_of(chef)?[position].is_running() {
        return Ok(session.clone());
    }
    move_to_boundary(session, chef, position, ChefTask::reset)
}

/// Starts the chef's first unstarted passive task, even if attention tasks
/// are queued ahead of it.
pub fn start_low_attention_task(session: &Session, chef: &str, now: Timestamp) -> Result<Session> {
    let mut found = None;
    for (position, task) in session.tasks_of(chef)?.iter().enumerate() {
        if !task.is_started() && session.instruction(task.instruction_index)?.is_passive() {
            found = Some(position);
            break;
        }
    }
    match found {
        Some(position) => move_to_boundary(session, chef, position, |task| task.started_at(now)),
        None => Ok(session.clone()),
    }
}

/// Dismisses the chef's running attention task at `now`.
pub fn finish_attention_task(session: &Session, chef: &str, now: Timestamp) -> Result<Session> {
    let mut found = None;
    for (position, task) in session.tasks_of(chef)?.iter().enumerate() {
        if task.is_running() && session.instruction(task.instruction_index)?.attention {
            found = Some((position, *task));
            break;
        }
    }
    match found {
        Some((position, task)) => replace_task(session, chef, position, task.dismissed_at(now)),
        None => Ok(session.clone()),
    }
}

/// Restarts the chef's most recently started timer at `now`.
pub fn undo_timer_pressed(session: &Session, chef: &str, now: Timestamp) -> Result<Session> {
    let latest = session
        .active_timers(chef)?
        .into_iter()
        .max_by_key(|task| task.when_started)
        .copied();
    let Some(latest) = latest else {
        return Ok(session.clone());
    };
    let position = session
        .tasks_of(chef)?
        .iter()
        .position(|task| task.instruction_index == latest.instruction_index)
        .ok_or(KitchenError::InstructionNotFound {
            index: latest.instruction_index,
        })?;
    replace_task(session, chef, position, latest.started_at(now))
}
