//! Binary search for the smallest feasible horizon.

use super::{Placement, ProbeOutcome};
use crate::error::Result;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum SearchResult {
    Found { bound: u32, placements: Vec<Placement> },
    NotFound { timed_out: bool },
}

/// Searches `[lower, upper)` for the smallest horizon `probe` accepts.
///
/// Assumes feasibility is monotone in the horizon. A timed-out probe is
/// treated as infeasible, so the search keeps looking higher.
pub(super) fn minimal_feasible<F>(lower: u32, upper: u32, mut probe: F) -> Result<SearchResult>
where
    F: FnMut(u32) -> Result<ProbeOutcome>,
{
    let (mut lo, mut hi) = (lower, upper);
    let mut best: Option<(u32, Vec<Placement>)> = None;
    let mut timed_out = false;

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match probe(mid)? {
            ProbeOutcome::Satisfiable(placements) => {
                best = Some((mid, placements));
                hi = mid;
            }
            ProbeOutcome::Unsatisfiable => lo = mid + 1,
            ProbeOutcome::TimedOut => {
                timed_out = true;
                lo = mid + 1;
            }
        }
    }

    Ok(match best {
        Some((bound, placements)) => SearchResult::Found { bound, placements },
        None => SearchResult::NotFound { timed_out },
    })
}
