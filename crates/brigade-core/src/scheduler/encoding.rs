//! Compilation of a scheduling problem into CNF.
//!
//! Variable `X[chef, slot, vertex]` is true when the chef starts the vertex
//! at the slot. Clause families:
//!
//! 1. attention: one chef never runs two attention vertices whose windows
//!    `[start, start + duration)` intersect
//! 2. resources: vertices sharing a resource tag never overlap, whichever
//!    chefs run them
//! 3. coverage: every vertex is started somewhere
//! 4. uniqueness: no vertex is started twice
//! 5. dependencies: for an edge `v -> u`, `u` starts no earlier than `v`
//!    ends, across chefs

use std::sync::atomic::{AtomicBool, Ordering};

use varisat::{CnfFormula, ExtendFormula, Lit};

use super::{Placement, Problem};

/// A compiled formula plus the variable layout needed to decode models.
pub(super) struct Encoding {
    formula: CnfFormula,
    vertices: usize,
    slots: usize,
}

impl Encoding {
    /// Compiles `problem` for a horizon of `slots` slots.
    ///
    /// Returns `None` if `cancel` is raised while clauses are being built.
    pub(super) fn build(problem: &Problem, slots: usize, cancel: &AtomicBool) -> Option<Self> {
        let mut encoding = Self {
            formula: CnfFormula::new(),
            vertices: problem.vertices.len(),
            slots,
        };
        let chefs = problem.chefs.len();
        let vertices = &problem.vertices;

        // 1. attention exclusivity, per chef
        for (pv, v) in vertices.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            if !v.attention {
                continue;
            }
            for (pu, u) in vertices.iter().enumerate() {
                if pu == pv || !u.attention {
                    continue;
                }
                for t in 0..slots {
                    for s in t..encoding.window_end(t, v.duration) {
                        for p in 0..chefs {
                            encoding.forbid_pair(encoding.var(p, t, pv), encoding.var(p, s, pu));
                        }
                    }
                }
            }
        }

        // 2. shared-resource exclusivity, across chefs
        for (pv, v) in vertices.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            if v.resources.is_empty() {
                continue;
            }
            for (pu, u) in vertices.iter().enumerate() {
                if pu == pv || v.resources.is_disjoint(&u.resources) {
                    continue;
                }
                for t in 0..slots {
                    for s in t..encoding.window_end(t, v.duration) {
                        for p1 in 0..chefs {
                            for p2 in 0..chefs {
                                encoding
                                    .forbid_pair(encoding.var(p1, t, pv), encoding.var(p2, s, pu));
                            }
                        }
                    }
                }
            }
        }

        // 3. coverage
        for pv in 0..vertices.len() {
            let clause: Vec<Lit> = (0..chefs)
                .flat_map(|p| (0..slots).map(move |t| (p, t)))
                .map(|(p, t)| encoding.var(p, t, pv))
                .collect();
            encoding.formula.add_clause(&clause);
        }

        // 4. uniqueness, pairwise over distinct (chef, slot) choices
        for pv in 0..vertices.len() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let choices: Vec<Lit> = (0..chefs)
                .flat_map(|p| (0..slots).map(move |t| (p, t)))
                .map(|(p, t)| encoding.var(p, t, pv))
                .collect();
            for (i, a) in choices.iter().enumerate() {
                for b in &choices[i + 1..] {
                    encoding.forbid_pair(*a, *b);
                }
            }
        }

        // 5. dependency ordering
        for (from, to) in &problem.edges {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let (pv, pu) = match (problem.position(*from), problem.position(*to)) {
                (Some(pv), Some(pu)) => (pv, pu),
                _ => continue,
            };
            let duration = vertices[pv].duration as usize;
            for t in 0..slots {
                for s in 0..(t + duration).min(slots) {
                    for p in 0..chefs {
                        for q in 0..chefs {
                            encoding.forbid_pair(encoding.var(p, t, pv), encoding.var(q, s, pu));
                        }
                    }
                }
            }
        }

        Some(encoding)
    }

    pub(super) fn formula(&self) -> &CnfFormula {
        &self.formula
    }

    pub(super) fn clause_count(&self) -> usize {
        self.formula.len()
    }

    /// Reads the chosen `(chef, slot, vertex)` triples out of a model.
    pub(super) fn decode(&self, problem: &Problem, model: &[Lit]) -> Vec<Placement> {
        let total = problem.chefs.len() * self.vertices * self.slots;
        model
            .iter()
            .filter(|lit| lit.is_positive())
            .filter_map(|lit| usize::try_from(lit.to_dimacs() - 1).ok())
            .filter(|index| *index < total)
            .map(|index| {
                let slot = index % self.slots;
                let rest = index / self.slots;
                let vertex = rest % self.vertices;
                let chef = rest / self.vertices;
                Placement {
                    chef: problem.chefs[chef].clone(),
                    slot: slot as u32,
                    vertex: problem.vertices[vertex].index,
                }
            })
            .collect()
    }

    /// Positive literal of `X[chef, slot, vertex]`; DIMACS numbering from 1.
    fn var(&self, chef: usize, slot: usize, vertex: usize) -> Lit {
        let index = (chef * self.vertices + vertex) * self.slots + slot;
        Lit::from_dimacs(index as isize + 1)
    }

    /// Exclusive end of the window a vertex of `duration` started at `start`
    /// occupies, clipped to the horizon.
    fn window_end(&self, start: usize, duration: u32) -> usize {
        (start + duration as usize).min(self.slots)
    }

    fn forbid_pair(&mut self, a: Lit, b: Lit) {
        self.formula.add_clause(&[!a, !b]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Vertex;

    fn problem(chefs: &[&str], vertices: Vec<Vertex>, edges: Vec<(usize, usize)>) -> Problem {
        Problem::new(
            chefs.iter().map(|c| c.to_string()).collect(),
            vertices,
            edges,
        )
        .expect("valid problem")
    }

    #[test]
    fn test_variable_layout_round_trips_through_decode() {
        let p = problem(&["a", "b"], vec![Vertex::new(4, true, 1), Vertex::new(9, false, 1)], vec![]);
        let never = AtomicBool::new(false);
        let encoding = Encoding::build(&p, 3, &never).expect("not cancelled");

        let chosen = encoding.var(1, 2, 0);
        let other = encoding.var(0, 1, 1);
        let decoded = encoding.decode(&p, &[chosen, !encoding.var(0, 0, 0), other]);

        assert_eq!(
            decoded,
            vec![
                Placement {
                    chef: "b".into(),
                    slot: 2,
                    vertex: 4
                },
                Placement {
                    chef: "a".into(),
                    slot: 1,
                    vertex: 9
                },
            ]
        );
    }

    #[test]
    fn test_clause_counts_for_single_vertex() {
        // One chef, one vertex, four slots: one coverage clause plus
        // C(4, 2) = 6 uniqueness clauses.
        let p = problem(&["a"], vec![Vertex::new(0, true, 2)], vec![]);
        let never = AtomicBool::new(false);
        let encoding = Encoding::build(&p, 4, &never).expect("not cancelled");
        assert_eq!(encoding.clause_count(), 7);
    }

    #[test]
    fn test_no_resource_tags_adds_no_resource_clauses() {
        let tagged = |v: Vertex| v.with_resources(["oven".to_string()].into());
        let never = AtomicBool::new(false);

        let plain = problem(&["a"], vec![Vertex::new(0, false, 2), Vertex::new(1, false, 2)], vec![]);
        let with_oven = problem(
            &["a"],
            vec![tagged(Vertex::new(0, false, 2)), tagged(Vertex::new(1, false, 2))],
            vec![],
        );

        let base = Encoding::build(&plain, 4, &never).unwrap().clause_count();
        let extra = Encoding::build(&with_oven, 4, &never).unwrap().clause_count();
        assert!(extra > base);
    }

    #[test]
    fn test_cancelled_build_returns_none() {
        let p = problem(&["a"], vec![Vertex::new(0, true, 2), Vertex::new(1, true, 2)], vec![]);
        let cancelled = AtomicBool::new(true);
        assert!(Encoding::build(&p, 4, &cancelled).is_none());
    }
}
