use std::collections::{HashMap, HashSet};

use cp_sat::builder::BoolVar;
use cp_sat::proto::CpSolverResponse;

use crate::cpsat::{core_indices, var_index};

/// Translates a solver-reported infeasibility core back into an ordered,
/// duplicate-free list of rule ids.
///
/// The primary (and only) mapping is by the enable literal's underlying
/// proto variable index, since every enable literal is created with the
/// deterministic name `enable_{rule_id}` and inserted into `enables`
/// exactly once; a name-string fallback would be redundant (see
/// DESIGN.md). Indices the solver reports that don't correspond to a
/// known enable literal are silently dropped rather than causing a panic.
pub fn core_to_rule_ids(
    response: &CpSolverResponse,
    enables: &HashMap<String, BoolVar>,
    enable_order: &[String],
) -> Vec<String> {
    let index_to_id: HashMap<i32, &String> = enables
        .iter()
        .map(|(id, var)| (var_index(var), id))
        .collect();

    let reported: HashSet<i32> = core_indices(response).into_iter().collect();

    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for id in enable_order {
        if let Some(var) = enables.get(id) {
            if reported.contains(&var_index(var)) && seen.insert(id.clone()) {
                ordered.push(id.clone());
            }
        }
    }

    // Catch any reported index whose rule id wasn't in `enable_order`
    // (should not happen in practice, kept for robustness).
    for idx in &reported {
        if let Some(&id) = index_to_id.get(idx) {
            if seen.insert(id.clone()) {
                ordered.push(id.clone());
            }
        }
    }

    ordered
}
