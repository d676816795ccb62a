use crate::assemble::assemble_model;
use crate::config::SolverConfig;
use crate::cpsat::is_infeasible;
use crate::domain::{Instance, SHIFT_TYPES};
use crate::error::Result;
use crate::rules::RuleInstance;

/// Deletion-based minimization of an infeasibility core to a subset-minimal
/// unsatisfiable subset (MUS).
///
/// For each rule id in the core, try solving with every other remaining
/// core member asserted. If the model is still infeasible without it, the
/// rule was not necessary to the contradiction and is dropped for good;
/// otherwise it is restored. Each probe rebuilds the model from scratch
/// (presets included) and asserts exactly its own assumption set, the same
/// "rebuild per attempt" discipline `assign`'s relaxation loop uses — this
/// avoids depending on whether the underlying solver binding's assumption
/// setter replaces or accumulates across calls on a reused model.
pub fn shrink_to_mus(
    instance: &Instance,
    rules: &[RuleInstance],
    config: &SolverConfig,
    core: Vec<String>,
) -> Result<(Vec<String>, f64)> {
    let mut remaining = core;
    let mut wall_time_total = 0.0;

    let mut i = 0;
    while i < remaining.len() {
        let candidate_rid = remaining[i].clone();
        let probe_ids: Vec<&String> = remaining
            .iter()
            .filter(|rid| **rid != candidate_rid)
            .collect();

        let mut assembled = assemble_model(instance, rules)?;
        for &(pi, pj, pk) in &instance.presets {
            assembled.model.guarded_fix(None, assembled.vars.at(pi, pj, pk), true);
            for other in 0..SHIFT_TYPES.len() {
                if other != pk {
                    assembled
                        .model
                        .guarded_fix(None, assembled.vars.at(pi, pj, other), false);
                }
            }
        }
        let probe: Vec<_> = probe_ids
            .iter()
            .filter_map(|rid| assembled.enables.get(*rid).cloned())
            .collect();

        let response = assembled.model.solve(config, &probe);
        wall_time_total += response.wall_time;
        if is_infeasible(response.status()) {
            remaining.remove(i);
        } else {
            i += 1;
        }
    }

    Ok((remaining, wall_time_total))
}
