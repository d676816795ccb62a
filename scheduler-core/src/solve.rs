use std::collections::{HashMap, HashSet};

use cp_sat::builder::BoolVar;
use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::assemble::assemble_model;
use crate::config::SolverConfig;
use crate::core_mapping::core_to_rule_ids;
use crate::cpsat::{is_feasible, is_infeasible, status_name};
use crate::domain::{Instance, ShiftType, SHIFT_TYPES};
use crate::error::Result;
use crate::model::Variables;
use crate::mus::shrink_to_mus;
use crate::rules::RuleInstance;

pub type Matrix = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub solver_status: String,
    pub unsat_core: Option<Vec<String>>,
    pub wall_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub matrix: Option<Matrix>,
    pub objective: Option<f64>,
    pub solver_status: String,
    pub wall_time: f64,
    pub unsat_core: Option<Vec<String>>,
    pub relaxed_rules: Vec<String>,
}

fn total_coverage_expr(vars: &Variables) -> cp_sat::builder::LinearExpr {
    let mut terms: Vec<(i64, BoolVar)> = Vec::new();
    for i in 0..vars.n_residents() {
        for j in 0..vars.n_days() {
            for k in 0..SHIFT_TYPES.len() {
                terms.push((1, vars.at(i, j, k).clone()));
            }
        }
    }
    terms.into_iter().collect()
}

fn extract_matrix(vars: &Variables, response: &cp_sat::proto::CpSolverResponse) -> Matrix {
    let mut matrix = Vec::with_capacity(vars.n_residents());
    for i in 0..vars.n_residents() {
        let mut row = Vec::with_capacity(vars.n_days());
        for j in 0..vars.n_days() {
            let mut cell = String::new();
            for k in 0..SHIFT_TYPES.len() {
                if vars.at(i, j, k).solution_value(response) {
                    cell = ShiftType::from_ordinal(k).unwrap().name().to_string();
                    break;
                }
            }
            row.push(cell);
        }
        matrix.push(row);
    }
    matrix
}

/// Solves once under every rule asserted and, on infeasibility, returns a
/// subset-minimal explanation. Presets are force-fixed as a hard
/// constraint regardless of whether `enforce_presets` is in `rules`.
pub fn validate(
    instance: &Instance,
    rules: &[RuleInstance],
    config: &SolverConfig,
) -> Result<ValidationResult> {
    let mut assembled = assemble_model(instance, rules)?;

    for &(i, j, k) in &instance.presets {
        assembled.model.guarded_fix(None, assembled.vars.at(i, j, k), true);
        for other in 0..SHIFT_TYPES.len() {
            if other != k {
                assembled
                    .model
                    .guarded_fix(None, assembled.vars.at(i, j, other), false);
            }
        }
    }

    let assumptions: Vec<BoolVar> = assembled
        .enable_order
        .iter()
        .map(|rid| assembled.enables[rid].clone())
        .collect();

    let response = assembled.model.solve(config, &assumptions);
    let status = response.status();
    let mut wall_time = response.wall_time;

    if is_infeasible(status) {
        let core = core_to_rule_ids(&response, &assembled.enables, &assembled.enable_order);
        info!("validate: infeasible under full policy, core has {} rule(s)", core.len());
        let (mus, mus_wall_time) = shrink_to_mus(instance, rules, config, core)?;
        wall_time += mus_wall_time;
        debug!("validate: shrunk core to {} rule(s)", mus.len());
        Ok(ValidationResult {
            solver_status: status_name(status),
            unsat_core: Some(mus),
            wall_time,
        })
    } else {
        Ok(ValidationResult {
            solver_status: status_name(status),
            unsat_core: None,
            wall_time,
        })
    }
}

/// Priority-driven cascading relaxation followed by a greedy trim pass: relax
/// the most disposable rule implicated in each infeasibility core until a
/// feasible, coverage-maximizing assignment is found, then try to re-enable
/// whatever was disabled along the way.
pub fn assign(
    instance: &Instance,
    rules: &[RuleInstance],
    config: &SolverConfig,
) -> Result<AssignmentResult> {
    let priority_by_id: HashMap<String, i32> = rules
        .iter()
        .map(|r| (r.rule_id(), r.priority()))
        .collect();
    let policy_order: Vec<String> = rules.iter().map(|r| r.rule_id()).collect();

    let mut active_ids: HashSet<String> = policy_order.iter().cloned().collect();
    let mut relaxed: Vec<String> = Vec::new();
    let mut first_core: Option<Vec<String>> = None;
    let mut wall_time_total = 0.0;

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut assembled = assemble_model(instance, rules)?;
        assembled.model.maximize(total_coverage_expr(&assembled.vars));

        let assumptions: Vec<BoolVar> = assembled
            .enable_order
            .iter()
            .filter(|rid| active_ids.contains(*rid))
            .map(|rid| assembled.enables[rid].clone())
            .collect();

        let response = assembled.model.solve(config, &assumptions);
        let status = response.status();
        wall_time_total += response.wall_time;
        debug!("assign: attempt {attempt}, status {}", status_name(status));

        if is_feasible(status) {
            return trim_and_finish(
                instance,
                rules,
                config,
                active_ids,
                relaxed,
                first_core,
                wall_time_total,
            );
        }

        if !is_infeasible(status) {
            info!("assign: attempt {attempt} returned non-decisive status {}", status_name(status));
            return Ok(AssignmentResult {
                matrix: None,
                objective: None,
                solver_status: status_name(status),
                wall_time: wall_time_total,
                unsat_core: first_core,
                relaxed_rules: order_by_policy(&policy_order, &relaxed.iter().cloned().collect()),
            });
        }

        let core = core_to_rule_ids(&response, &assembled.enables, &assembled.enable_order);
        if first_core.is_none() {
            first_core = Some(core.clone());
        }

        let core_active: Vec<&String> = core.iter().filter(|rid| active_ids.contains(*rid)).collect();
        if core_active.is_empty() {
            info!("assign: infeasibility core no longer touches any active rule, giving up");
            return Ok(AssignmentResult {
                matrix: None,
                objective: None,
                solver_status: status_name(status),
                wall_time: wall_time_total,
                unsat_core: first_core,
                relaxed_rules: order_by_policy(&policy_order, &relaxed.iter().cloned().collect()),
            });
        }

        let top_priority = core_active
            .iter()
            .map(|rid| priority_by_id.get(*rid).copied().unwrap_or(0))
            .max()
            .unwrap();
        let chosen = core_active
            .into_iter()
            .find(|rid| priority_by_id.get(*rid).copied().unwrap_or(0) == top_priority)
            .cloned()
            .unwrap();
        info!("assign: relaxing rule '{chosen}' (attempt {attempt})");
        active_ids.remove(&chosen);
        relaxed.push(chosen);
    }
}

fn order_by_policy(policy_order: &[String], set: &HashSet<String>) -> Vec<String> {
    policy_order
        .iter()
        .filter(|rid| set.contains(*rid))
        .cloned()
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn trim_and_finish(
    instance: &Instance,
    rules: &[RuleInstance],
    config: &SolverConfig,
    mut active_ids: HashSet<String>,
    relaxed: Vec<String>,
    first_core: Option<Vec<String>>,
    mut wall_time_total: f64,
) -> Result<AssignmentResult> {
    let priority_by_id: HashMap<String, i32> = rules
        .iter()
        .map(|r| (r.rule_id(), r.priority()))
        .collect();
    let policy_order: Vec<String> = rules.iter().map(|r| r.rule_id()).collect();

    let mut trim_order = relaxed.clone();
    trim_order.sort_by_key(|rid| priority_by_id.get(rid).copied().unwrap_or(0));

    for rid in trim_order {
        let mut tentative = active_ids.clone();
        tentative.insert(rid.clone());

        let mut assembled = assemble_model(instance, rules)?;
        assembled.model.maximize(total_coverage_expr(&assembled.vars));
        let assumptions: Vec<BoolVar> = assembled
            .enable_order
            .iter()
            .filter(|r| tentative.contains(*r))
            .map(|r| assembled.enables[r].clone())
            .collect();
        let response = assembled.model.solve(config, &assumptions);
        wall_time_total += response.wall_time;

        if is_feasible(response.status()) {
            debug!("assign: trim pass re-enabled '{rid}'");
            active_ids = tentative;
        } else {
            debug!("assign: trim pass kept '{rid}' disabled");
        }
    }

    let mut assembled = assemble_model(instance, rules)?;
    assembled.model.maximize(total_coverage_expr(&assembled.vars));
    let assumptions: Vec<BoolVar> = assembled
        .enable_order
        .iter()
        .filter(|rid| active_ids.contains(*rid))
        .map(|rid| assembled.enables[rid].clone())
        .collect();
    let response = assembled.model.solve(config, &assumptions);
    wall_time_total += response.wall_time;
    let status = response.status();

    let relaxed_rules = order_by_policy(
        &policy_order,
        &policy_order
            .iter()
            .filter(|rid| !active_ids.contains(*rid))
            .cloned()
            .collect(),
    );

    if is_feasible(status) {
        Ok(AssignmentResult {
            matrix: Some(extract_matrix(&assembled.vars, &response)),
            objective: Some(response.objective_value),
            solver_status: status_name(status),
            wall_time: wall_time_total,
            unsat_core: first_core,
            relaxed_rules,
        })
    } else {
        Ok(AssignmentResult {
            matrix: None,
            objective: None,
            solver_status: status_name(status),
            wall_time: wall_time_total,
            unsat_core: first_core,
            relaxed_rules,
        })
    }
}
