//! Thin seam around the `cp_sat` CP-SAT binding.
//!
//! Every rule in `rules::catalogue` is expressed as "zero or more linear
//! constraints over boolean decision variables, enforced only if some
//! enable literal holds". This module is the only place that touches
//! `cp_sat::builder` directly, so the rest of the crate reads like plain
//! scheduling logic rather than solver plumbing.

use cp_sat::builder::{BoolVar, CpModelBuilder, LinearExpr};
use cp_sat::proto::{CpSolverResponse, CpSolverStatus, SatParameters};

use crate::config::SolverConfig;

/// Comparison operator for a guarded linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Le,
    Ge,
    Lt,
    Gt,
}

/// Wraps `CpModelBuilder` with the "only enforce if" idiom the original
/// Python source leans on for every single rule.
pub struct GuardedModel {
    pub builder: CpModelBuilder,
}

impl GuardedModel {
    pub fn new() -> Self {
        GuardedModel {
            builder: CpModelBuilder::default(),
        }
    }

    pub fn new_bool_var(&mut self, name: &str) -> BoolVar {
        self.builder.new_bool_var(name)
    }

    /// Adds `expr OP rhs`, enforced only if `enable` is true. Pass `None`
    /// for an unconditional (always-on) constraint.
    pub fn guarded(&mut self, enable: Option<&BoolVar>, expr: LinearExpr, op: Cmp, rhs: i64) {
        let constraint = match op {
            Cmp::Eq => self.builder.add_eq(expr, LinearExpr::from(rhs)),
            Cmp::Le => self.builder.add_le(expr, LinearExpr::from(rhs)),
            Cmp::Ge => self.builder.add_ge(expr, LinearExpr::from(rhs)),
            Cmp::Lt => self.builder.add_lt(expr, LinearExpr::from(rhs)),
            Cmp::Gt => self.builder.add_gt(expr, LinearExpr::from(rhs)),
        };
        if let Some(lit) = enable {
            constraint.only_enforce_if(lit.clone());
        }
    }

    /// Fixes a single boolean literal to a constant, guarded by `enable`.
    pub fn guarded_fix(&mut self, enable: Option<&BoolVar>, lit: &BoolVar, value: bool) {
        self.guarded(
            enable,
            LinearExpr::from(lit.clone()),
            Cmp::Eq,
            value as i64,
        );
    }

    pub fn minimize(&mut self, expr: LinearExpr) {
        self.builder.minimize(expr);
    }

    pub fn maximize(&mut self, expr: LinearExpr) {
        self.builder.maximize(expr);
    }

    /// Solves under the given assumption literals. Every caller in this
    /// crate (the relaxation loop, the trim pass, and the MUS shrinker)
    /// builds a fresh model per solve rather than re-calling this on a
    /// reused `GuardedModel` with a shrinking assumption set, since it is
    /// not established that `add_assumptions` replaces rather than
    /// accumulates the builder's assumption list across repeated calls.
    pub fn solve(&mut self, config: &SolverConfig, assumptions: &[BoolVar]) -> CpSolverResponse {
        self.builder.add_assumptions(assumptions);
        let params = sat_parameters(config);
        self.builder.solve_with_parameters(&params)
    }
}

impl Default for GuardedModel {
    fn default() -> Self {
        Self::new()
    }
}

pub fn sat_parameters(config: &SolverConfig) -> SatParameters {
    let mut params = SatParameters::default();
    params.max_time_in_seconds = config.time_limit;
    params.num_search_workers = Some(config.num_search_workers);
    params.random_seed = config.seed.map(|s| s as i32);
    params.log_search_progress = Some(false);
    params
}

pub fn is_feasible(status: CpSolverStatus) -> bool {
    matches!(status, CpSolverStatus::Optimal | CpSolverStatus::Feasible)
}

pub fn is_infeasible(status: CpSolverStatus) -> bool {
    matches!(status, CpSolverStatus::Infeasible)
}

pub fn status_name(status: CpSolverStatus) -> String {
    format!("{status:?}").to_uppercase()
}

/// The literal (as proto variable indices) the solver reports as a
/// sufficient set of assumptions for infeasibility. Only meaningful when
/// `response.status()` is `Infeasible`.
pub fn core_indices(response: &CpSolverResponse) -> Vec<i32> {
    response.sufficient_assumptions_for_infeasibility.clone()
}

/// The underlying proto variable index backing a `BoolVar`, used to map a
/// reported core back to the rule enable literal it came from.
pub fn var_index(var: &BoolVar) -> i32 {
    var.index()
}
