//! Monthly on-call shift assignment for hospital residents.
//!
//! Given an [`Instance`](domain::Instance) and an ordered policy of
//! [`RuleInstance`](rules::RuleInstance)s, [`assign`](solve::assign) builds
//! a CP-SAT model, relaxes the least important rule it can whenever the
//! current policy is infeasible, and returns a maximum-coverage matrix
//! together with the list of rules it had to give up. [`validate`] checks
//! a policy without relaxing anything and, on infeasibility, returns a
//! subset-minimal explanation (a minimal unsatisfiable subset of rules).
//!
//! Every rule guards its constraints behind a boolean "enable" literal
//! passed to the solver as an assumption; the solver's own infeasibility
//! core, translated back through [`core_mapping`], is what drives both the
//! relaxation loop and the MUS shrinker.

pub mod assemble;
pub mod config;
pub mod core_mapping;
pub mod cpsat;
pub mod domain;
pub mod error;
pub mod model;
pub mod mus;
pub mod rules;
pub mod solve;

pub use config::SolverConfig;
pub use domain::{Day, Instance, InstanceBuilder, Rank, Resident, ShiftType, Weekday};
pub use error::{Result, SchedulingError};
pub use rules::{RuleInstance, RuleKind, TargetFilter};
pub use solve::{assign, validate, AssignmentResult, Matrix, ValidationResult};
