use thiserror::Error;

/// Fatal errors raised before or during model construction.
///
/// Solver outcomes (INFEASIBLE, UNKNOWN, ...) are never represented here -
/// those are values carried on `AssignmentResult`/`ValidationResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("rule '{rule_id}' refers to unknown class kind '{kind}'")]
    UnknownRuleKind { rule_id: String, kind: String },

    #[error("rule '{rule_id}' has an invalid target filter combination: {detail}")]
    InvalidTargetFilter { rule_id: String, detail: String },

    #[error("rule '{rule_id}' is missing required parameter '{param}'")]
    MissingRuleParam { rule_id: String, param: String },

    #[error("unknown shift type name '{name}'")]
    UnknownShiftType { name: String },

    #[error("two rule instances share the same rule_id '{rule_id}'")]
    DuplicateRuleId { rule_id: String },

    #[error(
        "preset collision at resident {resident}, day {day}: already fixed to {existing}, \
         new preset wants {new}"
    )]
    PresetCollision {
        resident: usize,
        day: usize,
        existing: String,
        new: String,
    },

    #[error("window size n_days={n_days} exceeds available days ({available})")]
    InvalidWindow { n_days: usize, available: usize },

    #[error("index out of range: {what} index {index} but only {len} available")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("extra holiday day number {day_number} does not match any day in the instance")]
    UnknownDayNumber { day_number: u32 },

    #[error("solver binding error: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
