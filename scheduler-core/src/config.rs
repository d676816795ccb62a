/// Parameters threaded into every CP-SAT invocation made while assembling
/// an `assign` or `validate` call.
///
/// This is the crate's whole configuration surface; the spreadsheet/YAML
/// header that picks which month to run belongs to the embedding driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Per-solve wall clock budget, in seconds. `None` means no limit.
    pub time_limit: Option<f64>,
    /// Fixed seed for deterministic search. `None` lets the solver pick.
    pub seed: Option<i64>,
    /// Number of parallel search workers. Use `1` for full determinism.
    pub num_search_workers: i32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: Some(30.0),
            seed: Some(1),
            num_search_workers: 1,
        }
    }
}
