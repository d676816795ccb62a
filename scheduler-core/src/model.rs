use cp_sat::builder::BoolVar;

use crate::cpsat::GuardedModel;
use crate::domain::{Instance, SHIFT_TYPES};

/// Dense `(resident, day, shift_type) -> X` variable table. Allocated in
/// full for every attempt; no pruning happens at allocation time, only at
/// constraint time.
pub struct Variables {
    vars: Vec<Vec<Vec<BoolVar>>>,
}

impl Variables {
    pub fn build(model: &mut GuardedModel, instance: &Instance) -> Self {
        let n_residents = instance.n_residents();
        let n_days = instance.n_days();
        let n_shift_types = SHIFT_TYPES.len();

        let mut vars = Vec::with_capacity(n_residents);
        for i in 0..n_residents {
            let mut per_day = Vec::with_capacity(n_days);
            for j in 0..n_days {
                let mut per_shift = Vec::with_capacity(n_shift_types);
                for k in 0..n_shift_types {
                    per_shift.push(model.new_bool_var(&format!("shift_{i}_{j}_{k}")));
                }
                per_day.push(per_shift);
            }
            vars.push(per_day);
        }
        Variables { vars }
    }

    pub fn at(&self, i: usize, j: usize, k: usize) -> &BoolVar {
        &self.vars[i][j][k]
    }

    pub fn for_day(&self, i: usize, j: usize) -> &[BoolVar] {
        &self.vars[i][j]
    }

    pub fn n_residents(&self) -> usize {
        self.vars.len()
    }

    pub fn n_days(&self) -> usize {
        self.vars.first().map(|d| d.len()).unwrap_or(0)
    }
}
