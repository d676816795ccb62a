use std::collections::{BTreeSet, HashSet};

use serde_derive::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// Day-of-week letters as used by the source rosters (Spanish initials).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    L,
    M,
    X,
    J,
    V,
    S,
    D,
}

impl Weekday {
    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::S | Weekday::D)
    }

    /// V/S/D are the three "reduced coverage" weekday letters used by
    /// `min_assignments_per_day`.
    pub fn is_v_s_d(self) -> bool {
        matches!(self, Weekday::V | Weekday::S | Weekday::D)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub number: u32,
    pub day_of_week: Weekday,
}

/// Residency rank. `RE` denotes an external rotator, always excluded from
/// target sets via `external_rotations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    R1,
    R2,
    R3,
    R4,
    RE,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub name: String,
    pub rank: Rank,
}

/// The four shift-type codes, in their stable ordinal order. The ordinal
/// is used directly as the third coordinate of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    R,
    G,
    T,
    M,
}

pub const SHIFT_TYPES: [ShiftType; 4] =
    [ShiftType::R, ShiftType::G, ShiftType::T, ShiftType::M];

impl ShiftType {
    pub fn ordinal(self) -> usize {
        match self {
            ShiftType::R => 0,
            ShiftType::G => 1,
            ShiftType::T => 2,
            ShiftType::M => 3,
        }
    }

    pub fn from_ordinal(k: usize) -> Option<ShiftType> {
        SHIFT_TYPES.get(k).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ShiftType::R => "R",
            ShiftType::G => "G",
            ShiftType::T => "T",
            ShiftType::M => "M",
        }
    }

    pub fn from_name(name: &str) -> Result<ShiftType> {
        match name {
            "R" => Ok(ShiftType::R),
            "G" => Ok(ShiftType::G),
            "T" => Ok(ShiftType::T),
            "M" => Ok(ShiftType::M),
            other => Err(SchedulingError::UnknownShiftType {
                name: other.to_string(),
            }),
        }
    }
}

/// A pre-fixed (resident, day, shift-type) assignment the solver must honor.
pub type Preset = (usize, usize, usize);

/// Immutable scheduling problem instance. All relations are index sets over
/// `residents`/`days`; constructed once via `InstanceBuilder` and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub residents: Vec<Resident>,
    pub days: Vec<Day>,
    pub v_positions: HashSet<(usize, usize)>,
    pub u_positions: HashSet<(usize, usize)>,
    pub ut_positions: HashSet<(usize, usize)>,
    pub p_positions: HashSet<(usize, usize)>,
    pub extra_p_days: BTreeSet<u32>,
    pub external_rotations: HashSet<usize>,
    pub presets: HashSet<Preset>,
    end_of_month: usize,
    p_days: HashSet<usize>,
}

impl Instance {
    pub fn end_of_month(&self) -> usize {
        self.end_of_month
    }

    pub fn p_days(&self) -> &HashSet<usize> {
        &self.p_days
    }

    pub fn n_residents(&self) -> usize {
        self.residents.len()
    }

    pub fn n_days(&self) -> usize {
        self.days.len()
    }

    /// Whether (resident i, day j) falls within this resident's already
    /// counted emergency coverage (half a `ut` counts as half a `u`).
    pub fn u_count(&self, i: usize) -> usize {
        self.u_positions.iter().filter(|&&(r, _)| r == i).count()
    }

    pub fn ut_count(&self, i: usize) -> usize {
        self.ut_positions.iter().filter(|&&(r, _)| r == i).count()
    }
}

#[derive(Debug, Default)]
pub struct InstanceBuilder {
    residents: Vec<Resident>,
    days: Vec<Day>,
    v_positions: HashSet<(usize, usize)>,
    u_positions: HashSet<(usize, usize)>,
    ut_positions: HashSet<(usize, usize)>,
    p_positions: HashSet<(usize, usize)>,
    extra_p_days: BTreeSet<u32>,
    external_rotations: HashSet<usize>,
    presets: HashSet<Preset>,
}

impl InstanceBuilder {
    pub fn new(residents: Vec<Resident>, days: Vec<Day>) -> Self {
        InstanceBuilder {
            residents,
            days,
            ..Default::default()
        }
    }

    pub fn v_position(mut self, i: usize, j: usize) -> Self {
        self.v_positions.insert((i, j));
        self
    }

    pub fn u_position(mut self, i: usize, j: usize) -> Self {
        self.u_positions.insert((i, j));
        self
    }

    pub fn ut_position(mut self, i: usize, j: usize) -> Self {
        self.ut_positions.insert((i, j));
        self
    }

    pub fn p_position(mut self, i: usize, j: usize) -> Self {
        self.p_positions.insert((i, j));
        self
    }

    pub fn extra_p_day(mut self, day_number: u32) -> Self {
        self.extra_p_days.insert(day_number);
        self
    }

    pub fn external_rotation(mut self, i: usize) -> Self {
        self.external_rotations.insert(i);
        self
    }

    pub fn preset(mut self, i: usize, j: usize, k: usize) -> Self {
        self.presets.insert((i, j, k));
        self
    }

    /// Validates every index-based relation and derives `end_of_month` and
    /// `p_days`, producing an immutable `Instance`.
    pub fn build(self) -> Result<Instance> {
        let n_residents = self.residents.len();
        let n_days = self.days.len();

        let check = |what: &'static str, i: usize, len: usize| -> Result<()> {
            if i >= len {
                Err(SchedulingError::IndexOutOfRange { what, index: i, len })
            } else {
                Ok(())
            }
        };

        for &(i, j) in self
            .v_positions
            .iter()
            .chain(self.u_positions.iter())
            .chain(self.ut_positions.iter())
            .chain(self.p_positions.iter())
        {
            check("resident", i, n_residents)?;
            check("day", j, n_days)?;
        }
        for &i in &self.external_rotations {
            check("resident", i, n_residents)?;
        }

        let mut by_cell: std::collections::HashMap<(usize, usize), usize> =
            std::collections::HashMap::new();
        for &(i, j, k) in &self.presets {
            check("resident", i, n_residents)?;
            check("day", j, n_days)?;
            check("shift_type", k, crate::domain::SHIFT_TYPES.len())?;
            if let Some(&existing) = by_cell.get(&(i, j)) {
                if existing != k {
                    return Err(SchedulingError::PresetCollision {
                        resident: i,
                        day: j,
                        existing: ShiftType::from_ordinal(existing).unwrap().name().to_string(),
                        new: ShiftType::from_ordinal(k).unwrap().name().to_string(),
                    });
                }
            } else {
                by_cell.insert((i, j), k);
            }
        }

        let day_numbers: HashSet<u32> = self.days.iter().map(|d| d.number).collect();
        for &day_number in &self.extra_p_days {
            if !day_numbers.contains(&day_number) {
                return Err(SchedulingError::UnknownDayNumber { day_number });
            }
        }

        // The first day whose number strictly decreases versus its
        // predecessor marks the start of next month's trailing days.
        let mut end_of_month = n_days;
        for idx in 1..n_days {
            if self.days[idx].number < self.days[idx - 1].number {
                end_of_month = idx;
                break;
            }
        }

        let mut p_days: HashSet<usize> =
            self.p_positions.iter().map(|&(_, j)| j).collect();
        for (idx, day) in self.days.iter().enumerate() {
            if self.extra_p_days.contains(&day.number) {
                p_days.insert(idx);
            }
        }

        Ok(Instance {
            residents: self.residents,
            days: self.days,
            v_positions: self.v_positions,
            u_positions: self.u_positions,
            ut_positions: self.ut_positions,
            p_positions: self.p_positions,
            extra_p_days: self.extra_p_days,
            external_rotations: self.external_rotations,
            presets: self.presets,
            end_of_month,
            p_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(number: u32, dow: Weekday) -> Day {
        Day {
            number,
            day_of_week: dow,
        }
    }

    #[test]
    fn end_of_month_detects_the_rollover_day() {
        let residents = vec![Resident {
            name: "A".into(),
            rank: Rank::R3,
        }];
        let days = vec![
            day(29, Weekday::L),
            day(30, Weekday::M),
            day(1, Weekday::X),
            day(2, Weekday::J),
        ];
        let instance = InstanceBuilder::new(residents, days).build().unwrap();
        assert_eq!(instance.end_of_month(), 2);
    }

    #[test]
    fn end_of_month_defaults_to_len_when_no_rollover() {
        let residents = vec![Resident {
            name: "A".into(),
            rank: Rank::R3,
        }];
        let days = vec![day(1, Weekday::L), day(2, Weekday::M)];
        let instance = InstanceBuilder::new(residents, days).build().unwrap();
        assert_eq!(instance.end_of_month(), 2);
    }

    #[test]
    fn preset_collision_is_rejected() {
        let residents = vec![Resident {
            name: "A".into(),
            rank: Rank::R3,
        }];
        let days = vec![day(1, Weekday::L)];
        let result = InstanceBuilder::new(residents, days)
            .preset(0, 0, ShiftType::R.ordinal())
            .preset(0, 0, ShiftType::G.ordinal())
            .build();
        assert!(matches!(
            result,
            Err(SchedulingError::PresetCollision { .. })
        ));
    }

    #[test]
    fn extra_p_day_must_match_a_real_day_number() {
        let residents = vec![Resident {
            name: "A".into(),
            rank: Rank::R3,
        }];
        let days = vec![day(1, Weekday::L)];
        let result = InstanceBuilder::new(residents, days)
            .extra_p_day(17)
            .build();
        assert!(matches!(
            result,
            Err(SchedulingError::UnknownDayNumber { day_number: 17 })
        ));
    }
}
