use cp_sat::builder::{BoolVar, LinearExpr};

use crate::cpsat::{Cmp, GuardedModel};
use crate::domain::{Instance, ShiftType, Weekday, SHIFT_TYPES};
use crate::error::{Result, SchedulingError};
use crate::model::Variables;

use super::{RuleInstance, RuleKind};

fn sum_expr(lits: impl IntoIterator<Item = BoolVar>) -> LinearExpr {
    lits.into_iter()
        .map(|v| (1_i64, v))
        .collect::<Vec<(i64, BoolVar)>>()
        .into_iter()
        .collect()
}

fn day_shifts(vars: &Variables, i: usize, j: usize) -> LinearExpr {
    sum_expr(vars.for_day(i, j).iter().cloned())
}

fn non_r_day_shifts(vars: &Variables, i: usize, j: usize) -> LinearExpr {
    sum_expr(
        SHIFT_TYPES
            .iter()
            .filter(|k| **k != ShiftType::R)
            .map(|k| vars.at(i, j, k.ordinal()).clone()),
    )
}

/// Applies one rule instance to the model: allocates its enable literal,
/// emits its constraints guarded by that literal, and returns it.
pub fn apply_rule(
    model: &mut GuardedModel,
    instance: &Instance,
    vars: &Variables,
    rule: &RuleInstance,
) -> Result<BoolVar> {
    let rule_id = rule.rule_id();
    let enable = model.new_bool_var(&format!("enable_{rule_id}"));

    match &rule.class_kind {
        RuleKind::OneShiftPerDay => {
            for i in 0..vars.n_residents() {
                for j in 0..vars.n_days() {
                    model.guarded(Some(&enable), day_shifts(vars, i, j), Cmp::Le, 1);
                }
            }
        }
        RuleKind::AtMostOneResidentPerShiftPerDay => {
            for j in 0..vars.n_days() {
                for k in 0..SHIFT_TYPES.len() {
                    let expr = sum_expr(
                        (0..vars.n_residents()).map(|i| vars.at(i, j, k).clone()),
                    );
                    model.guarded(Some(&enable), expr, Cmp::Le, 1);
                }
            }
        }
        RuleKind::RestrictedDayOff => {
            for &(i, j) in &instance.v_positions {
                for k in 0..SHIFT_TYPES.len() {
                    model.guarded_fix(Some(&enable), vars.at(i, j, k), false);
                }
            }
        }
        RuleKind::ExternalRotationOff => {
            for &i in &instance.external_rotations {
                for j in 0..vars.n_days() {
                    for k in 0..SHIFT_TYPES.len() {
                        model.guarded_fix(Some(&enable), vars.at(i, j, k), false);
                    }
                }
            }
        }
        RuleKind::NoROnWeekendsOrHolidays => {
            for i in 0..vars.n_residents() {
                for (j, day) in instance.days.iter().enumerate() {
                    if day.day_of_week.is_weekend() || instance.p_days().contains(&j) {
                        model.guarded_fix(
                            Some(&enable),
                            vars.at(i, j, ShiftType::R.ordinal()),
                            false,
                        );
                    }
                }
            }
        }
        RuleKind::RestAfterAnyShift => {
            for i in 0..vars.n_residents() {
                for j in 0..vars.n_days().saturating_sub(1) {
                    let expr = day_shifts(vars, i, j) + day_shifts(vars, i, j + 1);
                    model.guarded(Some(&enable), expr, Cmp::Le, 1);
                }
            }
        }
        RuleKind::BlockAroundEmergencyU => {
            let n_days = vars.n_days();
            for &(i, j) in &instance.u_positions {
                let block_neighbors = j > 0 && j + 1 < n_days;
                for k in 0..SHIFT_TYPES.len() {
                    model.guarded_fix(Some(&enable), vars.at(i, j, k), false);
                    if block_neighbors {
                        model.guarded_fix(Some(&enable), vars.at(i, j - 1, k), false);
                        model.guarded_fix(Some(&enable), vars.at(i, j + 1, k), false);
                    }
                }
            }
        }
        RuleKind::BlockAroundEmergencyUt => {
            for &(i, j) in &instance.ut_positions {
                for k in 0..SHIFT_TYPES.len() {
                    model.guarded_fix(Some(&enable), vars.at(i, j, k), false);
                    if j > 0 {
                        model.guarded_fix(Some(&enable), vars.at(i, j - 1, k), false);
                    }
                }
            }
        }
        RuleKind::EnforcePresets => {
            for &(i, j, k) in &instance.presets {
                model.guarded_fix(Some(&enable), vars.at(i, j, k), true);
            }
        }
        RuleKind::OnlyPresetsForTargets { filter } => {
            for i in filter.targets(instance) {
                for j in 0..vars.n_days() {
                    for k in 0..SHIFT_TYPES.len() {
                        if !instance.presets.contains(&(i, j, k)) {
                            model.guarded_fix(Some(&enable), vars.at(i, j, k), false);
                        }
                    }
                }
            }
        }
        RuleKind::HolidayAssignedMustWork => {
            for &(i, j) in &instance.p_positions {
                model.guarded(Some(&enable), day_shifts(vars, i, j), Cmp::Eq, 1);
            }
        }
        RuleKind::CoverGOrTEachDay => {
            for j in 0..vars.n_days() {
                let expr = sum_expr((0..vars.n_residents()).flat_map(|i| {
                    [
                        vars.at(i, j, ShiftType::G.ordinal()).clone(),
                        vars.at(i, j, ShiftType::T.ordinal()).clone(),
                    ]
                }));
                model.guarded(Some(&enable), expr, Cmp::Ge, 1);
            }
        }
        RuleKind::SeniorGOrTRequiresOtherCoverage { ranks } => {
            for i in 0..vars.n_residents() {
                if !ranks.contains(&instance.residents[i].rank) {
                    continue;
                }
                for j in 0..vars.n_days() {
                    let other_t = sum_expr((0..vars.n_residents()).filter(|&o| o != i).map(|o| {
                        vars.at(o, j, ShiftType::T.ordinal()).clone()
                    }));
                    let x_g = vars.at(i, j, ShiftType::G.ordinal()).clone();
                    model.guarded(Some(&enable), other_t - x_g, Cmp::Ge, 0);

                    let other_g = sum_expr((0..vars.n_residents()).filter(|&o| o != i).map(|o| {
                        vars.at(o, j, ShiftType::G.ordinal()).clone()
                    }));
                    let x_t = vars.at(i, j, ShiftType::T.ordinal()).clone();
                    model.guarded(Some(&enable), other_g - x_t, Cmp::Ge, 0);
                }
            }
        }
        RuleKind::MinAssignmentsPerDay => {
            for (j, day) in instance.days.iter().enumerate() {
                let rhs = if day.day_of_week.is_v_s_d() || instance.p_days().contains(&j) {
                    1
                } else {
                    2
                };
                let expr = sum_expr((0..vars.n_residents()).flat_map(|i| vars.for_day(i, j).to_vec()));
                // Strict `>` preserved verbatim; see DESIGN.md open question.
                model.guarded(Some(&enable), expr, Cmp::Gt, rhs);
            }
        }
        RuleKind::NotSameTypeUncoveredBothWeekendDays => {
            let n_days = vars.n_days();
            for j in 0..n_days {
                if instance.days[j].day_of_week != Weekday::S || j + 1 >= n_days {
                    continue;
                }
                for k in 0..SHIFT_TYPES.len() {
                    if SHIFT_TYPES[k] == ShiftType::R {
                        continue;
                    }
                    let expr = sum_expr(
                        (0..vars.n_residents())
                            .map(|i| vars.at(i, j, k).clone())
                            .chain((0..vars.n_residents()).map(|i| vars.at(i, j + 1, k).clone())),
                    );
                    model.guarded(Some(&enable), expr, Cmp::Ge, 1);
                }
            }
        }
        RuleKind::TotalNumberOfShifts { filter, total } => {
            for i in filter.targets(instance) {
                let u = instance.u_count(i) as i64;
                let ut = instance.ut_count(i) as i64;
                let rhs = (*total - u - ut / 2).max(0);
                let expr = sum_expr((0..instance.end_of_month()).flat_map(|j| vars.for_day(i, j).to_vec()));
                model.guarded(Some(&enable), expr, Cmp::Eq, rhs);
            }
        }
        RuleKind::TargetsDoAtLeastOfType { filter, types } => {
            for i in filter.targets(instance) {
                for t in types {
                    let expr = sum_expr((0..instance.end_of_month()).map(|j| vars.at(i, j, t.ordinal()).clone()));
                    model.guarded(Some(&enable), expr, Cmp::Ge, 1);
                }
            }
        }
        RuleKind::TargetsDoNotDoType { filter, types } => {
            for i in filter.targets(instance) {
                for t in types {
                    for j in 0..vars.n_days() {
                        model.guarded_fix(Some(&enable), vars.at(i, j, t.ordinal()), false);
                    }
                }
            }
        }
        RuleKind::MaxTwoPerTypeForTargets { filter } => {
            for i in filter.targets(instance) {
                for k in 0..SHIFT_TYPES.len() {
                    let expr = sum_expr((0..instance.end_of_month()).map(|j| vars.at(i, j, k).clone()));
                    model.guarded(Some(&enable), expr, Cmp::Le, 2);
                }
            }
        }
        RuleKind::AtLeastOneWeekendForTargets { filter } => {
            for i in filter.targets(instance) {
                let expr = sum_expr((0..instance.end_of_month()).filter(|&j| instance.days[j].day_of_week.is_weekend()).flat_map(|j| vars.for_day(i, j).to_vec()));
                model.guarded(Some(&enable), expr, Cmp::Ge, 1);
            }
        }
        RuleKind::FridayRequiresSunday { filter } => {
            let n_days = vars.n_days();
            for i in filter.targets(instance) {
                for j in 0..n_days {
                    if instance.days[j].day_of_week != Weekday::V || j + 2 >= n_days {
                        continue;
                    }
                    let friday_non_r = non_r_day_shifts(vars, i, j);
                    let sunday_all = day_shifts(vars, i, j + 2);
                    model.guarded(Some(&enable), friday_non_r - sunday_all, Cmp::Eq, 0);
                }
            }
        }
        RuleKind::SundayDifferentTypeThanFriday { filter } => {
            let n_days = vars.n_days();
            for i in filter.targets(instance) {
                for j in 0..n_days {
                    if instance.days[j].day_of_week != Weekday::V || j + 2 >= n_days {
                        continue;
                    }
                    for k in 0..SHIFT_TYPES.len() {
                        let expr = LinearExpr::from(vars.at(i, j, k).clone())
                            + LinearExpr::from(vars.at(i, j + 2, k).clone());
                        model.guarded(Some(&enable), expr, Cmp::Le, 1);
                    }
                }
            }
        }
        RuleKind::BlockMondayAfterSaturdayShiftTargets { filter } => {
            let n_days = vars.n_days();
            for i in filter.targets(instance) {
                for j in 0..n_days {
                    if instance.days[j].day_of_week != Weekday::S || j + 2 >= n_days {
                        continue;
                    }
                    let expr = day_shifts(vars, i, j) + day_shifts(vars, i, j + 2);
                    model.guarded(Some(&enable), expr, Cmp::Le, 1);
                }
            }
        }
        RuleKind::BlockMondayAfterSatEmergency { filter } => {
            let n_days = vars.n_days();
            let targets: std::collections::HashSet<usize> = filter.targets(instance).into_iter().collect();
            for &(i, j) in &instance.u_positions {
                if !targets.contains(&i) {
                    continue;
                }
                if instance.days[j].day_of_week != Weekday::S || j + 2 >= n_days {
                    continue;
                }
                for k in 0..SHIFT_TYPES.len() {
                    model.guarded_fix(Some(&enable), vars.at(i, j + 2, k), false);
                }
            }
        }
        RuleKind::MaxWeekendShiftsForTargets { filter, max } => {
            for i in filter.targets(instance) {
                let weekend_u = instance
                    .u_positions
                    .iter()
                    .filter(|&&(r, j)| r == i && instance.days[j].day_of_week.is_weekend())
                    .count() as i64;
                let weekend_ut = instance
                    .ut_positions
                    .iter()
                    .filter(|&&(r, j)| r == i && instance.days[j].day_of_week.is_weekend())
                    .count() as i64;
                let rhs = max - weekend_u - weekend_ut;
                let expr = sum_expr(
                    (0..vars.n_days())
                        .filter(|&j| instance.days[j].day_of_week.is_weekend())
                        .flat_map(|j| vars.for_day(i, j).to_vec()),
                );
                model.guarded(Some(&enable), expr, Cmp::Le, rhs);
            }
        }
        RuleKind::WeekendBalanceForTargets { filter } => {
            for i in filter.targets(instance) {
                let sat_expr = sum_expr(
                    (0..instance.end_of_month())
                        .filter(|&j| instance.days[j].day_of_week == Weekday::S)
                        .flat_map(|j| vars.for_day(i, j).to_vec()),
                );
                let sun_expr = sum_expr(
                    (0..instance.end_of_month())
                        .filter(|&j| instance.days[j].day_of_week == Weekday::D)
                        .flat_map(|j| vars.for_day(i, j).to_vec()),
                );
                model.guarded(Some(&enable), sat_expr.clone() - sun_expr.clone(), Cmp::Le, 1);
                model.guarded(Some(&enable), sun_expr - sat_expr, Cmp::Le, 1);
            }
        }
        RuleKind::MaxOneSundayForTargets { filter } => {
            for i in filter.targets(instance) {
                let expr = sum_expr(
                    (0..instance.end_of_month())
                        .filter(|&j| instance.days[j].day_of_week == Weekday::D)
                        .flat_map(|j| vars.for_day(i, j).to_vec()),
                );
                model.guarded(Some(&enable), expr, Cmp::Le, 1);
            }
        }
        RuleKind::NoMShiftsInNDays {
            filter,
            m_shifts,
            n_days: window,
        } => {
            let n_days = vars.n_days();
            if *window > n_days {
                return Err(SchedulingError::InvalidWindow {
                    n_days: *window,
                    available: n_days,
                });
            }
            if *m_shifts == 0 {
                return Err(SchedulingError::MissingRuleParam {
                    rule_id: rule_id.clone(),
                    param: "m_shifts".to_string(),
                });
            }
            for i in filter.targets(instance) {
                let windows = n_days.saturating_sub(*window - 1);
                for start in 0..windows {
                    let window_range = start..start + window;
                    let u_extra = instance
                        .u_positions
                        .iter()
                        .filter(|&&(r, j)| r == i && window_range.contains(&j))
                        .count() as i64;
                    let expr = sum_expr(
                        window_range
                            .clone()
                            .flat_map(|j| vars.for_day(i, j).to_vec()),
                    );
                    model.guarded(Some(&enable), expr, Cmp::Lt, *m_shifts as i64 - u_extra);
                }
            }
        }
    }

    Ok(enable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Day, InstanceBuilder, Rank, Resident};
    use crate::rules::TargetFilter;

    fn toy_instance() -> Instance {
        let residents = vec![
            Resident { name: "A".into(), rank: Rank::R1 },
            Resident { name: "B".into(), rank: Rank::R3 },
        ];
        let days = vec![
            Day { number: 1, day_of_week: Weekday::L },
            Day { number: 2, day_of_week: Weekday::M },
        ];
        InstanceBuilder::new(residents, days).build().unwrap()
    }

    #[test]
    fn target_filter_excludes_external_rotations() {
        let mut instance = toy_instance();
        instance.external_rotations.insert(0);
        let filter = TargetFilter::All;
        assert_eq!(filter.targets(&instance), vec![1]);
    }

    #[test]
    fn include_ranks_exclude_names_combo() {
        let instance = toy_instance();
        let filter = TargetFilter::IncludeRanksExcludeNames {
            include_ranks: vec![Rank::R1, Rank::R3],
            exclude_names: vec!["B".to_string()],
        };
        assert_eq!(filter.targets(&instance), vec![0]);
    }
}
