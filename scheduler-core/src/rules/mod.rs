pub mod catalogue;

use serde_derive::{Deserialize, Serialize};

use crate::domain::{Instance, Rank, Resident, ShiftType};
use crate::error::{Result, SchedulingError};

/// Which residents a rule applies to. The legal combinations mirror the
/// original: any single filter alone, or exactly one of the two named
/// two-filter combinations. Residents on `external_rotations` are removed
/// from every target set before the rule ever sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    All,
    IncludeRanks(Vec<Rank>),
    ExcludeRanks(Vec<Rank>),
    IncludeNames(Vec<String>),
    ExcludeNames(Vec<String>),
    IncludeRanksExcludeNames {
        include_ranks: Vec<Rank>,
        exclude_names: Vec<String>,
    },
    ExcludeRanksIncludeNames {
        exclude_ranks: Vec<Rank>,
        include_names: Vec<String>,
    },
}

impl TargetFilter {
    fn matches(&self, resident: &Resident) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::IncludeRanks(ranks) => ranks.contains(&resident.rank),
            TargetFilter::ExcludeRanks(ranks) => !ranks.contains(&resident.rank),
            TargetFilter::IncludeNames(names) => names.iter().any(|n| n == &resident.name),
            TargetFilter::ExcludeNames(names) => !names.iter().any(|n| n == &resident.name),
            TargetFilter::IncludeRanksExcludeNames {
                include_ranks,
                exclude_names,
            } => {
                include_ranks.contains(&resident.rank)
                    && !exclude_names.iter().any(|n| n == &resident.name)
            }
            TargetFilter::ExcludeRanksIncludeNames {
                exclude_ranks,
                include_names,
            } => {
                !exclude_ranks.contains(&resident.rank)
                    || include_names.iter().any(|n| n == &resident.name)
            }
        }
    }

    /// Resolves this filter against an instance into a concrete, ordered
    /// set of resident indices, always excluding external rotators first.
    pub fn targets(&self, instance: &Instance) -> Vec<usize> {
        instance
            .residents
            .iter()
            .enumerate()
            .filter(|(i, _)| !instance.external_rotations.contains(i))
            .filter(|(_, r)| self.matches(r))
            .map(|(i, _)| i)
            .collect()
    }
}

/// A closed catalogue of rule kinds. Each variant carries whatever
/// kind-specific parameters its constraint needs; the applier in
/// `catalogue` matches on this enum instead of any dynamic dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleKind {
    OneShiftPerDay,
    AtMostOneResidentPerShiftPerDay,
    RestrictedDayOff,
    ExternalRotationOff,
    NoROnWeekendsOrHolidays,
    RestAfterAnyShift,
    BlockAroundEmergencyU,
    BlockAroundEmergencyUt,
    EnforcePresets,
    OnlyPresetsForTargets { filter: TargetFilter },
    HolidayAssignedMustWork,
    CoverGOrTEachDay,
    SeniorGOrTRequiresOtherCoverage { ranks: Vec<Rank> },
    MinAssignmentsPerDay,
    NotSameTypeUncoveredBothWeekendDays,
    TotalNumberOfShifts { filter: TargetFilter, total: i64 },
    TargetsDoAtLeastOfType { filter: TargetFilter, types: Vec<ShiftType> },
    TargetsDoNotDoType { filter: TargetFilter, types: Vec<ShiftType> },
    MaxTwoPerTypeForTargets { filter: TargetFilter },
    AtLeastOneWeekendForTargets { filter: TargetFilter },
    FridayRequiresSunday { filter: TargetFilter },
    SundayDifferentTypeThanFriday { filter: TargetFilter },
    BlockMondayAfterSaturdayShiftTargets { filter: TargetFilter },
    BlockMondayAfterSatEmergency { filter: TargetFilter },
    MaxWeekendShiftsForTargets { filter: TargetFilter, max: i64 },
    WeekendBalanceForTargets { filter: TargetFilter },
    MaxOneSundayForTargets { filter: TargetFilter },
    NoMShiftsInNDays { filter: TargetFilter, m_shifts: usize, n_days: usize },
}

impl RuleKind {
    /// The stable class id used as the default `rule_id` and as the
    /// canonical name baked into `enable_{id}` literal names.
    pub fn class_id(&self) -> &'static str {
        match self {
            RuleKind::OneShiftPerDay => "one_shift_per_day",
            RuleKind::AtMostOneResidentPerShiftPerDay => "at_most_one_resident_per_shift_per_day",
            RuleKind::RestrictedDayOff => "restricted_day_off",
            RuleKind::ExternalRotationOff => "external_rotation_off",
            RuleKind::NoROnWeekendsOrHolidays => "no_r_on_weekends_or_holidays",
            RuleKind::RestAfterAnyShift => "rest_after_any_shift",
            RuleKind::BlockAroundEmergencyU => "block_around_emergency_u",
            RuleKind::BlockAroundEmergencyUt => "block_around_emergency_ut",
            RuleKind::EnforcePresets => "enforce_presets",
            RuleKind::OnlyPresetsForTargets { .. } => "only_presets_for_targets",
            RuleKind::HolidayAssignedMustWork => "holiday_assigned_must_work",
            RuleKind::CoverGOrTEachDay => "cover_g_or_t_each_day",
            RuleKind::SeniorGOrTRequiresOtherCoverage { .. } => {
                "senior_g_or_t_requires_other_coverage"
            }
            RuleKind::MinAssignmentsPerDay => "min_assignments_per_day",
            RuleKind::NotSameTypeUncoveredBothWeekendDays => {
                "not_same_type_uncovered_both_weekend_days"
            }
            RuleKind::TotalNumberOfShifts { .. } => "total_number_of_shifts",
            RuleKind::TargetsDoAtLeastOfType { .. } => "targets_do_at_least_of_type",
            RuleKind::TargetsDoNotDoType { .. } => "targets_do_not_do_type",
            RuleKind::MaxTwoPerTypeForTargets { .. } => "max_two_per_type_for_targets",
            RuleKind::AtLeastOneWeekendForTargets { .. } => "at_least_one_weekend_for_targets",
            RuleKind::FridayRequiresSunday { .. } => "friday_requires_sunday",
            RuleKind::SundayDifferentTypeThanFriday { .. } => "sunday_different_type_than_friday",
            RuleKind::BlockMondayAfterSaturdayShiftTargets { .. } => {
                "block_monday_after_saturday_shift_targets"
            }
            RuleKind::BlockMondayAfterSatEmergency { .. } => "block_monday_after_sat_emergency",
            RuleKind::MaxWeekendShiftsForTargets { .. } => "max_weekend_shifts_for_targets",
            RuleKind::WeekendBalanceForTargets { .. } => "weekend_balance_for_targets",
            RuleKind::MaxOneSundayForTargets { .. } => "max_one_sunday_for_targets",
            RuleKind::NoMShiftsInNDays { .. } => "no_m_shifts_in_n_days",
        }
    }

    /// Class-level default relaxation priority (0 = hard, never relaxed
    /// before anything else; larger = more willingly disabled).
    pub fn default_priority(&self) -> i32 {
        match self {
            RuleKind::OneShiftPerDay
            | RuleKind::AtMostOneResidentPerShiftPerDay
            | RuleKind::RestrictedDayOff
            | RuleKind::ExternalRotationOff
            | RuleKind::NoROnWeekendsOrHolidays
            | RuleKind::RestAfterAnyShift
            | RuleKind::BlockAroundEmergencyU
            | RuleKind::BlockAroundEmergencyUt
            | RuleKind::EnforcePresets
            | RuleKind::HolidayAssignedMustWork
            | RuleKind::TargetsDoNotDoType { .. }
            | RuleKind::NoMShiftsInNDays { .. } => 0,
            RuleKind::CoverGOrTEachDay
            | RuleKind::SeniorGOrTRequiresOtherCoverage { .. }
            | RuleKind::MinAssignmentsPerDay
            | RuleKind::NotSameTypeUncoveredBothWeekendDays
            | RuleKind::AtLeastOneWeekendForTargets { .. }
            | RuleKind::FridayRequiresSunday { .. } => 1,
            RuleKind::OnlyPresetsForTargets { .. } => 2,
            RuleKind::TotalNumberOfShifts { .. } => 2,
            RuleKind::SundayDifferentTypeThanFriday { .. } => 2,
            RuleKind::BlockMondayAfterSatEmergency { .. } => 4,
            RuleKind::TargetsDoAtLeastOfType { .. }
            | RuleKind::MaxTwoPerTypeForTargets { .. }
            | RuleKind::BlockMondayAfterSaturdayShiftTargets { .. }
            | RuleKind::MaxWeekendShiftsForTargets { .. }
            | RuleKind::WeekendBalanceForTargets { .. }
            | RuleKind::MaxOneSundayForTargets { .. } => 3,
        }
    }
}

/// One applied rule: its kind, its effective id (defaulting to the class
/// id), and its effective priority (defaulting to the class default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInstance {
    pub class_kind: RuleKind,
    id_override: Option<String>,
    priority_override: Option<i32>,
}

impl RuleInstance {
    pub fn new(class_kind: RuleKind) -> Self {
        RuleInstance {
            class_kind,
            id_override: None,
            priority_override: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id_override = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority_override = Some(priority);
        self
    }

    pub fn rule_id(&self) -> String {
        self.id_override
            .clone()
            .unwrap_or_else(|| self.class_kind.class_id().to_string())
    }

    pub fn priority(&self) -> i32 {
        self.priority_override
            .unwrap_or_else(|| self.class_kind.default_priority())
    }
}

/// Validates that no two rule instances in a policy share a `rule_id`.
pub fn check_unique_ids(rules: &[RuleInstance]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for rule in rules {
        let id = rule.rule_id();
        if !seen.insert(id.clone()) {
            return Err(SchedulingError::DuplicateRuleId { rule_id: id });
        }
    }
    Ok(())
}
