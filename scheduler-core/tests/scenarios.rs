use scheduler_core::domain::{Day, InstanceBuilder, Rank, Resident, ShiftType, Weekday};
use scheduler_core::rules::{RuleInstance, RuleKind, TargetFilter};
use scheduler_core::{assign, validate, SolverConfig};

fn residents(ranks: &[Rank]) -> Vec<Resident> {
    ranks
        .iter()
        .enumerate()
        .map(|(idx, rank)| Resident {
            name: format!("R{idx}"),
            rank: *rank,
        })
        .collect()
}

fn days(weekdays: &[Weekday]) -> Vec<Day> {
    weekdays
        .iter()
        .enumerate()
        .map(|(idx, dow)| Day {
            number: idx as u32 + 1,
            day_of_week: *dow,
        })
        .collect()
}

fn config() -> SolverConfig {
    SolverConfig {
        time_limit: Some(5.0),
        seed: Some(7),
        num_search_workers: 1,
    }
}

/// Two residents, two days, and only the two bedrock physical rules: the
/// coverage objective should fill every cell without relaxing anything.
#[test]
fn trivial_instance_maximizes_coverage_without_relaxation() {
    let instance = InstanceBuilder::new(residents(&[Rank::R3, Rank::R3]), days(&[Weekday::L, Weekday::M]))
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::AtMostOneResidentPerShiftPerDay),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    assert_eq!(result.relaxed_rules, Vec::<String>::new());
    let matrix = result.matrix.expect("feasible");
    let filled: usize = matrix
        .iter()
        .flat_map(|row| row.iter())
        .filter(|cell| !cell.is_empty())
        .count();
    assert_eq!(filled, 4);
    assert_eq!(result.objective, Some(4.0));
}

/// A fixed (resident, day, shift) preset must survive into the final matrix.
#[test]
fn preset_enforcement_is_honored() {
    let instance = InstanceBuilder::new(residents(&[Rank::R3]), days(&[Weekday::L]))
        .preset(0, 0, ShiftType::G.ordinal())
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::EnforcePresets),
        RuleInstance::new(RuleKind::OneShiftPerDay),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    let matrix = result.matrix.expect("feasible");
    assert_eq!(matrix[0][0], "G");
    assert_eq!(result.objective, Some(1.0));
}

/// The day of (and the days immediately around) an emergency `u` position
/// must stay empty once `block_around_emergency_u` is applied.
#[test]
fn emergency_blocks_the_surrounding_days() {
    let instance = InstanceBuilder::new(
        residents(&[Rank::R2]),
        days(&[Weekday::L, Weekday::M, Weekday::X]),
    )
    .u_position(0, 1)
    .build()
    .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::BlockAroundEmergencyU),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    let matrix = result.matrix.expect("feasible");
    assert_eq!(matrix[0], vec!["".to_string(), "".to_string(), "".to_string()]);
    assert_eq!(result.objective, Some(0.0));
}

/// A single resident cannot plausibly cover all four shift types in a
/// single day, so the workload rule asking for that must be relaxed away.
#[test]
fn infeasible_workload_rule_gets_relaxed() {
    let instance = InstanceBuilder::new(residents(&[Rank::R1]), days(&[Weekday::L]))
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::TargetsDoAtLeastOfType {
            filter: TargetFilter::All,
            types: vec![ShiftType::R, ShiftType::G, ShiftType::T, ShiftType::M],
        }),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    assert_eq!(
        result.relaxed_rules,
        vec!["targets_do_at_least_of_type".to_string()]
    );
    let matrix = result.matrix.expect("feasible after relaxation");
    assert!(!matrix[0][0].is_empty());
    let core = result.unsat_core.expect("a core was recorded");
    assert!(core.contains(&"targets_do_at_least_of_type".to_string()));
}

/// A holiday assignment on a day the only resident is restricted from
/// working is structurally infeasible; `validate` must report a core that
/// names both contributing rules and is subset-minimal (dropping the
/// unrelated `one_shift_per_day` rule, which never contributes).
#[test]
fn validate_reports_a_minimal_core() {
    let instance = InstanceBuilder::new(residents(&[Rank::R3]), days(&[Weekday::L]))
        .v_position(0, 0)
        .p_position(0, 0)
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::RestrictedDayOff),
        RuleInstance::new(RuleKind::HolidayAssignedMustWork),
        RuleInstance::new(RuleKind::OneShiftPerDay),
    ];
    let result = validate(&instance, &rules, &config()).unwrap();
    assert_eq!(result.solver_status, "INFEASIBLE");
    let core = result.unsat_core.expect("infeasible validation reports a core");
    assert!(core.contains(&"restricted_day_off".to_string()));
    assert!(core.contains(&"holiday_assigned_must_work".to_string()));
    assert!(!core.contains(&"one_shift_per_day".to_string()));
}

/// An empty policy still yields a feasible, maximum-coverage matrix with
/// nothing relaxed, since there is nothing to relax.
#[test]
fn empty_policy_still_maximizes_coverage() {
    let instance = InstanceBuilder::new(residents(&[Rank::R2]), days(&[Weekday::L]))
        .build()
        .unwrap();
    let result = assign(&instance, &[], &config()).unwrap();
    assert_eq!(result.relaxed_rules, Vec::<String>::new());
    assert!(result.matrix.is_some());
}

/// A resident never appears assigned on a `v_position` day once
/// `restricted_day_off` holds.
#[test]
fn v_positions_are_never_assigned() {
    let instance = InstanceBuilder::new(
        residents(&[Rank::R2, Rank::R2]),
        days(&[Weekday::L, Weekday::M]),
    )
    .v_position(0, 1)
    .build()
    .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::AtMostOneResidentPerShiftPerDay),
        RuleInstance::new(RuleKind::RestrictedDayOff),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    let matrix = result.matrix.expect("feasible");
    assert_eq!(matrix[0][1], "");
}

/// A resident on an external rotation never appears assigned anywhere,
/// even on days with otherwise open coverage.
#[test]
fn external_rotations_are_never_assigned() {
    let instance = InstanceBuilder::new(
        residents(&[Rank::RE, Rank::R2]),
        days(&[Weekday::L, Weekday::M]),
    )
    .external_rotation(0)
    .build()
    .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::AtMostOneResidentPerShiftPerDay),
        RuleInstance::new(RuleKind::ExternalRotationOff),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    let matrix = result.matrix.expect("feasible");
    assert!(matrix[0].iter().all(|cell| cell.is_empty()));
}

/// Duplicate rule ids are a configuration error, not a panic.
#[test]
fn duplicate_rule_ids_are_rejected() {
    let instance = InstanceBuilder::new(residents(&[Rank::R2]), days(&[Weekday::L]))
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay).with_id("dup"),
        RuleInstance::new(RuleKind::AtMostOneResidentPerShiftPerDay).with_id("dup"),
    ];
    let err = assign(&instance, &rules, &config()).unwrap_err();
    assert!(matches!(
        err,
        scheduler_core::SchedulingError::DuplicateRuleId { .. }
    ));
}

/// Cascading relaxation can overshoot: a rule relaxed only because it
/// clashed with a second rule that later gets relaxed in its own right
/// should be restored by the trim pass, leaving the final `relaxed_rules`
/// shorter than the peak reached during the search.
#[test]
fn trim_pass_restores_a_rule_whose_only_conflict_was_relaxed_away() {
    let instance = InstanceBuilder::new(residents(&[Rank::R2]), days(&[Weekday::L, Weekday::M]))
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::TargetsDoAtLeastOfType {
            filter: TargetFilter::All,
            types: vec![ShiftType::G],
        })
        .with_id("wants_g")
        .with_priority(5),
        RuleInstance::new(RuleKind::TargetsDoNotDoType {
            filter: TargetFilter::All,
            types: vec![ShiftType::G],
        })
        .with_id("forbids_g")
        .with_priority(2),
        RuleInstance::new(RuleKind::TargetsDoAtLeastOfType {
            filter: TargetFilter::All,
            types: vec![ShiftType::G],
        })
        .with_id("also_wants_g")
        .with_priority(0),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    let matrix = result.matrix.expect("feasible after relaxation and trim");

    // `wants_g` and `forbids_g` directly contradict each other; `wants_g`
    // is the more relaxable of the two and goes first. That alone isn't
    // enough, since `forbids_g` still contradicts the hard `also_wants_g`,
    // so `forbids_g` is relaxed next. With `forbids_g` gone, `wants_g`'s
    // only antagonist is gone too, so the trim pass restores it.
    assert_eq!(result.relaxed_rules, vec!["forbids_g".to_string()]);
    assert!(matrix[0].iter().any(|cell| cell == "G"));
}

/// A rule whose target filter resolves to no residents at all posts no
/// constraints and therefore is never a candidate for relaxation.
#[test]
fn empty_target_filter_never_needs_relaxing() {
    let instance = InstanceBuilder::new(residents(&[Rank::R3]), days(&[Weekday::L]))
        .build()
        .unwrap();
    let rules = vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::TargetsDoAtLeastOfType {
            filter: TargetFilter::IncludeRanks(vec![Rank::R4]),
            types: vec![ShiftType::R, ShiftType::G, ShiftType::T, ShiftType::M],
        }),
    ];
    let result = assign(&instance, &rules, &config()).unwrap();
    assert_eq!(result.relaxed_rules, Vec::<String>::new());
    assert!(result.matrix.is_some());
}
