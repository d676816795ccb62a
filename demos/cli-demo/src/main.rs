use scheduler_core::domain::{Day, InstanceBuilder, Rank, Resident, ShiftType, Weekday};
use scheduler_core::rules::{RuleInstance, RuleKind, TargetFilter};
use scheduler_core::{assign, validate, SolverConfig};

fn demo_instance() -> scheduler_core::Instance {
    let residents = vec![
        Resident { name: "Alba".into(), rank: Rank::R1 },
        Resident { name: "Bruno".into(), rank: Rank::R2 },
        Resident { name: "Clara".into(), rank: Rank::R3 },
        Resident { name: "Diego".into(), rank: Rank::R4 },
    ];

    let days = vec![
        Day { number: 1, day_of_week: Weekday::L },
        Day { number: 2, day_of_week: Weekday::M },
        Day { number: 3, day_of_week: Weekday::X },
        Day { number: 4, day_of_week: Weekday::J },
        Day { number: 5, day_of_week: Weekday::V },
        Day { number: 6, day_of_week: Weekday::S },
        Day { number: 7, day_of_week: Weekday::D },
    ];

    InstanceBuilder::new(residents, days)
        .u_position(1, 3)
        .build()
        .expect("demo instance is well-formed")
}

fn demo_policy() -> Vec<RuleInstance> {
    vec![
        RuleInstance::new(RuleKind::OneShiftPerDay),
        RuleInstance::new(RuleKind::AtMostOneResidentPerShiftPerDay),
        RuleInstance::new(RuleKind::RestrictedDayOff),
        RuleInstance::new(RuleKind::BlockAroundEmergencyU),
        RuleInstance::new(RuleKind::CoverGOrTEachDay),
        RuleInstance::new(RuleKind::AtLeastOneWeekendForTargets {
            filter: TargetFilter::ExcludeRanks(vec![Rank::RE]),
        }),
        RuleInstance::new(RuleKind::TargetsDoAtLeastOfType {
            filter: TargetFilter::IncludeRanks(vec![Rank::R1, Rank::R2, Rank::R3]),
            types: vec![ShiftType::G],
        }),
    ]
}

fn main() {
    env_logger::init();

    let instance = demo_instance();
    let policy = demo_policy();
    let config = SolverConfig::default();

    match validate(&instance, &policy, &config) {
        Ok(result) => {
            println!(
                "[Validation] status={} core={:?} wall_time={:.3}s",
                result.solver_status, result.unsat_core, result.wall_time
            );
        }
        Err(err) => println!("[Validation] configuration error: {err}"),
    }

    match assign(&instance, &policy, &config) {
        Ok(result) => {
            println!(
                "[Assignment] status={} objective={:?} relaxed={:?} wall_time={:.3}s",
                result.solver_status, result.objective, result.relaxed_rules, result.wall_time
            );
            if let Some(matrix) = &result.matrix {
                for (i, row) in matrix.iter().enumerate() {
                    println!("  {}: {:?}", instance.residents[i].name, row);
                }
            }
        }
        Err(err) => println!("[Assignment] configuration error: {err}"),
    }
}
