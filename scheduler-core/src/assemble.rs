use std::collections::HashMap;

use cp_sat::builder::BoolVar;

use crate::cpsat::GuardedModel;
use crate::domain::Instance;
use crate::error::Result;
use crate::model::Variables;
use crate::rules::catalogue::apply_rule;
use crate::rules::{check_unique_ids, RuleInstance};

/// Result of assembling a CP model from an instance and an ordered policy:
/// the model itself, the decision variables, and a `rule_id -> enable`
/// map in policy order.
pub struct Assembled {
    pub model: GuardedModel,
    pub vars: Variables,
    pub enables: HashMap<String, BoolVar>,
    pub enable_order: Vec<String>,
}

pub fn assemble_model(instance: &Instance, rules: &[RuleInstance]) -> Result<Assembled> {
    check_unique_ids(rules)?;

    let mut model = GuardedModel::new();
    let vars = Variables::build(&mut model, instance);

    let mut enables = HashMap::with_capacity(rules.len());
    let mut enable_order = Vec::with_capacity(rules.len());
    for rule in rules {
        let enable = apply_rule(&mut model, instance, &vars, rule)?;
        let rule_id = rule.rule_id();
        enable_order.push(rule_id.clone());
        enables.insert(rule_id, enable);
    }

    Ok(Assembled {
        model,
        vars,
        enables,
        enable_order,
    })
}
