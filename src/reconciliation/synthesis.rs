//! Exclusive-rule synthesis from confirmed matches

use std::collections::BTreeMap;

use crate::config::{GENERATED_RULE_PRIORITY, GENERATED_RULE_WEIGHT};
use crate::types::*;

/// Derive one `exclusive` rule per (code, account) from every exact match.
///
/// Each rule carries a regex alternation of the escaped descriptions seen on
/// that account. Codes are visited in key order and accounts in the order they
/// appear in the match, so the output is deterministic. Unmatched and
/// zero-target codes produce nothing.
pub fn generate_exclusive_rules(matches: &BTreeMap<String, ExactMatchResult>) -> Vec<MappingRule> {
    let mut rules = Vec::new();

    for (code, result) in matches {
        let Some(entries) = result.exact.as_ref() else {
            continue;
        };

        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for entry in entries {
            let description = entry.description.trim();
            let idx = match groups.iter().position(|(account, _)| *account == entry.account) {
                Some(idx) => idx,
                None => {
                    groups.push((entry.account.as_str(), Vec::new()));
                    groups.len() - 1
                }
            };
            let descriptions = &mut groups[idx].1;
            if !description.is_empty() && !descriptions.contains(&description) {
                descriptions.push(description);
            }
        }

        for (account, descriptions) in groups {
            rules.push(exclusive_rule(code, account, &descriptions));
        }
    }

    rules
}

fn exclusive_rule(code: &str, account: &str, descriptions: &[&str]) -> MappingRule {
    let regex = match descriptions {
        [] => None,
        _ => Some(
            descriptions
                .iter()
                .map(|d| regex::escape(d))
                .collect::<Vec<_>>()
                .join("|"),
        ),
    };

    MappingRule {
        account: account.to_string(),
        code: code.to_string(),
        strategy: RuleStrategy::Exclusive,
        weight: GENERATED_RULE_WEIGHT,
        keywords: Vec::new(),
        regex,
        priority: GENERATED_RULE_PRIORITY,
        month_hints: Vec::new(),
    }
}
