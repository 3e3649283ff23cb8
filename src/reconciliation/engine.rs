//! Reconciliation engine resolving every target code against the ledger

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ReconcileConfig;
use crate::reconciliation::rules::RuleSet;
use crate::reconciliation::search::{find_match, WeightedEntry};
use crate::reconciliation::synthesis;
use crate::types::*;

/// Target code to reported amount
pub type Targets = BTreeMap<String, BigDecimal>;

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Per-code results in code order
    pub matches: BTreeMap<String, ExactMatchResult>,
    /// Rules that were skipped while compiling the rule set
    pub warnings: Vec<RuleWarning>,
}

impl ReconciliationReport {
    /// Codes resolved to an exact match
    pub fn matched_codes(&self) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|(_, r)| r.is_matched())
            .map(|(code, _)| code.as_str())
            .collect()
    }

    /// Codes that need a human decision
    pub fn unmatched_codes(&self) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|(_, r)| !r.is_matched())
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<&ExactMatchResult> {
        self.matches.get(code)
    }
}

/// Pure, synchronous reconciliation engine.
///
/// Each code is resolved independently: its candidates are the entries some
/// rule for that code admits, weighted by account containment across the
/// whole rule set, and the subset
/// search picks the best combination within tolerance.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconcileConfig,
}

impl ReconciliationEngine {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Resolve every target code against `entries` using `rules`
    pub fn reconcile(
        &self,
        entries: &[LedgerEntry],
        targets: &Targets,
        rules: &[MappingRule],
    ) -> ReconciliationReport {
        let rule_set = RuleSet::compile(rules);

        let matches: BTreeMap<String, ExactMatchResult> = targets
            .iter()
            .map(|(code, target)| {
                (
                    code.clone(),
                    self.reconcile_code(code, target, entries, &rule_set),
                )
            })
            .collect();

        let matched = matches.values().filter(|r| r.is_matched()).count();
        tracing::info!(
            codes = matches.len(),
            matched,
            unmatched = matches.len() - matched,
            entries = entries.len(),
            rules = rule_set.len(),
            skipped_rules = rule_set.warnings().len(),
            "reconciliation complete"
        );

        ReconciliationReport {
            matches,
            warnings: rule_set.warnings().to_vec(),
        }
    }

    /// Resolve a single code against a compiled rule set
    pub fn reconcile_code(
        &self,
        code: &str,
        target: &BigDecimal,
        entries: &[LedgerEntry],
        rule_set: &RuleSet<'_>,
    ) -> ExactMatchResult {
        let candidates: Vec<WeightedEntry<'_>> = rule_set
            .candidates_for_code(code, entries)
            .into_iter()
            .map(|entry| WeightedEntry::new(entry, rule_set.weight_of(entry)))
            .collect();

        let result = find_match(&candidates, target, &self.config);

        tracing::debug!(
            code,
            target_amount = %target,
            candidates = candidates.len(),
            matched = result.exact.as_ref().map(Vec::len),
            alternatives = result.alternatives.len(),
            "code resolved"
        );

        result
    }

    /// Synthesize exclusive rules from the exact matches of a run
    pub fn generate_exclusive_rules(
        &self,
        matches: &BTreeMap<String, ExactMatchResult>,
    ) -> Vec<MappingRule> {
        synthesis::generate_exclusive_rules(matches)
    }
}

/// Reconcile with the default configuration (tolerance 5, 28-candidate cap)
pub fn reconcile(
    entries: &[LedgerEntry],
    targets: &Targets,
    rules: &[MappingRule],
) -> ReconciliationReport {
    ReconciliationEngine::default().reconcile(entries, targets, rules)
}
