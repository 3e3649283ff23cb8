//! Traits for pluggable rule checks

use regex::RegexBuilder;

use crate::types::*;

/// Trait for implementing custom rule validation
///
/// Validators only inspect rule shape. Loading and saving rules is left to
/// the caller, who can run any validator over rules before handing them to
/// the engine.
pub trait RuleValidator: Send + Sync {
    fn validate_rule(&self, rule: &MappingRule) -> RuleResult<()>;

    /// Validate a batch, stopping at the first rejected rule
    fn validate_rules(&self, rules: &[MappingRule]) -> RuleResult<()> {
        rules.iter().try_for_each(|rule| self.validate_rule(rule))
    }
}

/// Default rule validator with basic shape checks
pub struct DefaultRuleValidator;

impl RuleValidator for DefaultRuleValidator {
    fn validate_rule(&self, rule: &MappingRule) -> RuleResult<()> {
        if rule.code.trim().is_empty() {
            return Err(RuleError::Validation(
                "Rule code cannot be empty".to_string(),
            ));
        }

        if rule.weight < 1 {
            return Err(RuleError::Validation(format!(
                "Rule weight must be at least 1 (code '{}')",
                rule.code
            )));
        }

        if !rule.has_selector() {
            return Err(RuleError::NoSelector {
                code: rule.code.clone(),
            });
        }

        if let Some(pattern) = &rule.regex {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| RuleError::InvalidRegex {
                    code: rule.code.clone(),
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}
