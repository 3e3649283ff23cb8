//! Validation utilities for mapping rules

use regex::RegexBuilder;

use crate::traits::*;
use crate::types::*;

/// Validate that a target code is usable as a key
pub fn validate_rule_code(code: &str) -> RuleResult<()> {
    if code.trim().is_empty() {
        return Err(RuleError::Validation(
            "Rule code cannot be empty".to_string(),
        ));
    }

    if code.len() > 50 {
        return Err(RuleError::Validation(
            "Rule code cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores, dots)
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(RuleError::Validation(format!(
            "Rule code '{}' can only contain alphanumeric characters, dashes, underscores and dots",
            code
        )));
    }

    Ok(())
}

/// Validate that a rule weight is at least 1
pub fn validate_weight(weight: u32) -> RuleResult<()> {
    if weight < 1 {
        Err(RuleError::Validation(
            "Rule weight must be at least 1".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an account pattern has no surrounding whitespace
pub fn validate_account_pattern(pattern: &str) -> RuleResult<()> {
    if pattern.trim() != pattern {
        return Err(RuleError::Validation(format!(
            "Account pattern '{}' has leading or trailing whitespace",
            pattern
        )));
    }

    Ok(())
}

/// Validate that a regex compiles the way the engine compiles it
pub fn validate_regex(pattern: &str) -> RuleResult<()> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|_| ())
        .map_err(|e| RuleError::Validation(format!("Invalid regex '{}': {}", pattern, e)))
}

/// Run every shape check on a rule: the default checks plus code format,
/// account padding, month hints and duplicate keywords
pub fn validate_rule(rule: &MappingRule) -> RuleResult<()> {
    EnhancedRuleValidator.validate_rule(rule)
}

/// Validate that month hints are calendar months
pub fn validate_month_hints(month_hints: &[u32]) -> RuleResult<()> {
    if let Some(month) = month_hints.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(RuleError::Validation(format!(
            "Month hint {} is not between 1 and 12",
            month
        )));
    }

    Ok(())
}

/// Enhanced rule validator with detailed checks
pub struct EnhancedRuleValidator;

impl RuleValidator for EnhancedRuleValidator {
    fn validate_rule(&self, rule: &MappingRule) -> RuleResult<()> {
        // Basic validation
        DefaultRuleValidator.validate_rule(rule)?;

        // Enhanced validations
        validate_rule_code(&rule.code)?;
        validate_weight(rule.weight)?;
        validate_account_pattern(&rule.account)?;
        validate_month_hints(&rule.month_hints)?;
        if let Some(pattern) = &rule.regex {
            validate_regex(pattern)?;
        }

        // Keywords are compared case-insensitively, so duplicates are noise
        let mut seen = std::collections::HashSet::new();
        for keyword in &rule.keywords {
            if !seen.insert(keyword.trim().to_lowercase()) {
                return Err(RuleError::Validation(format!(
                    "Keyword '{}' appears multiple times in rule for code '{}'",
                    keyword, rule.code
                )));
            }
        }

        Ok(())
    }
}
