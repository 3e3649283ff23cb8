//! Rule compilation, candidate selection and weighting

use regex::{Regex, RegexBuilder};

use crate::types::*;

/// A mapping rule with its regex compiled and keywords case-folded
#[derive(Debug)]
pub struct CompiledRule<'r> {
    pub rule: &'r MappingRule,
    regex: Option<Regex>,
    keywords: Vec<String>,
}

impl<'r> CompiledRule<'r> {
    fn compile(rule: &'r MappingRule) -> Result<Self, RuleWarning> {
        let regex = match rule.regex.as_deref() {
            Some(pattern) if !pattern.is_empty() => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RuleWarning::InvalidRegex {
                        code: rule.code.clone(),
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    })?,
            ),
            _ => None,
        };

        let keywords = rule
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(Self {
            rule,
            regex,
            keywords,
        })
    }

    fn account_pattern(&self) -> Option<&str> {
        Some(self.rule.account.as_str()).filter(|p| !p.is_empty())
    }

    /// Whether the rule admits the entry by account, keyword or regex
    pub fn accepts(&self, entry: &LedgerEntry) -> bool {
        if let Some(pattern) = self.account_pattern() {
            if entry.account == pattern || entry.account.contains(pattern) {
                return true;
            }
        }

        if !self.keywords.is_empty() {
            let account = entry.account.to_lowercase();
            let description = entry.description.to_lowercase();
            if self
                .keywords
                .iter()
                .any(|k| account.contains(k.as_str()) || description.contains(k.as_str()))
            {
                return true;
            }
        }

        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(&entry.account) || re.is_match(&entry.description))
    }

    /// Whether the rule's account pattern is contained in the entry's account
    fn weighs(&self, entry: &LedgerEntry) -> bool {
        self.account_pattern()
            .is_some_and(|pattern| entry.account.contains(pattern))
    }
}

/// Rules compiled once per run. Rules whose regex fails to compile are left
/// out entirely and reported through [`RuleSet::warnings`].
#[derive(Debug)]
pub struct RuleSet<'r> {
    rules: Vec<CompiledRule<'r>>,
    warnings: Vec<RuleWarning>,
}

impl<'r> RuleSet<'r> {
    pub fn compile(rules: &'r [MappingRule]) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut warnings = Vec::new();

        for rule in rules {
            match CompiledRule::compile(rule) {
                Ok(c) => compiled.push(c),
                Err(warning) => {
                    tracing::warn!(code = %rule.code, %warning, "skipping mapping rule");
                    warnings.push(warning);
                }
            }
        }

        Self {
            rules: compiled,
            warnings,
        }
    }

    pub fn warnings(&self) -> &[RuleWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Usable rules targeting `code`
    pub fn rules_for_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CompiledRule<'r>> {
        self.rules.iter().filter(move |r| r.rule.code == code)
    }

    /// Entries admitted for `code` by at least one rule, in ledger order
    pub fn candidates_for_code<'e>(
        &self,
        code: &str,
        entries: &'e [LedgerEntry],
    ) -> Vec<&'e LedgerEntry> {
        let rules: Vec<&CompiledRule<'r>> = self.rules_for_code(code).collect();
        if rules.is_empty() {
            return Vec::new();
        }

        entries
            .iter()
            .filter(|entry| rules.iter().any(|r| r.accepts(entry)))
            .collect()
    }

    /// Highest weight among all rules, whatever their code, whose account
    /// pattern is contained in the entry's account; 1 when none is.
    ///
    /// Keyword and regex selectors never contribute weight, so entries
    /// admitted only through them weigh 1 unless some account rule covers them.
    pub fn weight_of(&self, entry: &LedgerEntry) -> u32 {
        self.rules
            .iter()
            .filter(|r| r.weighs(entry))
            .map(|r| r.rule.weight)
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

/// Entries admitted for `code` by `rules`. Invalid rules are ignored.
pub fn candidates_for_code<'e>(
    code: &str,
    entries: &'e [LedgerEntry],
    rules: &[MappingRule],
) -> Vec<&'e LedgerEntry> {
    RuleSet::compile(rules).candidates_for_code(code, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn entry(account: &str, description: &str) -> LedgerEntry {
        LedgerEntry::new(
            account.to_string(),
            description.to_string(),
            BigDecimal::from(1000),
        )
    }

    fn ledger() -> Vec<LedgerEntry> {
        vec![
            entry("5000", "Fastlønn januar"),
            entry("5010", "Timelønn"),
            entry("15000", "Omposting"),
            entry("7100", "Bilgodtgjørelse FASTLØNN"),
            entry("2940", "Feriepenger avsatt"),
        ]
    }

    #[test]
    fn test_account_equality_and_containment() {
        let rules = vec![MappingRule::new("fastlon".to_string(), "5000".to_string())];
        let entries = ledger();
        let candidates = candidates_for_code("fastlon", &entries, &rules);

        let accounts: Vec<&str> = candidates.iter().map(|e| e.account.as_str()).collect();
        assert_eq!(accounts, vec!["5000", "15000"]);
    }

    #[test]
    fn test_keyword_is_case_insensitive_on_both_fields() {
        let rules = vec![MappingRule::keyword(
            "fastlon".to_string(),
            vec!["fastlønn".to_string()],
        )];
        let entries = ledger();
        let candidates = candidates_for_code("fastlon", &entries, &rules);

        let accounts: Vec<&str> = candidates.iter().map(|e| e.account.as_str()).collect();
        assert_eq!(accounts, vec!["5000", "7100"]);
    }

    #[test]
    fn test_regex_selector() {
        let rules = vec![MappingRule::new("ferie".to_string(), String::new())
            .with_regex("^29\\d\\d$|FERIEPENGER".to_string())];
        let entries = ledger();
        let candidates = candidates_for_code("ferie", &entries, &rules);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].account, "2940");
    }

    #[test]
    fn test_rules_for_other_codes_are_ignored() {
        let rules = vec![MappingRule::new("timelon".to_string(), "5010".to_string())];
        let entries = ledger();
        assert!(candidates_for_code("fastlon", &entries, &rules).is_empty());
    }

    #[test]
    fn test_invalid_regex_rule_is_skipped_with_warning() {
        let rules = vec![
            MappingRule::new("fastlon".to_string(), "5000".to_string())
                .with_regex("([unclosed".to_string()),
            MappingRule::new("fastlon".to_string(), "5010".to_string()),
        ];
        let set = RuleSet::compile(&rules);

        assert_eq!(set.len(), 1);
        assert_eq!(set.warnings().len(), 1);
        assert!(matches!(
            &set.warnings()[0],
            RuleWarning::InvalidRegex { code, .. } if code == "fastlon"
        ));

        let entries = ledger();
        let candidates = set.candidates_for_code("fastlon", &entries);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].account, "5010");
    }

    #[test]
    fn test_weight_only_considers_account_containment() {
        let rules = vec![
            MappingRule::new("fastlon".to_string(), "500".to_string()).with_weight(3),
            MappingRule::new("fastlon".to_string(), "5000".to_string()).with_weight(10),
            MappingRule::keyword("fastlon".to_string(), vec!["bilgodt".to_string()])
                .with_weight(50),
        ];
        let set = RuleSet::compile(&rules);
        let entries = ledger();

        assert_eq!(set.weight_of(&entries[0]), 10);
        assert_eq!(set.weight_of(&entries[2]), 10);
        assert_eq!(set.weight_of(&entries[1]), 1);
        // admitted by keyword alone
        assert!(set.rules_for_code("fastlon").any(|r| r.accepts(&entries[3])));
        assert_eq!(set.weight_of(&entries[3]), 1);
        assert_eq!(set.weight_of(&entries[4]), 1);
    }

    #[test]
    fn test_weight_spans_rules_of_every_code() {
        let rules = vec![
            MappingRule::new("fastlon".to_string(), "5000".to_string()),
            MappingRule::new("timelon".to_string(), "5000".to_string()).with_weight(99),
            MappingRule::new("styre".to_string(), "7100".to_string()).with_weight(4),
        ];
        let set = RuleSet::compile(&rules);
        let entries = ledger();

        assert_eq!(set.weight_of(&entries[0]), 99);
        assert_eq!(set.weight_of(&entries[2]), 99);
        assert_eq!(set.weight_of(&entries[3]), 4);
        assert_eq!(set.weight_of(&entries[1]), 1);
    }

    #[test]
    fn test_rules_with_invalid_regex_carry_no_weight() {
        let rules = vec![
            MappingRule::new("fastlon".to_string(), "5000".to_string()),
            MappingRule::new("timelon".to_string(), "5000".to_string())
                .with_weight(20)
                .with_regex("*broken".to_string()),
        ];
        let set = RuleSet::compile(&rules);
        let entries = ledger();

        assert_eq!(set.weight_of(&entries[0]), 1);
    }

    #[test]
    fn test_empty_selectors_match_nothing() {
        let rules = vec![MappingRule::new("fastlon".to_string(), String::new())
            .with_keyword("  ".to_string())
            .with_regex(String::new())];
        let entries = ledger();
        assert!(candidates_for_code("fastlon", &entries, &rules).is_empty());
    }
}
